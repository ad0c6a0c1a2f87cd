//! Word filtering and fixed word tables for exercise generation.
//!
//! Tokens are whitespace-separated words with trailing punctuation removed.
//! Lengths are counted in characters, so accented words are not penalized.

use rand::seq::SliceRandom;
use rand::RngCore;

/// Marker substituted for the hidden word in fill-in-the-blank prompts.
pub const BLANK_MARKER: &str = "_____";

/// Number of characters of content shown in multiple-choice prompts.
pub const EXCERPT_CHARS: usize = 100;

/// Common words that never make good blanks or answers.
///
/// Portuguese first (the primary language of captured insights), then a
/// short English list. Compared lowercase.
pub const STOP_WORDS: &[&str] = &[
    // Portuguese
    "a", "o", "as", "os", "um", "uma", "uns", "umas", "de", "do", "da", "dos", "das", "em", "no",
    "na", "nos", "nas", "por", "pelo", "pela", "pelos", "pelas", "para", "com", "sem", "sob",
    "sobre", "entre", "e", "ou", "mas", "que", "se", "como", "mais", "menos", "muito", "muita",
    "muitos", "muitas", "pouco", "quando", "onde", "porque", "pois", "isso", "isto", "esse",
    "essa", "esses", "essas", "este", "esta", "estes", "estas", "aquele", "aquela", "aquilo",
    "seu", "sua", "seus", "suas", "meu", "minha", "meus", "minhas", "nosso", "nossa", "ele",
    "ela", "eles", "elas", "você", "vocês", "nós", "eu", "ser", "estar", "ter", "tem", "têm",
    "são", "está", "estão", "foi", "era", "será", "pode", "podem", "deve", "devem", "cada",
    "todo", "toda", "todos", "todas", "outro", "outra", "outros", "outras", "mesmo", "mesma",
    "ainda", "também", "apenas", "sempre", "nunca", "já", "assim", "então", "qual", "quais",
    "quem", "depois", "antes", "até", "desde", "não", "sim", "há", "seja", "fazer", "faz",
    "tudo", "nada", "algo", "alguém", "vez", "vezes", "bem", "tão", "tanto", "tanta",
    // English
    "the", "and", "that", "this", "with", "from", "have", "has", "they", "them", "their",
    "there", "will", "would", "could", "should", "your", "you", "what", "when", "which", "while",
    "where", "about", "into", "than", "then", "been", "were", "being", "more", "most", "some",
    "such", "only", "also", "just", "very", "every", "other", "because", "these", "those",
    "over", "after", "before",
];

/// Generic, domain-neutral nouns used as multiple-choice distractors.
pub const DISTRACTOR_POOL: &[&str] = &[
    "conhecimento",
    "estratégia",
    "processo",
    "resultado",
    "objetivo",
    "método",
    "princípio",
    "sistema",
    "estrutura",
    "experiência",
];

/// Secondary list used when the distractor pool runs out.
pub const FILLER_WORDS: &[&str] = &["conceito", "ideia", "exemplo", "detalhe", "fator", "elemento"];

/// Generic reflection prompts for open-answer exercises.
pub const REFLECTION_PROMPTS: &[&str] = &[
    "Explain this insight in your own words.",
    "How can you apply this insight in your daily life?",
    "Describe a situation where this insight would have helped you.",
    "Why does this insight matter to you?",
    "What would change if you acted on this insight for a week?",
];

/// A word in the content with its position in the token sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Position in the whitespace-split sequence.
    pub index: usize,
    /// The token as written, punctuation included.
    pub raw: &'a str,
    /// The token with trailing punctuation removed.
    pub word: &'a str,
}

impl Token<'_> {
    /// Word length in characters.
    pub fn char_len(&self) -> usize {
        self.word.chars().count()
    }

    /// Trailing punctuation that was stripped from the raw token.
    pub fn suffix(&self) -> &str {
        &self.raw[self.word.len()..]
    }

    /// Lowercased word.
    pub fn lower(&self) -> String {
        self.word.to_lowercase()
    }
}

/// Split content on whitespace into tokens.
pub fn tokenize(content: &str) -> Vec<Token<'_>> {
    content
        .split_whitespace()
        .enumerate()
        .map(|(index, raw)| Token {
            index,
            raw,
            word: strip_trailing_punctuation(raw),
        })
        .collect()
}

/// Remove trailing punctuation (ASCII and common typographic marks).
pub fn strip_trailing_punctuation(token: &str) -> &str {
    token.trim_end_matches(|c: char| {
        c.is_ascii_punctuation() || matches!(c, '…' | '“' | '”' | '‘' | '’' | '«' | '»')
    })
}

/// Whether a word is on the stop list (case-insensitive).
pub fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOP_WORDS.contains(&lower.as_str())
}

/// Tokens longer than `min_len` characters that are not stop words.
pub fn candidates<'a>(tokens: &[Token<'a>], min_len: usize) -> Vec<Token<'a>> {
    tokens
        .iter()
        .filter(|t| t.char_len() > min_len && !is_stop_word(t.word))
        .copied()
        .collect()
}

/// Rebuild the token sequence with the token at `index` replaced by the
/// blank marker, keeping its trailing punctuation.
pub fn blank_out(tokens: &[Token<'_>], index: usize) -> String {
    tokens
        .iter()
        .map(|t| {
            if t.index == index {
                format!("{}{}", BLANK_MARKER, t.suffix())
            } else {
                t.raw.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `max_chars` characters of the content, with an ellipsis if cut.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

/// Pick `count` distractors for `correct`.
///
/// Draws from a shuffled `pool`, skipping anything equal to `correct` or
/// already chosen (case-insensitive), then pads from `filler` in order.
/// May return fewer than `count` if both lists are exhausted.
pub fn pick_distractors(
    correct: &str,
    pool: &[&str],
    filler: &[&str],
    count: usize,
    rng: &mut dyn RngCore,
) -> Vec<String> {
    let correct = correct.to_lowercase();
    let mut shuffled: Vec<&str> = pool.to_vec();
    shuffled.shuffle(rng);

    let mut chosen: Vec<String> = Vec::with_capacity(count);
    for word in shuffled.into_iter().chain(filler.iter().copied()) {
        if chosen.len() == count {
            break;
        }
        let lower = word.to_lowercase();
        if lower != correct && !chosen.contains(&lower) {
            chosen.push(lower);
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SCENARIO: &str =
        "A produtividade pessoal depende de hábitos consistentes e disciplina diária.";

    #[test]
    fn test_tokenize_strips_trailing_punctuation() {
        let tokens = tokenize("Hello, world! (ok)");
        let words: Vec<&str> = tokens.iter().map(|t| t.word).collect();
        assert_eq!(words, vec!["Hello", "world", "(ok"]);
        assert_eq!(tokens[0].suffix(), ",");
        assert_eq!(tokens[1].index, 1);
    }

    #[test]
    fn test_tokenize_collapses_whitespace() {
        let tokens = tokenize("  one \n two\tthree ");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].raw, "three");
    }

    #[test]
    fn test_strip_typographic_punctuation() {
        assert_eq!(strip_trailing_punctuation("diária…"), "diária");
        assert_eq!(strip_trailing_punctuation("citação”."), "citação");
        assert_eq!(strip_trailing_punctuation("..."), "");
    }

    #[test]
    fn test_stop_words_case_insensitive() {
        assert!(is_stop_word("Para"));
        assert!(is_stop_word("THE"));
        assert!(!is_stop_word("disciplina"));
    }

    #[test]
    fn test_scenario_fill_blank_candidates() {
        let tokens = tokenize(SCENARIO);
        let words: Vec<&str> = candidates(&tokens, 3).iter().map(|t| t.word).collect();
        assert_eq!(
            words,
            vec![
                "produtividade",
                "pessoal",
                "depende",
                "hábitos",
                "consistentes",
                "disciplina",
                "diária"
            ]
        );
    }

    #[test]
    fn test_length_counts_characters() {
        // "diária" is 6 characters but 7 bytes
        let tokens = tokenize("diária");
        assert_eq!(tokens[0].char_len(), 6);
        assert_eq!(candidates(&tokens, 5).len(), 1);
        assert!(candidates(&tokens, 6).is_empty());
    }

    #[test]
    fn test_blank_out_keeps_punctuation_and_other_words() {
        let tokens = tokenize(SCENARIO);
        let blanked = blank_out(&tokens, 9);
        assert_eq!(
            blanked,
            "A produtividade pessoal depende de hábitos consistentes e disciplina _____."
        );
        assert_eq!(blanked.matches(BLANK_MARKER).count(), 1);
    }

    #[test]
    fn test_blank_out_only_one_occurrence_of_repeated_word() {
        let tokens = tokenize("focus on focus because focus matters");
        let blanked = blank_out(&tokens, 2);
        assert_eq!(blanked, "focus on _____ because focus matters");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short text", 100), "short text");
        let long = "a".repeat(150);
        let ex = excerpt(&long, 100);
        assert!(ex.ends_with("..."));
        assert_eq!(ex.chars().count(), 103);
        // multi-byte safe
        let accented = "ç".repeat(120);
        assert_eq!(excerpt(&accented, 100).chars().count(), 103);
    }

    #[test]
    fn test_pick_distractors_excludes_correct() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let d = pick_distractors("Processo", DISTRACTOR_POOL, FILLER_WORDS, 3, &mut rng);
            assert_eq!(d.len(), 3);
            assert!(!d.contains(&"processo".to_string()));
        }
    }

    #[test]
    fn test_pick_distractors_pads_from_filler() {
        let mut rng = StdRng::seed_from_u64(1);
        let d = pick_distractors("alpha", &["alpha", "beta"], &["beta", "gamma", "delta"], 3, &mut rng);
        assert_eq!(d.len(), 3);
        assert!(d.contains(&"beta".to_string()));
        assert!(d.contains(&"gamma".to_string()));
        assert!(d.contains(&"delta".to_string()));
    }

    #[test]
    fn test_pick_distractors_may_come_up_short() {
        let mut rng = StdRng::seed_from_u64(1);
        let d = pick_distractors("x", &["x"], &["y"], 3, &mut rng);
        assert_eq!(d, vec!["y".to_string()]);
    }
}
