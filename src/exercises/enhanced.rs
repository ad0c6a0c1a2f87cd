//! The enhanced exercise generator.
//!
//! Scores words by importance instead of choosing at random, and builds
//! multiple-choice questions around extracted "concepts". Whenever it
//! cannot extract anything useful it defers to [`BasicGenerator`], so it
//! never produces fewer exercises than the basic strategy would.
//!
//! Importance score per word (higher is better):
//!
//! | Heuristic | Points |
//! |---|---|
//! | length ≥ 10 / ≥ 7 / otherwise | 3 / 2 / 1 |
//! | ends with a concept suffix (`-dade`, `-ção`, `-tion`, ...) | +3 |
//! | capitalized, not the first word | +2 |
//! | follows a context word (`é`, `significa`, `means`, ...) | +2 |

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::Insight;
use crate::exercises::basic::{
    self, BasicGenerator, FILL_BLANK_MIN_LEN, MULTIPLE_CHOICE_MIN_LEN,
};
use crate::exercises::words::{self, Token};
use crate::exercises::{Exercise, ExerciseGenerator};

/// Maximum number of concepts extracted from one insight.
pub const MAX_CONCEPTS: usize = 3;

/// Word endings that usually mark abstract nouns.
pub const CONCEPT_SUFFIXES: &[&str] = &[
    "ção", "ções", "são", "mento", "mentos", "dade", "dades", "ismo", "ência", "ância", "ível",
    "ável", "tion", "sion", "ment", "ness", "ity", "ism", "ence", "ance",
];

/// Words that tend to introduce a definition or key term.
pub const CONTEXT_WORDS: &[&str] = &[
    "é", "são", "significa", "chamado", "chamada", "conceito", "princípio", "chave", "is", "are",
    "means", "called", "concept", "principle", "key",
];

/// Distractors for concept questions. Larger than the basic pool so
/// options vary more between sessions.
pub const CONCEPT_DISTRACTOR_POOL: &[&str] = &[
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
    "perspectiva",
    "paradigma",
    "hipótese",
    "contexto",
    "mecanismo",
    "critério",
    "fundamento",
    "modelo",
    "tendência",
    "padrão",
    "recurso",
    "equilíbrio",
    "evidência",
    "prioridade",
];

/// Open-answer templates that name a concept. `{}` is replaced.
const CONCEPT_PROMPTS: &[&str] = &[
    "How does \"{}\" connect to something you already know?",
    "Give a concrete example of \"{}\" from your own experience.",
    "What would go wrong if you ignored \"{}\"?",
];

/// Why the concept path could not produce an exercise.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no concepts found in insight")]
    NoConcepts,

    #[error("not enough distractors for '{correct}'")]
    NotEnoughDistractors { correct: String },
}

/// Importance-scoring generator with basic fallback.
#[derive(Debug, Clone, Default)]
pub struct EnhancedGenerator {
    basic: BasicGenerator,
    latency: Duration,
}

impl EnhancedGenerator {
    /// Create a generator that returns immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator that sleeps for `ms` milliseconds per batch.
    pub fn with_latency_ms(ms: u64) -> Self {
        Self {
            basic: BasicGenerator::new(),
            latency: Duration::from_millis(ms),
        }
    }

    /// The highest-scoring fill-blank candidate. Ties go to the earliest word.
    pub fn best_blank<'a>(&self, tokens: &[Token<'a>]) -> Option<Token<'a>> {
        let mut best: Option<(u32, Token<'a>)> = None;
        for candidate in words::candidates(tokens, FILL_BLANK_MIN_LEN) {
            let previous = candidate
                .index
                .checked_sub(1)
                .and_then(|i| tokens.get(i));
            let score = importance(&candidate, previous);
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, candidate));
            }
        }
        best.map(|(_, token)| token)
    }

    /// Up to [`MAX_CONCEPTS`] distinct concept words, lowercased, in
    /// order of appearance.
    pub fn concepts(&self, tokens: &[Token<'_>]) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for token in words::candidates(tokens, MULTIPLE_CHOICE_MIN_LEN) {
            if found.len() == MAX_CONCEPTS {
                break;
            }
            let lower = token.lower();
            let is_concept = has_concept_suffix(&lower) || is_inner_capitalized(&token);
            if is_concept && !found.contains(&lower) {
                found.push(lower);
            }
        }
        found
    }

    /// Multiple-choice around one of the extracted concepts.
    ///
    /// Other concepts are never offered as distractors.
    pub fn concept_choice(
        &self,
        insight: &Insight,
        concepts: &[String],
        pool: &[&str],
        filler: &[&str],
        rng: &mut dyn RngCore,
    ) -> std::result::Result<Exercise, ExtractionError> {
        let correct = concepts.choose(rng).ok_or(ExtractionError::NoConcepts)?;
        let pool: Vec<&str> = pool
            .iter()
            .copied()
            .filter(|w| !concepts.iter().any(|c| c.as_str() == w.to_lowercase()))
            .collect();

        basic::multiple_choice_exercise(insight, correct, &pool, filler, rng).ok_or_else(|| {
            ExtractionError::NotEnoughDistractors {
                correct: correct.clone(),
            }
        })
    }
}

impl ExerciseGenerator for EnhancedGenerator {
    fn generate(&self, insight: &Insight, rng: &mut dyn RngCore) -> Vec<Exercise> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        let tokens = words::tokenize(&insight.content);
        let best = self.best_blank(&tokens);
        let concepts = self.concepts(&tokens);

        if best.is_none() && concepts.is_empty() {
            debug!(insight = %insight.id, "nothing to extract, using basic generator");
            return self.basic.generate(insight, rng);
        }

        let mut exercises = Vec::with_capacity(3);

        match best {
            Some(token) => exercises.push(basic::fill_blank_exercise(insight, &tokens, &token)),
            None => exercises.extend(self.basic.fill_blank(insight, rng)),
        }

        match self.concept_choice(
            insight,
            &concepts,
            CONCEPT_DISTRACTOR_POOL,
            words::FILLER_WORDS,
            rng,
        ) {
            Ok(exercise) => exercises.push(exercise),
            Err(ExtractionError::NoConcepts) => {
                debug!(insight = %insight.id, "no concepts, basic multiple-choice");
                exercises.extend(self.basic.multiple_choice(insight, rng));
            }
            Err(e) => {
                warn!(insight = %insight.id, "concept question failed ({}), using basic", e);
                exercises.extend(self.basic.multiple_choice(insight, rng));
            }
        }

        let concept_prompt = concepts.choose(rng).and_then(|concept| {
            CONCEPT_PROMPTS
                .choose(rng)
                .map(|template| template.replace("{}", concept))
        });
        exercises.push(match concept_prompt {
            Some(prompt) => basic::open_answer_exercise(insight, prompt),
            None => self.basic.open_answer(insight, rng),
        });

        exercises
    }

    fn name(&self) -> &'static str {
        "enhanced"
    }
}

fn importance(token: &Token<'_>, previous: Option<&Token<'_>>) -> u32 {
    let mut score = match token.char_len() {
        n if n >= 10 => 3,
        n if n >= 7 => 2,
        _ => 1,
    };
    if has_concept_suffix(&token.lower()) {
        score += 3;
    }
    if is_inner_capitalized(token) {
        score += 2;
    }
    if previous.is_some_and(|p| CONTEXT_WORDS.contains(&p.lower().as_str())) {
        score += 2;
    }
    score
}

fn has_concept_suffix(lower: &str) -> bool {
    CONCEPT_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

// A capital letter on the first word says nothing about importance.
fn is_inner_capitalized(token: &Token<'_>) -> bool {
    token.index > 0 && token.word.chars().next().is_some_and(char::is_uppercase)
}
