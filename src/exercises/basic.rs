//! The basic exercise generator.
//!
//! Picks words uniformly at random among those that pass the length and
//! stop-word filters.

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::core::{ExerciseKind, Insight};
use crate::exercises::words::{self, Token};
use crate::exercises::{Exercise, ExerciseGenerator};

/// Fill-blank candidates must be longer than this many characters.
pub const FILL_BLANK_MIN_LEN: usize = 3;

/// Multiple-choice candidates must be longer than this many characters.
pub const MULTIPLE_CHOICE_MIN_LEN: usize = 4;

/// Number of wrong options in a multiple-choice exercise.
pub const DISTRACTOR_COUNT: usize = 3;

/// Random word selection over the fixed word tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicGenerator;

impl BasicGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Blank out one qualifying word, or `None` if no word qualifies.
    pub fn fill_blank(&self, insight: &Insight, rng: &mut dyn RngCore) -> Option<Exercise> {
        let tokens = words::tokenize(&insight.content);
        let candidates = words::candidates(&tokens, FILL_BLANK_MIN_LEN);
        let chosen = candidates.choose(rng)?;
        Some(fill_blank_exercise(insight, &tokens, chosen))
    }

    /// Ask which key term belongs to the insight, or `None` if no word
    /// qualifies.
    pub fn multiple_choice(&self, insight: &Insight, rng: &mut dyn RngCore) -> Option<Exercise> {
        let tokens = words::tokenize(&insight.content);
        let candidates = words::candidates(&tokens, MULTIPLE_CHOICE_MIN_LEN);
        let chosen = candidates.choose(rng)?;
        multiple_choice_exercise(
            insight,
            &chosen.lower(),
            words::DISTRACTOR_POOL,
            words::FILLER_WORDS,
            rng,
        )
    }

    /// A reflection prompt. Always succeeds.
    pub fn open_answer(&self, insight: &Insight, rng: &mut dyn RngCore) -> Exercise {
        let prompt = words::REFLECTION_PROMPTS
            .choose(rng)
            .copied()
            .unwrap_or(words::REFLECTION_PROMPTS[0]);
        open_answer_exercise(insight, prompt.to_string())
    }
}

impl ExerciseGenerator for BasicGenerator {
    fn generate(&self, insight: &Insight, rng: &mut dyn RngCore) -> Vec<Exercise> {
        let mut exercises = Vec::with_capacity(3);
        exercises.extend(self.fill_blank(insight, rng));
        exercises.extend(self.multiple_choice(insight, rng));
        exercises.push(self.open_answer(insight, rng));
        exercises
    }

    fn name(&self) -> &'static str {
        "basic"
    }
}

pub(crate) fn fill_blank_exercise(
    insight: &Insight,
    tokens: &[Token<'_>],
    chosen: &Token<'_>,
) -> Exercise {
    Exercise {
        insight_id: insight.id.clone(),
        kind: ExerciseKind::FillBlank,
        prompt: words::blank_out(tokens, chosen.index),
        correct_answer: chosen.lower(),
        options: Vec::new(),
        explanation: format!("The missing word is \"{}\". {}", chosen.word, insight.content),
    }
}

/// Build a multiple-choice exercise around `correct` (already lowercased).
///
/// Returns `None` if the word tables cannot supply enough distinct
/// distractors.
pub(crate) fn multiple_choice_exercise(
    insight: &Insight,
    correct: &str,
    pool: &[&str],
    filler: &[&str],
    rng: &mut dyn RngCore,
) -> Option<Exercise> {
    let distractors = words::pick_distractors(correct, pool, filler, DISTRACTOR_COUNT, rng);
    if distractors.len() < DISTRACTOR_COUNT {
        return None;
    }

    let mut options = Vec::with_capacity(DISTRACTOR_COUNT + 1);
    options.push(correct.to_string());
    options.extend(distractors);
    options.shuffle(rng);

    Some(Exercise {
        insight_id: insight.id.clone(),
        kind: ExerciseKind::MultipleChoice,
        prompt: format!(
            "Which key term belongs to this insight: \"{}\"?",
            words::excerpt(&insight.content, words::EXCERPT_CHARS)
        ),
        options,
        correct_answer: correct.to_string(),
        explanation: format!("\"{}\" is a key term here. {}", correct, insight.content),
    })
}

pub(crate) fn open_answer_exercise(insight: &Insight, prompt: String) -> Exercise {
    let explanation = match &insight.note {
        Some(note) => format!("{}\n\nYour note: {}", insight.content, note),
        None => insight.content.clone(),
    };
    Exercise {
        insight_id: insight.id.clone(),
        kind: ExerciseKind::OpenAnswer,
        prompt,
        options: Vec::new(),
        correct_answer: insight.content.clone(),
        explanation,
    }
}
