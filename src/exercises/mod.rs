//! Practice exercise generation for Sprout.
//!
//! Exercises are derived from an insight's text on demand and never stored;
//! only the outcome of an attempt is recorded back onto the insight.
//!
//! Two interchangeable strategies implement [`ExerciseGenerator`]:
//! - [`BasicGenerator`]: random selection among qualifying words
//! - [`EnhancedGenerator`]: importance scoring and concept extraction, with
//!   the basic generator as fallback
//!
//! Randomness is injected by the caller so generation is reproducible.

pub mod basic;
pub mod enhanced;
pub mod words;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::{ExercisesConfig, GeneratorKind};
use crate::core::{ExerciseKind, Insight};

pub use basic::BasicGenerator;
pub use enhanced::EnhancedGenerator;

/// A generated practice item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// The insight this exercise was generated from.
    pub insight_id: String,
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    pub prompt: String,
    /// Answer options (multiple-choice only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Expected answer. For open-answer this is the reference text shown
    /// after the attempt, never graded.
    pub correct_answer: String,
    pub explanation: String,
}

impl Exercise {
    /// Check an answer.
    ///
    /// Returns `None` for open-answer exercises, which are self-assessed.
    /// Multiple-choice accepts either the option text or its 1-based number.
    pub fn check(&self, answer: &str) -> Option<bool> {
        let answer = answer.trim().to_lowercase();
        match self.kind {
            ExerciseKind::OpenAnswer => None,
            ExerciseKind::FillBlank => Some(answer == self.correct_answer),
            ExerciseKind::MultipleChoice => {
                let picked = answer
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| self.options.get(i))
                    .map(|o| o.to_lowercase());
                Some(picked.unwrap_or(answer) == self.correct_answer)
            }
        }
    }

    /// Whether this exercise is graded automatically.
    pub fn is_graded(&self) -> bool {
        self.kind != ExerciseKind::OpenAnswer
    }
}

/// A strategy that turns an insight into practice exercises.
///
/// Implementations return at most one exercise of each kind, in the order
/// fill-blank, multiple-choice, open-answer. Kinds that cannot be produced
/// from the content are simply left out.
pub trait ExerciseGenerator: Send + Sync {
    /// Generate exercises for an insight.
    fn generate(&self, insight: &Insight, rng: &mut dyn RngCore) -> Vec<Exercise>;

    /// Generator name for logging and output.
    fn name(&self) -> &'static str;
}

/// Build the generator selected in configuration.
pub fn generator_for(config: &ExercisesConfig) -> Box<dyn ExerciseGenerator> {
    match config.generator {
        GeneratorKind::Basic => Box::new(BasicGenerator::new()),
        GeneratorKind::Enhanced => Box::new(EnhancedGenerator::with_latency_ms(
            config.simulated_latency_ms,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InsightDraft;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn exercise(kind: ExerciseKind, options: Vec<&str>, correct: &str) -> Exercise {
        Exercise {
            insight_id: "id".to_string(),
            kind,
            prompt: "prompt".to_string(),
            options: options.into_iter().map(String::from).collect(),
            correct_answer: correct.to_string(),
            explanation: String::new(),
        }
    }

    #[test]
    fn test_check_fill_blank_is_case_and_space_insensitive() {
        let ex = exercise(ExerciseKind::FillBlank, vec![], "hábitos");
        assert_eq!(ex.check("  Hábitos "), Some(true));
        assert_eq!(ex.check("habitos"), Some(false));
    }

    #[test]
    fn test_check_multiple_choice_by_text_or_number() {
        let ex = exercise(
            ExerciseKind::MultipleChoice,
            vec!["método", "disciplina", "sistema", "ideia"],
            "disciplina",
        );
        assert_eq!(ex.check("Disciplina"), Some(true));
        assert_eq!(ex.check("2"), Some(true));
        assert_eq!(ex.check("1"), Some(false));
        assert_eq!(ex.check("0"), Some(false));
        assert_eq!(ex.check("9"), Some(false));
        assert_eq!(ex.check("sistema"), Some(false));
    }

    #[test]
    fn test_check_open_answer_is_ungraded() {
        let ex = exercise(ExerciseKind::OpenAnswer, vec![], "full content");
        assert_eq!(ex.check("full content"), None);
        assert!(!ex.is_graded());
    }

    #[test]
    fn test_generator_for_config() {
        let basic = generator_for(&ExercisesConfig::default());
        assert_eq!(basic.name(), "basic");

        let enhanced = generator_for(&ExercisesConfig {
            generator: GeneratorKind::Enhanced,
            simulated_latency_ms: 0,
        });
        assert_eq!(enhanced.name(), "enhanced");
    }

    #[test]
    fn test_generators_are_swappable() {
        let insight = Insight::new(
            InsightDraft::new("Deliberate practice requires immediate feedback."),
            Utc::now(),
        )
        .unwrap();
        let generators: Vec<Box<dyn ExerciseGenerator>> = vec![
            Box::new(BasicGenerator::new()),
            Box::new(EnhancedGenerator::new()),
        ];

        for generator in generators {
            let mut rng = StdRng::seed_from_u64(42);
            let exercises = generator.generate(&insight, &mut rng);
            let kinds: Vec<ExerciseKind> = exercises.iter().map(|e| e.kind).collect();
            assert_eq!(kinds, ExerciseKind::all().to_vec(), "{}", generator.name());
            assert!(exercises.iter().all(|e| e.insight_id == insight.id));
        }
    }

    #[test]
    fn test_exercise_serializes_type_field() {
        let ex = exercise(ExerciseKind::OpenAnswer, vec![], "x");
        let json = serde_json::to_value(&ex).unwrap();
        assert_eq!(json["type"], "open-answer");
        assert_eq!(json["correctAnswer"], "x");
        assert!(json.get("options").is_none());
    }
}
