//! Practice command for Sprout.
//!
//! Picks an eligible insight, generates exercises from it, and reads one
//! answer per exercise from the input. Open-answer exercises show the
//! reference answer and then read a yes/no self-assessment. Every answered
//! exercise is recorded on the insight; end of input stops the session.

use std::io::{BufRead, Write};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Controller, NavigationOutcome, NavigationTarget};
use crate::error::{Result, SproutError};
use crate::exercises::{Exercise, ExerciseGenerator};
use crate::storage::PersistenceAdapter;

/// Options for the practice command.
#[derive(Debug, Clone, Default)]
pub struct PracticeOptions {
    /// Output as JSON (prompts are not printed).
    pub json: bool,
    /// Suppress output (prompts are not printed).
    pub quiet: bool,
    /// Practice this insight instead of the highest-priority eligible one.
    pub id: Option<String>,
    /// Seed for exercise generation.
    pub seed: Option<u64>,
}

/// One answered exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptInfo {
    pub exercise: Exercise,
    pub answer: String,
    /// Recorded result; self-assessed for open-answer exercises.
    pub correct: bool,
    /// Whether `correct` was checked automatically.
    pub graded: bool,
}

/// Output format for the practice command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeOutput {
    pub success: bool,
    /// The practiced insight; `None` when nothing is eligible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight_id: Option<String>,
    pub generator: String,
    /// Exercises generated for the insight.
    pub generated: usize,
    pub attempts: Vec<AttemptInfo>,
    pub correct: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PracticeOutput {
    fn empty(generator: &str) -> Self {
        Self {
            success: true,
            insight_id: None,
            generator: generator.to_string(),
            generated: 0,
            attempts: Vec::new(),
            correct: 0,
            error: None,
        }
    }

    pub fn failure(generator: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::empty(generator)
        }
    }
}

/// The practice command implementation.
pub struct PracticeCommand<P: PersistenceAdapter> {
    controller: Controller<P>,
    generator: Box<dyn ExerciseGenerator>,
}

impl<P: PersistenceAdapter> PracticeCommand<P> {
    /// Create a new practice command.
    pub fn new(controller: Controller<P>, generator: Box<dyn ExerciseGenerator>) -> Self {
        Self {
            controller,
            generator,
        }
    }

    /// Run a practice session, reading answers from `input` and writing
    /// prompts to `prompts`.
    pub fn run(
        &mut self,
        options: &PracticeOptions,
        input: &mut dyn BufRead,
        prompts: &mut dyn Write,
    ) -> PracticeOutput {
        match self.session(options, input, prompts) {
            Ok(output) => output,
            Err(e) => PracticeOutput::failure(self.generator.name(), e.to_string()),
        }
    }

    fn session(
        &mut self,
        options: &PracticeOptions,
        input: &mut dyn BufRead,
        prompts: &mut dyn Write,
    ) -> Result<PracticeOutput> {
        let now = Utc::now();
        let interactive = !options.json && !options.quiet;
        let mut output = PracticeOutput::empty(self.generator.name());

        let target = match &options.id {
            Some(id) => NavigationTarget::PracticeInsight(id.clone()),
            None => NavigationTarget::Practice,
        };
        let id = match self.controller.navigate(target, now)? {
            NavigationOutcome::Entered(view) => view.insight_id().map(str::to_string),
            NavigationOutcome::NothingToReview => None,
        };
        let Some(id) = id else {
            return Ok(output);
        };

        let insight = self
            .controller
            .get(&id)
            .ok_or_else(|| SproutError::insight_not_found(&id))?;
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let exercises = self.generator.generate(insight, &mut rng);
        debug!(
            "Generated {} exercise(s) for {} with {}",
            exercises.len(),
            id,
            self.generator.name()
        );

        output.insight_id = Some(id.clone());
        output.generated = exercises.len();
        let total = exercises.len();

        for (i, exercise) in exercises.into_iter().enumerate() {
            if interactive {
                writeln!(
                    prompts,
                    "\n[{}/{}] {}\n{}",
                    i + 1,
                    total,
                    exercise.kind.display_name(),
                    exercise.prompt
                )?;
                for (n, option) in exercise.options.iter().enumerate() {
                    writeln!(prompts, "  {}. {}", n + 1, option)?;
                }
                write!(prompts, "> ")?;
                prompts.flush()?;
            }

            let Some(answer) = read_answer(input)? else {
                debug!("Input ended, stopping practice");
                break;
            };

            let (correct, graded) = match exercise.check(&answer) {
                Some(correct) => {
                    if interactive {
                        if correct {
                            writeln!(prompts, "Correct!")?;
                        } else {
                            writeln!(prompts, "Not quite. Answer: {}", exercise.correct_answer)?;
                        }
                        writeln!(prompts, "{}", exercise.explanation)?;
                    }
                    (correct, true)
                }
                None => {
                    if interactive {
                        writeln!(prompts, "Reference:\n{}", exercise.explanation)?;
                        write!(prompts, "Did your answer capture it? [y/N] ")?;
                        prompts.flush()?;
                    }
                    let Some(assessment) = read_answer(input)? else {
                        break;
                    };
                    (is_yes(&assessment), false)
                }
            };

            self.controller
                .record_exercise(&id, exercise.kind, correct, now)?;
            if correct {
                output.correct += 1;
            }
            output.attempts.push(AttemptInfo {
                exercise,
                answer,
                correct,
                graded,
            });
        }

        Ok(output)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &PracticeOutput, options: &PracticeOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Practice failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let Some(id) = &output.insight_id else {
            return "Nothing eligible for practice today.\n".to_string();
        };

        if output.attempts.is_empty() {
            return format!("No exercises answered for {}.\n", id);
        }

        format!(
            "\nPractice done: {}/{} correct ({} of {} exercise(s) answered) for {}.\n",
            output.correct,
            output.attempts.len(),
            output.attempts.len(),
            output.generated,
            id
        )
    }
}

/// Read one trimmed line; `None` at end of input.
fn read_answer(input: &mut dyn BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "y" | "yes" | "s" | "sim")
}
