//! Insight entity types for Sprout.
//!
//! An insight is a short captured note that is reviewed on a spaced
//! schedule. Its review and exercise histories are append-only; the only
//! way to change an insight after creation is through an [`InsightPatch`],
//! which enforces the invariants below.
//!
//! Invariants:
//! - `content` is at least [`MIN_CONTENT_CHARS`] characters (trimmed)
//! - `review_stage` is in `0..=MAX_STAGE` and never decreases
//! - `review_history[0]` is the single `Created` event
//! - once `is_mastered` is true it stays true

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SproutError};
use crate::scheduler;

/// Minimum number of characters (after trimming) an insight must have.
pub const MIN_CONTENT_CHARS: usize = 10;

/// Highest review stage; indexes the last entry of the interval table.
pub const MAX_STAGE: u8 = 3;

/// A captured insight with its review schedule and history.
///
/// Serialized in camelCase so exported collections keep the field names
/// used by the import/export format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Unique identifier, immutable.
    pub id: String,
    /// The insight text.
    pub content: String,
    /// Optional personal note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Optional source (book, talk, person).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation time, immutable.
    pub timestamp: DateTime<Utc>,
    /// Index into the review interval table.
    #[serde(default)]
    pub review_stage: u8,
    /// When the insight is next due for review.
    pub next_review: DateTime<Utc>,
    /// Mastered insights are never scheduled again.
    #[serde(default)]
    pub is_mastered: bool,
    /// Append-only review log.
    #[serde(default)]
    pub review_history: Vec<ReviewEvent>,
    /// Append-only practice log.
    #[serde(default)]
    pub exercise_history: Vec<ExerciseAttempt>,
    /// Most recent practice attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_exercise_date: Option<DateTime<Utc>>,
}

impl Insight {
    /// Create a new insight from a draft.
    ///
    /// Assigns a fresh ID, starts at stage 0 due one day from `now`, and
    /// records the `Created` event.
    pub fn new(draft: InsightDraft, now: DateTime<Utc>) -> Result<Self> {
        let content = validate_content(&draft.content)?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            note: non_empty(draft.note),
            source: non_empty(draft.source),
            tags: clean_tags(draft.tags),
            timestamp: now,
            review_stage: 0,
            next_review: scheduler::next_review_from(0, now),
            is_mastered: false,
            review_history: vec![ReviewEvent::new(ReviewAction::Created, now)],
            exercise_history: Vec::new(),
            last_exercise_date: None,
        })
    }

    /// Whether the insight is due for review at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_mastered && self.next_review <= now
    }

    /// Apply a partial update, enforcing the entity invariants.
    ///
    /// The patch is validated completely before any field is written, so a
    /// rejected patch leaves the insight untouched.
    pub fn apply_patch(&mut self, patch: InsightPatch) -> Result<()> {
        let content = match &patch.content {
            Some(c) => Some(validate_content(c)?),
            None => None,
        };

        if let Some(stage) = patch.review_stage {
            if stage > MAX_STAGE {
                return Err(SproutError::validation(format!(
                    "review stage {} is out of range 0..={}",
                    stage, MAX_STAGE
                )));
            }
            if stage < self.review_stage {
                return Err(SproutError::invalid_state(format!(
                    "review stage cannot go back from {} to {}",
                    self.review_stage, stage
                )));
            }
        }

        if patch.mastered == Some(false) && self.is_mastered {
            return Err(SproutError::invalid_state(
                "a mastered insight cannot be unmastered",
            ));
        }

        if patch
            .append_review
            .iter()
            .any(|e| e.action == ReviewAction::Created)
        {
            return Err(SproutError::invalid_state(
                "an insight can only be created once",
            ));
        }

        if let Some(content) = content {
            self.content = content;
        }
        if let Some(note) = patch.note {
            self.note = non_empty(note);
        }
        if let Some(source) = patch.source {
            self.source = non_empty(source);
        }
        if let Some(tags) = patch.tags {
            self.tags = clean_tags(tags);
        }
        if let Some(stage) = patch.review_stage {
            self.review_stage = stage;
        }
        if let Some(next) = patch.next_review {
            self.next_review = next;
        }
        if patch.mastered == Some(true) {
            self.is_mastered = true;
        }
        self.review_history.extend(patch.append_review);
        self.exercise_history.extend(patch.append_exercise);
        if let Some(ts) = patch.last_exercise_date {
            self.last_exercise_date = Some(ts);
        }

        Ok(())
    }

    /// Number of completed reviews (excludes the creation event).
    pub fn review_count(&self) -> usize {
        self.review_history
            .iter()
            .filter(|e| e.action == ReviewAction::Reviewed)
            .count()
    }
}

/// User input for a new insight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightDraft {
    pub content: String,
    pub note: Option<String>,
    pub source: Option<String>,
    pub tags: Vec<String>,
}

impl InsightDraft {
    /// Create a draft with only content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set the personal note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Set the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Partial update for an insight.
///
/// `None` leaves a field unchanged. For `note` and `source`, `Some(None)`
/// clears the field. History fields are append-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightPatch {
    pub content: Option<String>,
    pub note: Option<Option<String>>,
    pub source: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub review_stage: Option<u8>,
    pub next_review: Option<DateTime<Utc>>,
    pub mastered: Option<bool>,
    pub append_review: Vec<ReviewEvent>,
    pub append_exercise: Vec<ExerciseAttempt>,
    pub last_exercise_date: Option<DateTime<Utc>>,
}

impl InsightPatch {
    /// Whether the patch changes anything.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the patch records a review (used to drive review mode).
    pub fn records_review(&self) -> bool {
        !self.append_review.is_empty()
    }
}

/// One entry in an insight's review log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewEvent {
    pub timestamp: DateTime<Utc>,
    pub action: ReviewAction,
}

impl ReviewEvent {
    /// Create a review event.
    pub fn new(action: ReviewAction, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, action }
    }
}

/// What happened in a review log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Created,
    Reviewed,
    Mastered,
}

/// One recorded practice attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseAttempt {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    pub correct: bool,
}

impl ExerciseAttempt {
    /// Create an attempt record.
    pub fn new(kind: ExerciseKind, correct: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            kind,
            correct,
        }
    }
}

/// The kinds of practice exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    FillBlank,
    MultipleChoice,
    OpenAnswer,
}

impl ExerciseKind {
    /// All kinds, in batch output order.
    pub fn all() -> &'static [ExerciseKind] {
        &[
            ExerciseKind::FillBlank,
            ExerciseKind::MultipleChoice,
            ExerciseKind::OpenAnswer,
        ]
    }

    /// Stable identifier used in JSON and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::FillBlank => "fill-blank",
            ExerciseKind::MultipleChoice => "multiple-choice",
            ExerciseKind::OpenAnswer => "open-answer",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseKind::FillBlank => "Fill in the blank",
            ExerciseKind::MultipleChoice => "Multiple choice",
            ExerciseKind::OpenAnswer => "Open answer",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "fill-blank" => Ok(ExerciseKind::FillBlank),
            "multiple-choice" => Ok(ExerciseKind::MultipleChoice),
            "open-answer" => Ok(ExerciseKind::OpenAnswer),
            other => Err(SproutError::validation(format!(
                "unknown exercise kind '{}'",
                other
            ))),
        }
    }
}

fn validate_content(content: &str) -> Result<String> {
    let trimmed = content.trim();
    let chars = trimmed.chars().count();
    if chars < MIN_CONTENT_CHARS {
        return Err(SproutError::validation(format!(
            "content must be at least {} characters (got {})",
            MIN_CONTENT_CHARS, chars
        )));
    }
    Ok(trimmed.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').to_string();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}
