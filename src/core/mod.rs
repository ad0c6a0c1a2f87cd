//! Core types and logic for Sprout.
//!
//! This module contains the insight entity, navigation state, and the
//! controller that owns both.

pub mod controller;
pub mod insight;
pub mod view;

pub use controller::Controller;
pub use insight::{
    ExerciseAttempt, ExerciseKind, Insight, InsightDraft, InsightPatch, ReviewAction, ReviewEvent,
    MAX_STAGE, MIN_CONTENT_CHARS,
};
pub use view::{NavigationOutcome, NavigationTarget, View};
