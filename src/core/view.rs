//! Navigation state for Sprout.
//!
//! The controller is always in exactly one [`View`]. Review and practice
//! views carry the insight they are showing; every other view stands on
//! its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SproutError;

/// The current view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    /// Summary of the collection. The default view.
    #[default]
    Dashboard,
    /// Reviewing one due insight.
    Review {
        #[serde(rename = "insightId")]
        insight_id: String,
    },
    /// Practicing exercises, for one insight or none when nothing is eligible.
    Practice {
        #[serde(rename = "insightId", skip_serializing_if = "Option::is_none")]
        insight_id: Option<String>,
    },
    Settings,
    AddInsight,
    List,
}

impl View {
    /// Short name of the view.
    pub fn name(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Review { .. } => "review",
            View::Practice { .. } => "practice",
            View::Settings => "settings",
            View::AddInsight => "add_insight",
            View::List => "list",
        }
    }

    /// The insight this view is showing, if any.
    pub fn insight_id(&self) -> Option<&str> {
        match self {
            View::Review { insight_id } => Some(insight_id),
            View::Practice { insight_id } => insight_id.as_deref(),
            _ => None,
        }
    }

    /// Whether the view is showing `id`.
    pub fn shows(&self, id: &str) -> bool {
        self.insight_id() == Some(id)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.insight_id() {
            Some(id) => write!(f, "{} ({})", self.name(), id),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// Where a navigation request wants to go.
///
/// `Review` and `Practice` let the controller choose the insight;
/// `PracticeInsight` names one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    Dashboard,
    Review,
    Practice,
    PracticeInsight(String),
    Settings,
    AddInsight,
    List,
}

impl FromStr for NavigationTarget {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dashboard" | "home" => Ok(NavigationTarget::Dashboard),
            "review" => Ok(NavigationTarget::Review),
            "practice" => Ok(NavigationTarget::Practice),
            "settings" => Ok(NavigationTarget::Settings),
            "add" | "add_insight" => Ok(NavigationTarget::AddInsight),
            "list" => Ok(NavigationTarget::List),
            other => Err(SproutError::validation(format!(
                "unknown view '{}'",
                other
            ))),
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The controller moved to this view.
    Entered(View),
    /// Review was requested but nothing is due; the view did not change.
    NothingToReview,
}

impl NavigationOutcome {
    /// The view entered, if navigation happened.
    pub fn view(&self) -> Option<&View> {
        match self {
            NavigationOutcome::Entered(view) => Some(view),
            NavigationOutcome::NothingToReview => None,
        }
    }
}
