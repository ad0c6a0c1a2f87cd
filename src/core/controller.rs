//! Application state controller for Sprout.
//!
//! The controller owns the insight collection and the current [`View`].
//! Every user action goes through it: mutations are applied in memory,
//! then the whole collection is written back to the persistence adapter.
//!
//! Persistence is fail-open. A failed write keeps the in-memory state. A
//! failed read starts from an empty collection and suspends saving until a
//! later read succeeds, so the unreadable stored value is never overwritten.
//! Both are logged and neither blocks the user.
//!
//! Stored and remote values are validated the same way as an imported file.
//!
//! Remote changes arrive through [`Controller::watch`], which forwards
//! adapter notifications into a channel. [`Controller::sync_remote`]
//! drains it on the controller's own thread, so mutations never overlap.

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::insight::{ExerciseAttempt, ExerciseKind, Insight, InsightDraft, InsightPatch};
use crate::core::view::{NavigationOutcome, NavigationTarget, View};
use crate::dashboard::{self, DashboardSummary};
use crate::error::{FailOpen, Result, SproutError};
use crate::scheduler::{
    calculate_priority, due_by_priority, is_eligible_for_exercise, next_due, review_patch,
    ReviewOutcome,
};
use crate::storage::{PersistenceAdapter, Subscription, INSIGHTS_KEY};
use crate::transfer;

/// Live subscription to the stored collection.
struct RemoteSync {
    _subscription: Subscription,
    receiver: Receiver<Value>,
}

/// Owns the insight collection and navigation state for one user scope.
pub struct Controller<P: PersistenceAdapter> {
    adapter: P,
    scope: String,
    insights: Vec<Insight>,
    view: View,
    sync: Option<RemoteSync>,
    /// Set when the stored collection could not be read; writes are skipped.
    store_unreadable: bool,
}

impl<P: PersistenceAdapter> Controller<P> {
    /// Create a controller with an empty collection, without reading the store.
    pub fn new(adapter: P, scope: impl Into<String>) -> Self {
        Self {
            adapter,
            scope: scope.into(),
            insights: Vec::new(),
            view: View::default(),
            sync: None,
            store_unreadable: false,
        }
    }

    /// Create a controller and load the stored collection.
    ///
    /// Absent data starts from an empty collection. Unreadable or malformed
    /// data also starts empty, but saving stays suspended until
    /// [`Controller::reload`] or a remote update reads a valid collection.
    pub fn load(adapter: P, scope: impl Into<String>) -> Self {
        let mut controller = Self::new(adapter, scope);
        match controller.read_stored() {
            Ok(insights) => controller.insights = insights,
            Err(e) => {
                warn!(
                    "Failed to load insights: {} (starting empty, saving suspended)",
                    e
                );
                controller.store_unreadable = true;
            }
        }
        debug!(
            "Loaded {} insights from {} adapter (scope '{}')",
            controller.insights.len(),
            controller.adapter.name(),
            controller.scope
        );
        controller
    }

    pub fn adapter(&self) -> &P {
        &self.adapter
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The current view.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// All insights in collection order.
    pub fn insights(&self) -> &[Insight] {
        &self.insights
    }

    /// Whether saving is suspended because the stored collection could not
    /// be read.
    pub fn is_store_unreadable(&self) -> bool {
        self.store_unreadable
    }

    /// Re-read the stored collection, replacing the in-memory one.
    ///
    /// On success saving resumes. On failure nothing changes.
    pub fn reload(&mut self) -> Result<usize> {
        let insights = self.read_stored()?;
        if self.store_unreadable {
            info!("Stored insights readable again, saving resumed");
            self.store_unreadable = false;
        }
        self.insights = insights;
        self.reset_stale_view();
        Ok(self.insights.len())
    }

    /// Look up an insight by ID.
    pub fn get(&self, id: &str) -> Option<&Insight> {
        self.insights.iter().find(|i| i.id == id)
    }

    /// Add a new insight from a draft.
    pub fn add(&mut self, draft: InsightDraft, now: DateTime<Utc>) -> Result<&Insight> {
        let insight = Insight::new(draft, now)?;
        info!("Added insight {}", insight.id);

        let index = self.insights.len();
        self.insights.push(insight);
        self.persist();
        Ok(&self.insights[index])
    }

    /// Apply a partial update to an insight.
    ///
    /// When the patch records a review while in review mode, the view moves
    /// on to the next highest-priority due insight, or back to the
    /// dashboard when none remain.
    pub fn update(
        &mut self,
        id: &str,
        patch: InsightPatch,
        now: DateTime<Utc>,
    ) -> Result<&Insight> {
        let index = self.position(id)?;
        let records_review = patch.records_review();

        self.insights[index].apply_patch(patch)?;
        info!("Updated insight {}", id);
        self.persist();

        if records_review && matches!(self.view, View::Review { .. }) {
            self.advance_review(id, now);
        }

        Ok(&self.insights[index])
    }

    /// Delete an insight permanently.
    ///
    /// A view showing the deleted insight returns to the dashboard.
    pub fn delete(&mut self, id: &str) -> Result<Insight> {
        let index = self.position(id)?;
        let removed = self.insights.remove(index);
        info!("Deleted insight {}", id);

        if self.view.shows(id) {
            self.view = View::Dashboard;
        }
        self.persist();
        Ok(removed)
    }

    /// Move to another view.
    ///
    /// Review selects the highest-priority due insight; when nothing is due
    /// the view is left unchanged. Practice selects the highest-priority
    /// eligible insight, or none.
    pub fn navigate(
        &mut self,
        target: NavigationTarget,
        now: DateTime<Utc>,
    ) -> Result<NavigationOutcome> {
        let view = match target {
            NavigationTarget::Dashboard => View::Dashboard,
            NavigationTarget::Settings => View::Settings,
            NavigationTarget::AddInsight => View::AddInsight,
            NavigationTarget::List => View::List,
            NavigationTarget::Review => match next_due(&self.insights, now, None) {
                Some(next) => View::Review {
                    insight_id: next.id.clone(),
                },
                None => {
                    debug!("Nothing due for review");
                    return Ok(NavigationOutcome::NothingToReview);
                }
            },
            NavigationTarget::Practice => View::Practice {
                insight_id: self
                    .eligible_for_practice(now)
                    .first()
                    .map(|i| i.id.clone()),
            },
            NavigationTarget::PracticeInsight(id) => {
                let insight = self.find(&id)?;
                if !is_eligible_for_exercise(insight, now) {
                    return Err(SproutError::invalid_state(format!(
                        "insight {} is not eligible for practice today",
                        id
                    )));
                }
                View::Practice {
                    insight_id: Some(id),
                }
            }
        };

        debug!("Navigating from {} to {}", self.view, view);
        self.view = view.clone();
        Ok(NavigationOutcome::Entered(view))
    }

    /// Replace the whole collection.
    ///
    /// Fails without touching state if two records share an ID.
    pub fn import(&mut self, insights: Vec<Insight>) -> Result<usize> {
        let mut seen = HashSet::new();
        if let Some(dup) = insights.iter().find(|i| !seen.insert(i.id.as_str())) {
            return Err(SproutError::import(format!("duplicate id '{}'", dup.id)));
        }

        let count = insights.len();
        self.insights = insights;
        self.reset_stale_view();
        info!("Imported {} insights, replacing the collection", count);
        self.persist();
        Ok(count)
    }

    /// Validate an exported JSON collection and replace the current one.
    pub fn import_json(&mut self, text: &str, now: DateTime<Utc>) -> Result<usize> {
        let insights = transfer::parse_collection(text, now)?;
        self.import(insights)
    }

    /// Serialize the collection for export.
    pub fn export(&self) -> Result<String> {
        transfer::export_json(&self.insights)
    }

    /// Remove every insight. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.insights.len();
        self.insights.clear();
        self.reset_stale_view();
        info!("Cleared {} insights", count);
        self.persist();
        count
    }

    /// Record a review outcome for an insight.
    pub fn record_review(
        &mut self,
        id: &str,
        outcome: ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<&Insight> {
        let patch = review_patch(self.find(id)?, outcome, now)?;
        debug!("Recording review '{}' for {}", outcome, id);
        self.update(id, patch, now)
    }

    /// Record a practice attempt for an insight.
    pub fn record_exercise(
        &mut self,
        id: &str,
        kind: ExerciseKind,
        correct: bool,
        now: DateTime<Utc>,
    ) -> Result<&Insight> {
        let patch = InsightPatch {
            append_exercise: vec![ExerciseAttempt::new(kind, correct, now)],
            last_exercise_date: Some(now),
            ..Default::default()
        };
        self.update(id, patch, now)
    }

    /// Due insights, highest priority first.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<&Insight> {
        due_by_priority(&self.insights, now)
            .into_iter()
            .map(|p| p.insight)
            .collect()
    }

    /// Insights that may be practiced today, highest priority first.
    pub fn eligible_for_practice(&self, now: DateTime<Utc>) -> Vec<&Insight> {
        let mut eligible: Vec<(&Insight, f64)> = self
            .insights
            .iter()
            .filter(|i| is_eligible_for_exercise(i, now))
            .map(|i| (i, calculate_priority(i, now)))
            .collect();
        eligible.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        eligible.into_iter().map(|(i, _)| i).collect()
    }

    /// Dashboard summary at `now`.
    pub fn dashboard(&self, now: DateTime<Utc>) -> DashboardSummary {
        dashboard::summarize(&self.insights, now)
    }

    /// Start forwarding store notifications for the collection.
    ///
    /// Does nothing if already watching.
    pub fn watch(&mut self) -> Result<()> {
        if self.sync.is_some() {
            return Ok(());
        }

        let (sender, receiver) = mpsc::channel();
        let subscription = self.adapter.subscribe(
            &self.scope,
            INSIGHTS_KEY,
            Box::new(move |value: &Value| {
                // A closed channel means the controller is gone
                let _ = sender.send(value.clone());
            }),
        )?;

        debug!("Watching {}/{}", self.scope, INSIGHTS_KEY);
        self.sync = Some(RemoteSync {
            _subscription: subscription,
            receiver,
        });
        Ok(())
    }

    /// Stop watching the store.
    pub fn unwatch(&mut self) {
        if self.sync.take().is_some() {
            debug!("Stopped watching {}/{}", self.scope, INSIGHTS_KEY);
        }
    }

    pub fn is_watching(&self) -> bool {
        self.sync.is_some()
    }

    /// Apply pending store notifications.
    ///
    /// The most recent valid value wins; malformed values are skipped.
    /// Returns whether the collection changed.
    pub fn sync_remote(&mut self) -> bool {
        let Some(sync) = &self.sync else {
            return false;
        };

        let now = Utc::now();
        let mut latest = None;
        for value in sync.receiver.try_iter() {
            match transfer::parse_value(value, now) {
                Ok(insights) => latest = Some(insights),
                Err(e) => warn!("Ignoring malformed remote update: {}", e),
            }
        }

        let Some(insights) = latest else {
            return false;
        };
        if self.store_unreadable {
            info!("Valid remote collection received, saving resumed");
            self.store_unreadable = false;
        } else if insights == self.insights {
            return false;
        }

        info!(
            "Remote update replaced the collection ({} insights)",
            insights.len()
        );
        self.insights = insights;
        self.reset_stale_view();
        true
    }

    fn read_stored(&self) -> Result<Vec<Insight>> {
        match self.adapter.get(&self.scope, INSIGHTS_KEY)? {
            Some(value) => transfer::parse_value(value, Utc::now()),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self) {
        if self.store_unreadable {
            warn!(
                "Not saving insights: the stored collection for scope '{}' could not be read \
                 (fix or move it aside to resume saving)",
                self.scope
            );
            return;
        }

        let result = serde_json::to_value(&self.insights)
            .map_err(SproutError::from)
            .and_then(|value| self.adapter.set(&self.scope, INSIGHTS_KEY, &value));
        result.fail_open_default("Failed to persist insights");
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.insights
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| SproutError::insight_not_found(id))
    }

    fn find(&self, id: &str) -> Result<&Insight> {
        self.get(id).ok_or_else(|| SproutError::insight_not_found(id))
    }

    fn advance_review(&mut self, reviewed: &str, now: DateTime<Utc>) {
        self.view = match next_due(&self.insights, now, Some(reviewed)) {
            Some(next) => {
                debug!("Next review: {}", next.id);
                View::Review {
                    insight_id: next.id.clone(),
                }
            }
            None => {
                debug!("Review session complete");
                View::Dashboard
            }
        };
    }

    /// Return to the dashboard if the view shows an insight that is gone.
    fn reset_stale_view(&mut self) {
        if let Some(id) = self.view.insight_id() {
            if self.get(id).is_none() {
                self.view = View::Dashboard;
            }
        }
    }
}
