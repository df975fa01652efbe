// SPDX-License-Identifier: MIT

//! Insight aggregation service.
//!
//! Handles the core workflow for an activity-created event:
//! 1. Resolve the activity and its parent workout
//! 2. Compute the calendar-month period from the workout date
//! 3. Locate the owner's insight documents for that period
//! 4. Commit the counter increments and argmax pointer updates to each match

use crate::config::ArgmaxMode;
use crate::db::InsightStore;
use crate::error::{AppError, Result};
use crate::period::month_bounds;
use futures_util::{stream, StreamExt};

/// More than one matched document only happens when the one-per-period
/// invariant was violated upstream, so contention here is theoretical.
const MAX_CONCURRENT_COMMITS: usize = 8;

/// Applies activity-created events to monthly insight aggregates.
///
/// Generic over the store so tests can drive the workflow with an in-memory
/// fake; production uses [`crate::db::FirestoreDb`].
pub struct InsightService<S> {
    db: S,
    mode: ArgmaxMode,
}

/// Per-document outcome of one event.
///
/// With the expected one matched document this is all-or-nothing; if the
/// one-per-period invariant was violated upstream and several documents
/// matched, each commit stands or fails on its own and nothing is rolled
/// back.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Insight document IDs whose commit succeeded
    pub updated: Vec<String>,
    /// Documents skipped as redelivered duplicates (transactional mode only)
    pub skipped: Vec<String>,
    /// Documents whose commit failed, left at their pre-event state
    pub failed: Vec<(String, AppError)>,
}

impl UpdateReport {
    /// Number of insight documents the locator matched.
    pub fn matched(&self) -> usize {
        self.updated.len() + self.skipped.len() + self.failed.len()
    }

    /// True when at least one document matched and every commit failed.
    pub fn all_failed(&self) -> bool {
        !self.failed.is_empty() && self.updated.is_empty() && self.skipped.is_empty()
    }
}

impl<S: InsightStore> InsightService<S> {
    pub fn new(db: S, mode: ArgmaxMode) -> Self {
        Self { db, mode }
    }

    /// Process one activity-created event.
    ///
    /// A missing activity or workout is a no-op, not an error: the documents
    /// may have been deleted between event emission and delivery, and an
    /// uninitialized period legitimately has no insight document. Store
    /// errors during lookup propagate so the delivery system redelivers.
    pub async fn handle_activity_created(
        &self,
        workout_id: &str,
        activity_id: &str,
    ) -> Result<UpdateReport> {
        let Some(activity) = self.db.get_activity(workout_id, activity_id).await? else {
            tracing::warn!(workout_id, activity_id, "Activity not found, dropping event");
            return Ok(UpdateReport::default());
        };

        let Some(workout) = self.db.get_workout(workout_id).await? else {
            tracing::warn!(workout_id, activity_id, "Workout not found, dropping event");
            return Ok(UpdateReport::default());
        };

        let (period_start, next_period_start) = month_bounds(workout.date);

        tracing::debug!(
            workout_id,
            activity_id,
            exercise_id = %activity.exercise_id,
            user_id = %workout.user_id,
            period_start = %period_start,
            sets = activity.activity_sets.len(),
            "Processing activity-created event"
        );

        let insights = self
            .db
            .find_insights(&workout.user_id, period_start, next_period_start)
            .await?;

        if insights.is_empty() {
            tracing::debug!(
                user_id = %workout.user_id,
                period_start = %period_start,
                "No insight document for period, nothing to update"
            );
            return Ok(UpdateReport::default());
        }

        if insights.len() > 1 {
            tracing::warn!(
                user_id = %workout.user_id,
                period_start = %period_start,
                count = insights.len(),
                "Multiple insight documents match one period, updating all"
            );
        }

        // Commit every match independently; one failure must not keep the
        // other documents from being updated.
        let commits: Vec<_> = insights.iter().filter_map(|insight| {
            let insight_id = match insight.insight_id.as_deref() {
                Some(id) => id.to_string(),
                None => {
                    tracing::error!(
                        user_id = %workout.user_id,
                        "Insight document returned without an ID, skipping"
                    );
                    return None;
                }
            };

            let user_id = &workout.user_id;
            let exercise_id = &activity.exercise_id;
            Some(async move {
                let outcome = match self.mode {
                    ArgmaxMode::Incremental => {
                        let delta = insight.plan_update(exercise_id);
                        self.db
                            .commit_insight_delta(user_id, insight, &delta)
                            .await
                            .map(|()| true)
                    }
                    ArgmaxMode::Transactional => {
                        self.db
                            .apply_event_transactional(
                                user_id,
                                &insight_id,
                                activity_id,
                                exercise_id,
                            )
                            .await
                    }
                };
                (insight_id, outcome)
            })
        }).collect();

        let outcomes = stream::iter(commits)
            .buffer_unordered(MAX_CONCURRENT_COMMITS)
            .collect::<Vec<_>>()
            .await;

        let mut report = UpdateReport::default();

        for (insight_id, outcome) in outcomes {
            match outcome {
                Ok(true) => report.updated.push(insight_id),
                Ok(false) => report.skipped.push(insight_id),
                Err(e) => {
                    tracing::error!(
                        user_id = %workout.user_id,
                        insight_id = %insight_id,
                        error = %e,
                        "Insight commit failed, document left unchanged"
                    );
                    report.failed.push((insight_id, e));
                }
            }
        }

        tracing::info!(
            workout_id,
            activity_id,
            exercise_id = %activity.exercise_id,
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Insight update complete"
        );

        Ok(report)
    }
}
