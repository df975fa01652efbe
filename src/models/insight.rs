// SPDX-License-Identifier: MIT

//! Monthly workout insight aggregates.
//!
//! One document per user per calendar month, read by the mobile client's
//! insights screen. Maintained incrementally as activities are recorded,
//! so reads stay O(1) instead of re-scanning the month's workouts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Sentinel value of the argmax pointer fields before any event has been
/// recorded for the period.
pub const NO_EXERCISE: &str = "";

/// Pre-computed monthly statistics for a user.
///
/// Stored at: `users/{user_id}/workout_insights/{insight_id}`. Documents are
/// created by a scheduled process at the start of each month and are never
/// deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutInsight {
    /// Firestore document ID, populated on reads and never written back
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub insight_id: Option<String>,

    /// Period start (first instant of the covered month). Identifies the
    /// document together with the owning user.
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub date: DateTime<Utc>,

    /// Events committed against this document, one per logged set
    #[serde(default)]
    pub total_sets: u32,

    /// Processing events per exercise ID. Absent key means zero.
    #[serde(default)]
    pub exercise_occurrence_counts: HashMap<String, u32>,

    /// Sets logged per exercise ID. Incremented in lockstep with
    /// `exercise_occurrence_counts`, one per event.
    #[serde(default)]
    pub exercise_set_counts: HashMap<String, u32>,

    /// Exercise currently holding the maximum occurrence count, or
    /// [`NO_EXERCISE`] when the period is still empty
    #[serde(default)]
    pub exercise_id_most_activities: String,

    /// Exercise currently holding the maximum set count
    #[serde(default)]
    pub exercise_id_most_sets: String,

    /// Event IDs already folded into this document. Only maintained when the
    /// service runs in transactional mode; stays empty otherwise.
    #[serde(default)]
    pub processed_event_ids: HashSet<String>,
}

/// Field changes for one event against one insight document, computed from a
/// point-in-time snapshot.
///
/// The counter bumps are committed as server-side atomic increments and are
/// safe under any interleaving. The pointer values are plain field sets and
/// can lose to a concurrent writer; see [`crate::config::ArgmaxMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightDelta {
    /// Exercise whose counters get incremented
    pub exercise_id: String,
    /// New value for the most-occurrences pointer
    pub exercise_id_most_activities: String,
    /// New value for the most-sets pointer
    pub exercise_id_most_sets: String,
}

impl WorkoutInsight {
    /// An empty aggregate covering the month starting at `period_start`.
    pub fn new(period_start: DateTime<Utc>) -> Self {
        Self {
            insight_id: None,
            date: period_start,
            total_sets: 0,
            exercise_occurrence_counts: HashMap::new(),
            exercise_set_counts: HashMap::new(),
            exercise_id_most_activities: NO_EXERCISE.to_string(),
            exercise_id_most_sets: NO_EXERCISE.to_string(),
            processed_event_ids: HashSet::new(),
        }
    }

    fn occurrence_count(&self, exercise_id: &str) -> u32 {
        self.exercise_occurrence_counts
            .get(exercise_id)
            .copied()
            .unwrap_or(0)
    }

    fn set_count(&self, exercise_id: &str) -> u32 {
        self.exercise_set_counts
            .get(exercise_id)
            .copied()
            .unwrap_or(0)
    }

    /// Compute the update an event for `exercise_id` implies, without
    /// mutating the snapshot.
    ///
    /// A pointer moves only when the post-increment count strictly exceeds
    /// the incumbent's count (or there is no incumbent yet). Ties keep the
    /// incumbent, so the exercise that reached a given count first wins.
    pub fn plan_update(&self, exercise_id: &str) -> InsightDelta {
        let new_occurrences = self.occurrence_count(exercise_id) + 1;
        let new_sets = self.set_count(exercise_id) + 1;

        let exercise_id_most_activities = if self.exercise_id_most_activities == NO_EXERCISE
            || new_occurrences > self.occurrence_count(&self.exercise_id_most_activities)
        {
            exercise_id.to_string()
        } else {
            self.exercise_id_most_activities.clone()
        };

        let exercise_id_most_sets = if self.exercise_id_most_sets == NO_EXERCISE
            || new_sets > self.set_count(&self.exercise_id_most_sets)
        {
            exercise_id.to_string()
        } else {
            self.exercise_id_most_sets.clone()
        };

        InsightDelta {
            exercise_id: exercise_id.to_string(),
            exercise_id_most_activities,
            exercise_id_most_sets,
        }
    }

    /// Apply an event to this aggregate in memory.
    ///
    /// Used by the transactional commit path, where the whole document is
    /// rewritten inside a transaction, and by tests exercising the serial
    /// argmax invariant.
    pub fn apply(&mut self, exercise_id: &str) {
        let delta = self.plan_update(exercise_id);

        self.total_sets += 1;
        *self
            .exercise_occurrence_counts
            .entry(exercise_id.to_string())
            .or_insert(0) += 1;
        *self
            .exercise_set_counts
            .entry(exercise_id.to_string())
            .or_insert(0) += 1;
        self.exercise_id_most_activities = delta.exercise_id_most_activities;
        self.exercise_id_most_sets = delta.exercise_id_most_sets;
    }

    /// Apply an event with duplicate detection.
    ///
    /// Returns `true` if the event was new and applied, `false` if it was
    /// already processed (redelivered) and skipped.
    pub fn apply_event(&mut self, event_id: &str, exercise_id: &str) -> bool {
        if self.processed_event_ids.contains(event_id) {
            return false;
        }
        self.processed_event_ids.insert(event_id.to_string());
        self.apply(exercise_id);
        true
    }
}
