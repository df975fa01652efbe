//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

use crate::error::AppError;
use crate::models::{InsightDelta, Workout, WorkoutActivity, WorkoutInsight};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Store operations the insight engine depends on.
///
/// The engine takes an implementation as a constructor argument instead of
/// reaching for a shared client, so tests can drive it with an in-memory
/// fake and inject per-document commit failures.
pub trait InsightStore: Send + Sync {
    /// Look up a workout by document ID.
    fn get_workout(
        &self,
        workout_id: &str,
    ) -> impl Future<Output = Result<Option<Workout>, AppError>> + Send;

    /// Look up an activity in a workout's subcollection.
    fn get_activity(
        &self,
        workout_id: &str,
        activity_id: &str,
    ) -> impl Future<Output = Result<Option<WorkoutActivity>, AppError>> + Send;

    /// Find the user's insight documents whose period start falls in
    /// `[period_start, next_period_start)`.
    fn find_insights(
        &self,
        user_id: &str,
        period_start: DateTime<Utc>,
        next_period_start: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<WorkoutInsight>, AppError>> + Send;

    /// Commit an event using server-side counter increments plus pointer
    /// field-sets computed from the given snapshot.
    fn commit_insight_delta(
        &self,
        user_id: &str,
        insight: &WorkoutInsight,
        delta: &InsightDelta,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Commit an event via transactional read-modify-write. Returns `false`
    /// for redelivered duplicates and vanished documents.
    fn apply_event_transactional(
        &self,
        user_id: &str,
        insight_id: &str,
        event_id: &str,
        exercise_id: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;
}

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const WORKOUTS: &str = "workouts";
    /// Subcollection of `workouts/{workout_id}`
    pub const ACTIVITIES: &str = "activities";
    /// Monthly insight aggregates, subcollection of `users/{user_id}`
    pub const WORKOUT_INSIGHTS: &str = "workout_insights";
}
