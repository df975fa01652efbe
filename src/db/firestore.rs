// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Workouts and their activity subcollections (read-only lookups)
//! - Workout insights (monthly aggregate query + commit paths)
//!
//! The wrapper is injected into services explicitly; nothing in the crate
//! reaches a process-wide client.

use crate::db::{collections, InsightStore};
use crate::error::AppError;
use crate::models::{InsightDelta, Workout, WorkoutActivity, WorkoutInsight};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Test Seeding Helpers ────────────────────────────────────

    /// Create or replace a workout document.
    pub async fn set_workout(&self, workout_id: &str, workout: &Workout) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUTS)
            .document_id(workout_id)
            .object(workout)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create or replace an activity in a workout's subcollection.
    pub async fn set_activity(
        &self,
        workout_id: &str,
        activity_id: &str,
        activity: &WorkoutActivity,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let parent = client
            .parent_path(collections::WORKOUTS, workout_id)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let _: () = client
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(activity_id)
            .parent(&parent)
            .object(activity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create or replace an insight document.
    pub async fn set_insight(
        &self,
        user_id: &str,
        insight_id: &str,
        insight: &WorkoutInsight,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let parent = client
            .parent_path(collections::USERS, user_id)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let _: () = client
            .fluent()
            .update()
            .in_col(collections::WORKOUT_INSIGHTS)
            .document_id(insight_id)
            .parent(&parent)
            .object(insight)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get an insight document by ID.
    pub async fn get_insight(
        &self,
        user_id: &str,
        insight_id: &str,
    ) -> Result<Option<WorkoutInsight>, AppError> {
        let client = self.get_client()?;
        let parent = client
            .parent_path(collections::USERS, user_id)
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .select()
            .by_id_in(collections::WORKOUT_INSIGHTS)
            .parent(&parent)
            .obj()
            .one(insight_id)
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }
}

impl InsightStore for FirestoreDb {
    // ─── Workout Lookups ─────────────────────────────────────────

    /// Get a workout by document ID.
    async fn get_workout(&self, workout_id: &str) -> Result<Option<Workout>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUTS)
            .obj()
            .one(workout_id)
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    /// Get an activity from a workout's subcollection.
    async fn get_activity(
        &self,
        workout_id: &str,
        activity_id: &str,
    ) -> Result<Option<WorkoutActivity>, AppError> {
        let client = self.get_client()?;
        let parent = client
            .parent_path(collections::WORKOUTS, workout_id)
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .parent(&parent)
            .obj()
            .one(activity_id)
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    // ─── Insight Aggregate Locator ───────────────────────────────

    /// Find the user's insight documents whose period start falls in
    /// `[period_start, next_period_start)`.
    ///
    /// Expected to match exactly one document. Zero matches means the period
    /// has not been initialized yet; more than one means the external
    /// one-per-period invariant was violated. Both are surfaced as-is, the
    /// locator enforces nothing.
    async fn find_insights(
        &self,
        user_id: &str,
        period_start: chrono::DateTime<chrono::Utc>,
        next_period_start: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<WorkoutInsight>, AppError> {
        let client = self.get_client()?;
        let parent = client
            .parent_path(collections::USERS, user_id)
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .select()
            .from(collections::WORKOUT_INSIGHTS)
            .parent(&parent)
            .filter(move |q| {
                q.for_all([
                    q.field("date")
                        .greater_than_or_equal(firestore::FirestoreTimestamp(period_start)),
                    q.field("date")
                        .less_than(firestore::FirestoreTimestamp(next_period_start)),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))
    }

    // ─── Insight Commit Paths ────────────────────────────────────

    /// Commit an event to an insight document using server-side increments.
    ///
    /// The three counters (`total_sets` and the per-exercise entries in both
    /// maps) are atomic field transforms, so no increment is lost however
    /// concurrent commits interleave. The two argmax pointers are plain field
    /// sets carrying values computed from the pre-fetch snapshot; concurrent
    /// writers can overwrite each other's pointer, which the next event for
    /// the same document repairs.
    async fn commit_insight_delta(
        &self,
        user_id: &str,
        insight: &WorkoutInsight,
        delta: &InsightDelta,
    ) -> Result<(), AppError> {
        let insight_id = insight
            .insight_id
            .as_deref()
            .ok_or_else(|| AppError::Database("Insight document has no ID".to_string()))?;

        let client = self.get_client()?;
        let parent = client
            .parent_path(collections::USERS, user_id)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let commit_err = |message: String| AppError::Commit {
            insight_id: insight_id.to_string(),
            message,
        };

        let updated = WorkoutInsight {
            exercise_id_most_activities: delta.exercise_id_most_activities.clone(),
            exercise_id_most_sets: delta.exercise_id_most_sets.clone(),
            ..insight.clone()
        };

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .fields(["exercise_id_most_activities", "exercise_id_most_sets"])
            .in_col(collections::WORKOUT_INSIGHTS)
            .document_id(insight_id)
            .parent(&parent)
            .object(&updated)
            .transforms(|t| {
                t.fields([
                    t.field("total_sets").increment(1),
                    t.field(map_key_path(
                        "exercise_occurrence_counts",
                        &delta.exercise_id,
                    ))
                    .increment(1),
                    t.field(map_key_path("exercise_set_counts", &delta.exercise_id))
                        .increment(1),
                ])
            })
            .add_to_transaction(&mut transaction)
            .map_err(|e| commit_err(format!("Failed to add update to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| commit_err(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }

    /// Commit an event to an insight document via transactional
    /// read-modify-write.
    ///
    /// Runs inside [`firestore::FirestoreDb::run_transaction`]: the read goes
    /// through the transaction-scoped client handed to the closure, so the
    /// commit is conflict-checked against it and the whole closure is retried
    /// with fresh data when a concurrent writer got there first. The argmax
    /// pointers are therefore always computed from current counts, and the
    /// duplicate check against `processed_event_ids` holds under concurrent
    /// redelivery.
    ///
    /// Returns `true` if the event was applied, `false` if it was a
    /// redelivered duplicate or the document vanished.
    async fn apply_event_transactional(
        &self,
        user_id: &str,
        insight_id: &str,
        event_id: &str,
        exercise_id: &str,
    ) -> Result<bool, AppError> {
        let client = self.get_client()?;

        let applied = client
            .run_transaction(|db, transaction| {
                // The closure may run more than once; give each attempt its
                // own copies.
                let user_id = user_id.to_string();
                let insight_id = insight_id.to_string();
                let event_id = event_id.to_string();
                let exercise_id = exercise_id.to_string();
                Box::pin(async move {
                    let parent = db.parent_path(collections::USERS, &user_id)?;

                    let current: Option<WorkoutInsight> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::WORKOUT_INSIGHTS)
                        .parent(&parent)
                        .obj()
                        .one(&insight_id)
                        .await?;

                    let Some(mut insight) = current else {
                        // Matched by the locator but gone by commit time.
                        return Ok(false);
                    };

                    if !insight.apply_event(&event_id, &exercise_id) {
                        tracing::debug!(
                            insight_id = %insight_id,
                            event_id = %event_id,
                            "Event already processed (idempotent skip)"
                        );
                        return Ok(false);
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::WORKOUT_INSIGHTS)
                        .document_id(&insight_id)
                        .parent(&parent)
                        .object(&insight)
                        .add_to_transaction(transaction)?;

                    Ok(true)
                })
            })
            .await
            .map_err(|e| AppError::Commit {
                insight_id: insight_id.to_string(),
                message: format!("Transaction failed: {}", e),
            })?;

        Ok(applied)
    }
}

/// Firestore field path addressing one key inside a map field. Keys are
/// backtick-quoted since document IDs may start with a digit.
fn map_key_path(map_field: &str, key: &str) -> String {
    format!("{}.`{}`", map_field, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key_path_quotes_key() {
        assert_eq!(
            map_key_path("exercise_occurrence_counts", "8f2Kq"),
            "exercise_occurrence_counts.`8f2Kq`"
        );
    }
}
