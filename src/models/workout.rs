// SPDX-License-Identifier: MIT

//! Workout document model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored workout record in Firestore.
///
/// Stored at: `workouts/{workout_id}`. Activities live in the `activities`
/// subcollection underneath. Only the fields the aggregation core needs are
/// modeled here; the full document carries more (title, description) owned
/// by the mobile client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    /// Owning user ID
    pub user_id: String,
    /// When the workout took place; determines the insight period
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub date: DateTime<Utc>,
}
