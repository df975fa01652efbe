// SPDX-License-Identifier: MIT

//! Event routes for document-creation push notifications.
//!
//! Delivery is at-least-once: a non-2xx response causes the event source to
//! redeliver, so status codes distinguish retryable failures from events
//! that should be dropped.

use crate::error::Result;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Event routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/events/activity-created", post(handle_activity_created))
}

/// Notification that an activity document was created under a workout.
#[derive(Deserialize, Debug)]
struct ActivityCreatedEvent {
    workout_id: String,
    activity_id: String,
}

/// Handle an activity-created event (POST).
///
/// `StoreUnavailable` maps to 503 and commit failures to 500, both of which
/// trigger redelivery. Partial success acknowledges with 200; the failed
/// documents were logged individually and will catch up on later events.
async fn handle_activity_created(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode> {
    // Take the raw body rather than the JSON extractor: an unparseable
    // payload must be acknowledged and dropped, not rejected with a 400 that
    // would keep the event source redelivering it forever.
    let event: ActivityCreatedEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse activity-created event");
            return Ok(StatusCode::OK);
        }
    };

    let mut report = state
        .insights
        .handle_activity_created(&event.workout_id, &event.activity_id)
        .await?;

    if report.all_failed() {
        // Surface one of the per-document errors; the rest were logged by
        // the service.
        return Err(report.failed.swap_remove(0).1);
    }

    Ok(StatusCode::OK)
}
