// SPDX-License-Identifier: MIT

//! Goalympian-Insights event server
//!
//! Receives document-creation push notifications for workout activities and
//! maintains the per-user monthly insight aggregates in Firestore.

use goalympian_insights::{config::Config, db::FirestoreDb, services::InsightService, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        argmax_mode = ?config.argmax_mode,
        "Starting Goalympian-Insights"
    );

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize insight aggregation service
    let insights = InsightService::new(db.clone(), config.argmax_mode);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        insights,
    });

    // Build router
    let app = goalympian_insights::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("goalympian_insights=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
