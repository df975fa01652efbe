// SPDX-License-Identifier: MIT

//! Goalympian-Insights: monthly workout insight aggregation
//!
//! This crate maintains per-user, per-month insight documents (exercise
//! counters and most-performed-exercise pointers) as activity-created
//! events arrive from the mobile fitness app's document store.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod period;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::InsightService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub insights: InsightService<FirestoreDb>,
}
