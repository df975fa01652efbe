// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod insight;

pub use insight::{InsightService, UpdateReport};
