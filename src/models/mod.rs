// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod activity;
pub mod insight;
pub mod workout;

pub use activity::{ActivitySet, SetType, WorkoutActivity};
pub use insight::{InsightDelta, WorkoutInsight, NO_EXERCISE};
pub use workout::Workout;
