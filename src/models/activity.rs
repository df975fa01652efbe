// SPDX-License-Identifier: MIT

//! Activity document model.
//!
//! An activity is one exercise performed during a workout, stored at
//! `workouts/{workout_id}/activities/{activity_id}` together with the sets
//! logged for it.

use serde::{Deserialize, Serialize};

/// Stored activity record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutActivity {
    /// Exercise this activity is an instance of
    pub exercise_id: String,
    /// Which kind of sets this activity holds
    pub set_type: SetType,
    /// Position of this activity within its workout
    pub workout_index: u32,
    /// Sets logged so far
    #[serde(default)]
    pub activity_sets: Vec<ActivitySet>,
}

/// The kind of sets an activity records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetType {
    #[serde(rename = "resistance_set")]
    Resistance,
    #[serde(rename = "run_set")]
    Run,
    #[serde(rename = "swim_set")]
    Swim,
}

/// One logged set, tagged by kind.
///
/// The variant set is closed and known at compile time, so dispatch is plain
/// pattern matching. Encoded as `{"type": "...", "data": {...}}` to stay
/// wire-compatible with the mobile client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ActivitySet {
    Resistance(ResistanceSet),
    Run(RunSet),
    Swim(SwimSet),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResistanceSet {
    pub id: String,
    pub set_index: u32,
    pub weight: f64,
    pub repetitions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSet {
    pub id: String,
    pub set_index: u32,
    pub distance: f64,
    pub elevation: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwimSet {
    pub id: String,
    pub set_index: u32,
    pub distance: f64,
    pub laps: u32,
    pub duration: f64,
}

impl ActivitySet {
    pub fn id(&self) -> &str {
        match self {
            ActivitySet::Resistance(s) => &s.id,
            ActivitySet::Run(s) => &s.id,
            ActivitySet::Swim(s) => &s.id,
        }
    }

    pub fn set_index(&self) -> u32 {
        match self {
            ActivitySet::Resistance(s) => s.set_index,
            ActivitySet::Run(s) => s.set_index,
            ActivitySet::Swim(s) => s.set_index,
        }
    }

    pub fn kind(&self) -> SetType {
        match self {
            ActivitySet::Resistance(_) => SetType::Resistance,
            ActivitySet::Run(_) => SetType::Run,
            ActivitySet::Swim(_) => SetType::Swim,
        }
    }
}
