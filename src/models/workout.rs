use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::exercise::null_as_default;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
        }
    }
}

/// Reference to another document in the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(rename = "_ref")]
    pub target: String,
}

impl Reference {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            kind: "reference".to_string(),
            target: target.into(),
        }
    }
}

// ---- Outbound: what gets written when a workout is completed ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSet {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: String,
    pub reps: i64,
    pub weight: i64,
    pub weight_unit: WeightUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentExercise {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: String,
    pub exercise: Reference,
    pub sets: Vec<DocumentSet>,
}

/// The workout record submitted to the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDocument {
    #[serde(rename = "_type")]
    pub kind: String,
    pub date: DateTime<Utc>,
    pub duration: i64, // in seconds
    pub user_id: String,
    pub exercises: Vec<DocumentExercise>,
}

pub const WORKOUT_TYPE: &str = "workout";
pub const EXERCISE_ENTRY_TYPE: &str = "exerciseEntry";
pub const SET_ENTRY_TYPE: &str = "setEntry";

// ---- Inbound: workout history as read back from the store ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Counts edited by hand in the store may carry decimals or be null.
/// Decimals are truncated, null is 0.
fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.map(|v| v.trunc() as i64).unwrap_or(0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedSet {
    #[serde(default, deserialize_with = "whole_number")]
    pub reps: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight_unit: WeightUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedExercise {
    /// `None` when the referenced catalog exercise no longer exists
    #[serde(default)]
    pub exercise: Option<ExerciseSummary>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sets: Vec<RecordedSet>,
}

impl RecordedExercise {
    pub fn name(&self) -> &str {
        self.exercise.as_ref().map(|e| e.name.as_str()).unwrap_or("Exercise")
    }

    pub fn volume(&self) -> f64 {
        self.sets.iter().map(|s| s.reps as f64 * s.weight).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(default, deserialize_with = "whole_number")]
    pub duration: i64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exercises: Vec<RecordedExercise>,
}

impl WorkoutRecord {
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Sum of reps x weight over every set
    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(RecordedExercise::volume).sum()
    }
}
