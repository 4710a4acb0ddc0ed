use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-local exercise id. Unrelated to the catalog id of the exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExerciseId(pub u64);

/// Session-local set id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SetId(pub u64);

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ex-{}", self.0)
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "set-{}", self.0)
    }
}

/// Reps/weight value as the user is typing it.
///
/// Text stays text until the workout is serialized, so half-typed or empty
/// values are valid while the session runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericInput {
    Text(String),
    Value(i64),
}

impl Default for NumericInput {
    fn default() -> Self {
        NumericInput::Text(String::new())
    }
}

impl NumericInput {
    /// Resolve to an integer. Anything unparseable counts as 0.
    pub fn value(&self) -> i64 {
        match self {
            NumericInput::Text(text) => parse_leading_int(text),
            NumericInput::Value(v) => *v,
        }
    }

    /// Text shown in an input field
    pub fn as_text(&self) -> String {
        match self {
            NumericInput::Text(text) => text.clone(),
            NumericInput::Value(v) => v.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NumericInput::Text(text) if text.trim().is_empty())
    }
}

impl From<&str> for NumericInput {
    fn from(text: &str) -> Self {
        NumericInput::Text(text.to_string())
    }
}

impl From<String> for NumericInput {
    fn from(text: String) -> Self {
        NumericInput::Text(text)
    }
}

impl From<i64> for NumericInput {
    fn from(value: i64) -> Self {
        NumericInput::Value(value)
    }
}

/// Leading-integer parse: skips leading whitespace, accepts one sign and
/// the longest run of ASCII digits after it. "60.5" -> 60, "12kg" -> 12,
/// "" -> 0, "abc" -> 0.
pub fn parse_leading_int(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return 0;
    }

    // Saturate instead of failing on absurdly long digit runs
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    if negative { -magnitude } else { magnitude }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub id: SetId,
    pub reps: NumericInput,
    pub weight: NumericInput,
    pub completed: bool,
}

impl SetEntry {
    pub fn new(id: SetId) -> Self {
        Self {
            id,
            reps: NumericInput::default(),
            weight: NumericInput::default(),
            completed: false,
        }
    }
}

/// Partial update for a set; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetUpdate {
    pub reps: Option<NumericInput>,
    pub weight: Option<NumericInput>,
    pub completed: Option<bool>,
}

impl SetUpdate {
    pub fn reps(mut self, reps: impl Into<NumericInput>) -> Self {
        self.reps = Some(reps.into());
        self
    }

    pub fn weight(mut self, weight: impl Into<NumericInput>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn apply(self, set: &mut SetEntry) {
        if let Some(reps) = self.reps {
            set.reps = reps;
        }
        if let Some(weight) = self.weight {
            set.weight = weight;
        }
        if let Some(completed) = self.completed {
            set.completed = completed;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub id: ExerciseId,
    pub catalog_ref: Option<String>,
    pub name: String, // copied from the catalog when added
    pub sets: Vec<SetEntry>,
}

impl ExerciseEntry {
    pub fn completed_sets(&self) -> impl Iterator<Item = &SetEntry> {
        self.sets.iter().filter(|set| set.completed)
    }

    pub fn completed_count(&self) -> usize {
        self.completed_sets().count()
    }
}

/// What the caller supplies when adding an exercise to the session
#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub name: String,
    pub catalog_ref: Option<String>,
}

impl NewExercise {
    pub fn new(name: impl Into<String>, catalog_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog_ref: Some(catalog_ref.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub is_active: bool,
    pub is_paused: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub paused_time: Option<DateTime<Utc>>,
    pub total_elapsed: i64, // in seconds, only read while inactive
    pub exercises: Vec<ExerciseEntry>,
}
