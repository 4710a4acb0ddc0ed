use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;

use crate::models::workout::WorkoutRecord;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutStats {
    pub total_workouts: usize,
    pub total_time: i64,       // in seconds
    pub average_duration: i64, // in seconds, rounded
    pub days_active: usize,
    pub total_sets: usize,
    pub total_volume: f64,
}

impl WorkoutStats {
    pub fn from_records(records: &[WorkoutRecord]) -> Self {
        Self::from_records_in(records, &Local)
    }

    /// Same as `from_records`, with the calendar days counted in `tz`
    pub fn from_records_in<Tz: TimeZone>(records: &[WorkoutRecord], tz: &Tz) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let total_time: i64 = records.iter().map(|r| r.duration.max(0)).sum();
        let average_duration = (total_time as f64 / records.len() as f64).round() as i64;
        let days: HashSet<NaiveDate> = records
            .iter()
            .map(|r| r.date.with_timezone(tz).date_naive())
            .collect();

        Self {
            total_workouts: records.len(),
            total_time,
            average_duration,
            days_active: days.len(),
            total_sets: records.iter().map(WorkoutRecord::set_count).sum(),
            total_volume: records.iter().map(WorkoutRecord::total_volume).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LastWorkoutSummary {
    pub id: String,
    pub date: DateTime<Utc>,
    pub duration: i64,
    pub exercise_count: usize,
    pub set_count: usize,
}

impl LastWorkoutSummary {
    /// Summary of the most recent record, whatever order the input is in
    pub fn from_records(records: &[WorkoutRecord]) -> Option<Self> {
        records.iter().max_by_key(|r| r.date).map(|latest| Self {
            id: latest.id.clone(),
            date: latest.date,
            duration: latest.duration,
            exercise_count: latest.exercise_count(),
            set_count: latest.set_count(),
        })
    }
}
