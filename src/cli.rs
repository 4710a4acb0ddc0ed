use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::Path;

use crate::auth::identity::{self, Identity};
use crate::config::settings::UserSettings;
use crate::history::format::{date_label, format_duration, format_volume};
use crate::history::stats::{LastWorkoutSummary, WorkoutStats};
use crate::models::exercise::{self, CatalogExercise};
use crate::models::workout::WorkoutRecord;
use crate::store::ContentStore;
use crate::store::postgres::PgStore;
use crate::ui::refresh;

const SIGN_IN_HINT: &str = "Not signed in. Run `neura_fit_tracker login --user-id <id>` or set FIT_USER_ID.";

pub fn login(settings: &UserSettings, user_id: String, name: Option<String>) -> Result<()> {
    let user_id = user_id.trim().to_string();
    if user_id.is_empty() {
        anyhow::bail!("user id must not be empty");
    }
    let identity = Identity {
        user_id,
        display_name: name.filter(|n| !n.trim().is_empty()),
    };
    identity::save_identity(&settings.data_dir, &identity)?;
    println!("✅ Signed in as {} ({})", identity.greeting_name(), identity.user_id);
    if settings.user_id.is_some() {
        println!("Note: FIT_USER_ID is set and takes precedence over this sign-in.");
    }
    Ok(())
}

pub fn logout(settings: &UserSettings) -> Result<()> {
    if identity::sign_out(&settings.data_dir)? {
        println!("Signed out.");
    } else {
        println!("No stored sign-in to remove.");
    }
    Ok(())
}

pub fn exercise_lines(exercises: &[CatalogExercise], query: &str, include_inactive: bool) -> Vec<String> {
    let pool = if include_inactive {
        exercises.to_vec()
    } else {
        exercise::active_only(exercises.to_vec())
    };
    exercise::search(&pool, query)
        .into_iter()
        .map(|e| {
            let marker = if e.is_active { "" } else { "  (inactive)" };
            let video = e.video_url.as_deref().map(|url| format!("  video: {}", url)).unwrap_or_default();
            format!("{:<24} {:<30} {}{}{}", e.id, e.name, e.difficulty, marker, video)
        })
        .collect()
}

pub async fn list_exercises(store: &dyn ContentStore, query: &str, include_inactive: bool) -> Result<()> {
    let exercises = store.list_exercises().await?;
    let lines = exercise_lines(&exercises, query, include_inactive);
    if lines.is_empty() {
        println!("No exercises found.");
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

pub fn history_lines(records: &[WorkoutRecord], limit: usize) -> Vec<String> {
    let today = Local::now().date_naive();
    let mut sorted: Vec<&WorkoutRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
        .into_iter()
        .take(limit)
        .map(|r| {
            let local = r.date.with_timezone(&Local);
            format!(
                "{:<12} {}  {:>8}  {} exercises, {} sets  [{}]",
                date_label(local.date_naive(), today),
                local.format("%H:%M"),
                format_duration(r.duration),
                r.exercise_count(),
                r.set_count(),
                r.id
            )
        })
        .collect()
}

pub async fn show_history(store: &dyn ContentStore, identity: Option<&Identity>, limit: usize) -> Result<()> {
    if identity.is_none() {
        println!("{}", SIGN_IN_HINT);
        return Ok(());
    }
    let records = refresh::load_history(store, identity).await?;
    if records.is_empty() {
        println!("No workouts yet.");
    }
    for line in history_lines(&records, limit) {
        println!("{}", line);
    }
    Ok(())
}

pub fn stats_lines(records: &[WorkoutRecord]) -> Vec<String> {
    let stats = WorkoutStats::from_records(records);
    let mut lines = vec![
        format!("Total workouts:   {}", stats.total_workouts),
        format!("Total time:       {}", format_duration(stats.total_time)),
        format!("Average duration: {}", format_duration(stats.average_duration)),
        format!("Days active:      {}", stats.days_active),
        format!("Total sets:       {}", stats.total_sets),
        format!("Total volume:     {}", format_volume(stats.total_volume)),
    ];
    if let Some(last) = LastWorkoutSummary::from_records(records) {
        lines.push(String::new());
        lines.push(format!(
            "Last workout: {} ({}, {} exercises, {} sets)",
            last.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            format_duration(last.duration),
            last.exercise_count,
            last.set_count
        ));
    }
    lines
}

pub async fn show_stats(store: &dyn ContentStore, identity: Option<&Identity>) -> Result<()> {
    if identity.is_none() {
        println!("{}", SIGN_IN_HINT);
        return Ok(());
    }
    let records = refresh::load_history(store, identity).await?;
    for line in stats_lines(&records) {
        println!("{}", line);
    }
    Ok(())
}

pub async fn delete_workout(store: &dyn ContentStore, workout_id: &str) -> Result<()> {
    store.delete_workout(workout_id).await?;
    println!("Deleted workout {}", workout_id);
    Ok(())
}

/// Parse a JSON array of catalog documents
pub fn read_seed_file(path: &Path) -> Result<Vec<CatalogExercise>> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let exercises: Vec<CatalogExercise> =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    Ok(exercises)
}

pub async fn seed_exercises(store: &PgStore, path: &Path) -> Result<()> {
    let exercises = read_seed_file(path)?;
    for exercise in &exercises {
        store.upsert_exercise(exercise).await?;
        log::debug!("Seeded exercise {}", exercise.id);
    }
    println!("Seeded {} exercises from {}", exercises.len(), path.display());
    Ok(())
}
