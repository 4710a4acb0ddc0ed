use chrono::Local;

use crate::auth::identity::Identity;
use crate::models::exercise::CatalogExercise;
use crate::models::session::{ExerciseId, NewExercise};
use crate::store::ContentStore;
use crate::tracker::completion::{self, CompletionError};
use crate::tracker::session::SessionTracker;

/// Command execution context containing app state references
pub struct CommandContext<'a> {
    pub store: &'a dyn ContentStore,
    pub tracker: &'a mut SessionTracker,
    pub identity: Option<&'a Identity>,
    pub logs: &'a mut Vec<String>,
}

/// Blocking message the UI shows until dismissed
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

/// Result of executing a command that may require UI refresh
#[derive(Debug)]
pub struct CommandResult {
    pub should_refresh: bool,
    pub notice: Option<Notice>,
}

impl CommandResult {
    pub fn success_with_refresh() -> Self {
        Self {
            should_refresh: true,
            notice: None,
        }
    }

    pub fn success_no_refresh() -> Self {
        Self {
            should_refresh: false,
            notice: None,
        }
    }

    pub fn failed(title: &str, body: impl Into<String>) -> Self {
        Self {
            should_refresh: false,
            notice: Some(Notice {
                title: title.to_string(),
                body: body.into(),
            }),
        }
    }
}

/// Lines kept in the in-app log pane; older ones are dropped
pub const MAX_LOG_LINES: usize = 500;

pub fn push_log(logs: &mut Vec<String>, message: impl AsRef<str>) {
    logs.push(format!("[{}] {}", Local::now().format("%H:%M:%S"), message.as_ref()));
    if logs.len() > MAX_LOG_LINES {
        let excess = logs.len() - MAX_LOG_LINES;
        logs.drain(..excess);
    }
}

/// Copy a catalog exercise into the running workout
pub fn execute_add_exercise(ctx: &mut CommandContext<'_>, exercise: &CatalogExercise) -> ExerciseId {
    let id = ctx
        .tracker
        .add_exercise(NewExercise::new(exercise.name.clone(), exercise.id.clone()));
    push_log(ctx.logs, format!("Added {} to workout", exercise.name));
    id
}

/// Save the workout, clearing it only when the store confirms
pub async fn execute_complete_workout(ctx: &mut CommandContext<'_>) -> CommandResult {
    let completed_sets = ctx.tracker.completed_set_count();

    match completion::complete_workout(ctx.tracker, ctx.store, ctx.identity).await {
        Ok(id) => {
            push_log(ctx.logs, format!("Saved workout {} ({} sets)", id, completed_sets));
            CommandResult::success_with_refresh()
        }
        Err(CompletionError::MissingIdentity) => {
            push_log(ctx.logs, "Save refused: not signed in");
            CommandResult::failed(
                "Not signed in",
                "Sign in with `neura_fit_tracker login --user-id <id>` or set FIT_USER_ID, then try again.",
            )
        }
        Err(e) => {
            push_log(ctx.logs, format!("Failed to save workout: {}", e));
            CommandResult::failed("Save failed", format!("{}\n\nYour workout is still here. Please try again.", e))
        }
    }
}

/// Throw the running workout away
pub fn execute_end_workout(ctx: &mut CommandContext<'_>) -> CommandResult {
    let exercises = ctx.tracker.exercises().len();
    ctx.tracker.end_workout();
    push_log(ctx.logs, format!("Workout ended without saving ({} exercises discarded)", exercises));
    CommandResult::success_no_refresh()
}

pub async fn execute_delete_workout(ctx: &mut CommandContext<'_>, workout_id: &str) -> CommandResult {
    match ctx.store.delete_workout(workout_id).await {
        Ok(()) => {
            push_log(ctx.logs, format!("Deleted workout {}", workout_id));
            CommandResult::success_with_refresh()
        }
        Err(e) => {
            log::error!("Failed to delete workout {}: {}", workout_id, e);
            push_log(ctx.logs, format!("Failed to delete workout {}: {}", workout_id, e));
            CommandResult::failed("Delete failed", e.to_string())
        }
    }
}
