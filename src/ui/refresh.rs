use crate::auth::identity::Identity;
use crate::history::stats::{LastWorkoutSummary, WorkoutStats};
use crate::models::exercise::CatalogExercise;
use crate::models::workout::WorkoutRecord;
use crate::store::{ContentStore, StoreError};

/// Result of refreshing dashboard data. `None` means that part failed to
/// load and the previous copy should be kept.
#[derive(Debug, Default)]
pub struct RefreshData {
    pub exercises: Option<Vec<CatalogExercise>>,
    pub history: Option<Vec<WorkoutRecord>>,
    pub errors: Vec<String>,
}

/// Summary numbers shown on the dashboard
#[derive(Debug, Default, Clone)]
pub struct HistorySummary {
    pub stats: WorkoutStats,
    pub last_workout: Option<LastWorkoutSummary>,
}

impl HistorySummary {
    pub fn from_records(records: &[WorkoutRecord]) -> Self {
        Self {
            stats: WorkoutStats::from_records(records),
            last_workout: LastWorkoutSummary::from_records(records),
        }
    }
}

/// Workouts for the signed-in user; nobody signed in means no history
pub async fn load_history(
    store: &dyn ContentStore,
    identity: Option<&Identity>,
) -> Result<Vec<WorkoutRecord>, StoreError> {
    match identity {
        Some(identity) => store.list_workouts(&identity.user_id).await,
        None => Ok(Vec::new()),
    }
}

/// Reload catalog and history. A failing half doesn't stop the other one.
pub async fn refresh_all_data(store: &dyn ContentStore, identity: Option<&Identity>) -> RefreshData {
    let mut data = RefreshData::default();

    match store.list_exercises().await {
        Ok(exercises) => data.exercises = Some(exercises),
        Err(e) => {
            log::error!("Failed to load exercises: {}", e);
            data.errors.push(format!("Failed to load exercises: {}", e));
        }
    }

    match load_history(store, identity).await {
        Ok(history) => data.history = Some(history),
        Err(e) => {
            log::error!("Failed to load workout history: {}", e);
            data.errors.push(format!("Failed to load workout history: {}", e));
        }
    }

    data
}
