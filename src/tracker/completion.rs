use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use crate::auth::identity::Identity;
use crate::models::session::WorkoutSession;
use crate::models::workout::{
    DocumentExercise, DocumentSet, EXERCISE_ENTRY_TYPE, Reference, SET_ENTRY_TYPE, WORKOUT_TYPE,
    WeightUnit, WorkoutDocument,
};
use crate::store::{ContentStore, StoreError};
use crate::tracker::clock::Clock;
use crate::tracker::session::SessionTracker;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no signed-in user, the workout can't be saved")]
    MissingIdentity,
    #[error("failed to save workout: {0}")]
    Store(#[from] StoreError),
}

/// Random key for array members; document stores want a stable `_key` on
/// every object inside an array.
fn generate_key<R: Rng>(rng: &mut R) -> String {
    (0..12)
        .map(|_| {
            let idx = rng.gen_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + (idx - 10)) as char
            }
        })
        .collect()
}

/// Serialize a session into the document that gets stored.
///
/// Only completed sets are kept, and exercises left without any completed set
/// are dropped. Reps/weight text is parsed here, falling back to 0.
pub fn build_workout_document(
    session: &WorkoutSession,
    user_id: &str,
    captured_at: DateTime<Utc>,
    duration: i64,
) -> WorkoutDocument {
    let mut rng = rand::thread_rng();

    let exercises = session
        .exercises
        .iter()
        .filter(|exercise| exercise.completed_count() > 0)
        .filter_map(|exercise| {
            let Some(catalog_ref) = &exercise.catalog_ref else {
                log::warn!(
                    "Leaving out '{}' ({}): it has no catalog reference",
                    exercise.name,
                    exercise.id
                );
                return None;
            };

            let sets = exercise
                .completed_sets()
                .map(|set| DocumentSet {
                    key: generate_key(&mut rng),
                    kind: SET_ENTRY_TYPE.to_string(),
                    reps: set.reps.value(),
                    weight: set.weight.value(),
                    weight_unit: WeightUnit::Kg,
                })
                .collect();

            Some(DocumentExercise {
                key: generate_key(&mut rng),
                kind: EXERCISE_ENTRY_TYPE.to_string(),
                exercise: Reference::to(catalog_ref.clone()),
                sets,
            })
        })
        .collect();

    WorkoutDocument {
        kind: WORKOUT_TYPE.to_string(),
        date: captured_at,
        duration,
        user_id: user_id.to_string(),
        exercises,
    }
}

/// Save the running workout and reset the tracker.
///
/// The tracker is only cleared once the store has accepted the document; on
/// any failure the session stays as it was so the user can retry.
pub async fn complete_workout<C: Clock>(
    tracker: &mut SessionTracker<C>,
    store: &dyn ContentStore,
    identity: Option<&Identity>,
) -> Result<String, CompletionError> {
    let identity = identity.ok_or(CompletionError::MissingIdentity)?;

    let duration = tracker.elapsed_seconds();
    let document = build_workout_document(tracker.state(), &identity.user_id, tracker.now(), duration);
    log::info!(
        "Saving workout: {} exercises, {}s, store={}",
        document.exercises.len(),
        duration,
        store.name()
    );

    match store.create_workout(&document).await {
        Ok(id) => {
            tracker.clear_workout();
            Ok(id)
        }
        Err(e) => {
            log::error!("Failed to save workout: {}", e);
            Err(CompletionError::Store(e))
        }
    }
}
