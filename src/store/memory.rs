use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::models::exercise::CatalogExercise;
use crate::models::workout::{
    ExerciseSummary, RecordedExercise, RecordedSet, WorkoutDocument, WorkoutRecord,
};
use crate::store::{ContentStore, StoreError};

/// In-process store for tests. `set_failing(true)` makes every call error.
#[derive(Default)]
pub struct MemoryStore {
    exercises: Mutex<Vec<CatalogExercise>>,
    workouts: Mutex<Vec<(String, WorkoutDocument)>>,
    failing: AtomicBool,
    next_id: AtomicUsize,
    pub calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with_exercises(exercises: Vec<CatalogExercise>) -> Self {
        Self {
            exercises: Mutex::new(exercises),
            ..Default::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Vec<WorkoutDocument> {
        self.workouts.lock().unwrap().iter().map(|(_, doc)| doc.clone()).collect()
    }

    fn check(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_exercises(&self) -> Result<Vec<CatalogExercise>, StoreError> {
        self.check()?;
        Ok(self.exercises.lock().unwrap().clone())
    }

    async fn list_workouts(&self, user_id: &str) -> Result<Vec<WorkoutRecord>, StoreError> {
        self.check()?;
        let catalog = self.exercises.lock().unwrap().clone();
        let mut records: Vec<WorkoutRecord> = self
            .workouts
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, doc)| doc.user_id == user_id)
            .map(|(id, doc)| WorkoutRecord {
                id: id.clone(),
                date: doc.date,
                duration: doc.duration,
                user_id: Some(doc.user_id.clone()),
                exercises: doc
                    .exercises
                    .iter()
                    .map(|entry| RecordedExercise {
                        exercise: catalog
                            .iter()
                            .find(|c| c.id == entry.exercise.target)
                            .map(|c| ExerciseSummary {
                                id: c.id.clone(),
                                name: c.name.clone(),
                                image_url: c.image_url.clone(),
                            }),
                        sets: entry
                            .sets
                            .iter()
                            .map(|s| RecordedSet {
                                reps: s.reps,
                                weight: s.weight as f64,
                                weight_unit: s.weight_unit,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn create_workout(&self, document: &WorkoutDocument) -> Result<String, StoreError> {
        self.check()?;
        let id = format!("workout-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.workouts.lock().unwrap().push((id.clone(), document.clone()));
        Ok(id)
    }

    async fn delete_workout(&self, workout_id: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut workouts = self.workouts.lock().unwrap();
        let before = workouts.len();
        workouts.retain(|(id, _)| id != workout_id);
        if workouts.len() == before {
            return Err(StoreError::NotFound(workout_id.to_string()));
        }
        Ok(())
    }
}
