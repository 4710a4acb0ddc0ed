use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use std::collections::HashMap;

use crate::models::exercise::{CatalogExercise, Difficulty};
use crate::models::workout::{
    DocumentExercise, ExerciseSummary, RecordedExercise, RecordedSet, WorkoutDocument, WorkoutRecord,
};
use crate::store::{ContentStore, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct ExerciseRow {
    id: String,
    name: String,
    description: String,
    difficulty: String,
    image_url: Option<String>,
    video_url: Option<String>,
    is_active: bool,
}

impl From<ExerciseRow> for CatalogExercise {
    fn from(row: ExerciseRow) -> Self {
        CatalogExercise {
            id: row.id,
            name: row.name,
            description: row.description,
            difficulty: Difficulty::from_str_lossy(&row.difficulty),
            image_url: row.image_url,
            video_url: row.video_url,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WorkoutRow {
    id: String,
    user_id: String,
    date: DateTime<Utc>,
    duration: i64,
    exercises: Json<Vec<DocumentExercise>>,
}

/// Self-hosted content store on Postgres. Workouts keep their exercise list
/// as JSONB in the same shape the document store uses.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    pub async fn create_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                difficulty TEXT NOT NULL DEFAULT 'beginner',
                image_url TEXT,
                video_url TEXT,
                is_active BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TIMESTAMP WITH TIME ZONE NOT NULL,
                duration BIGINT NOT NULL,
                exercises JSONB NOT NULL DEFAULT '[]'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS workouts_user_date ON workouts (user_id, date DESC)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert or replace a catalog exercise, used when seeding the catalog
    pub async fn upsert_exercise(&self, exercise: &CatalogExercise) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO exercises (id, name, description, difficulty, image_url, video_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                difficulty = EXCLUDED.difficulty,
                image_url = EXCLUDED.image_url,
                video_url = EXCLUDED.video_url,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(&exercise.id)
        .bind(&exercise.name)
        .bind(&exercise.description)
        .bind(exercise.difficulty.as_str())
        .bind(&exercise.image_url)
        .bind(&exercise.video_url)
        .bind(exercise.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn exercise_summaries(&self, ids: Vec<String>) -> Result<HashMap<String, ExerciseSummary>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, String, Option<String>)> =
            sqlx::query_as("SELECT id, name, image_url FROM exercises WHERE id = ANY($1)")
                .bind(&ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, image_url)| {
                (id.clone(), ExerciseSummary { id, name, image_url })
            })
            .collect())
    }
}

/// Turn stored JSONB entries back into history records, resolving exercise
/// references against the catalog. Dangling references resolve to `None`.
fn resolve_record(row: WorkoutRow, catalog: &HashMap<String, ExerciseSummary>) -> WorkoutRecord {
    let exercises = row
        .exercises
        .0
        .into_iter()
        .map(|entry| RecordedExercise {
            exercise: catalog.get(&entry.exercise.target).cloned(),
            sets: entry
                .sets
                .into_iter()
                .map(|set| RecordedSet {
                    reps: set.reps,
                    weight: set.weight as f64,
                    weight_unit: set.weight_unit,
                })
                .collect(),
        })
        .collect();

    WorkoutRecord {
        id: row.id,
        date: row.date,
        duration: row.duration,
        user_id: Some(row.user_id),
        exercises,
    }
}

#[async_trait]
impl ContentStore for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn list_exercises(&self) -> Result<Vec<CatalogExercise>, StoreError> {
        let rows = sqlx::query_as::<_, ExerciseRow>(
            "SELECT id, name, description, difficulty, image_url, video_url, is_active FROM exercises ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CatalogExercise::from).collect())
    }

    async fn list_workouts(&self, user_id: &str) -> Result<Vec<WorkoutRecord>, StoreError> {
        let rows = sqlx::query_as::<_, WorkoutRow>(
            "SELECT id, user_id, date, duration, exercises FROM workouts WHERE user_id = $1 ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut ids: Vec<String> = rows
            .iter()
            .flat_map(|row| row.exercises.0.iter().map(|e| e.exercise.target.clone()))
            .collect();
        ids.sort();
        ids.dedup();

        let catalog = self.exercise_summaries(ids).await?;
        Ok(rows.into_iter().map(|row| resolve_record(row, &catalog)).collect())
    }

    async fn create_workout(&self, document: &WorkoutDocument) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO workouts (id, user_id, date, duration, exercises) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&id)
        .bind(&document.user_id)
        .bind(document.date)
        .bind(document.duration)
        .bind(Json(document.exercises.clone()))
        .execute(&self.pool)
        .await?;
        log::info!("Inserted workout {} for {}", id, document.user_id);
        Ok(id)
    }

    async fn delete_workout(&self, workout_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = $1")
            .bind(workout_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(workout_id.to_string()));
        }
        Ok(())
    }
}
