pub mod postgres;
pub mod sanity;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::settings::StoreSettings;
use crate::models::exercise::CatalogExercise;
use crate::models::workout::{WorkoutDocument, WorkoutRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to content store failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("content store returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unexpected response from content store: {0}")]
    Decode(String),
    #[error("writing to the content store needs an API token")]
    ReadOnly,
    #[error("no record with id {0}")]
    NotFound(String),
    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

/// Remote home of the exercise catalog and saved workouts
#[async_trait]
pub trait ContentStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Every catalog exercise, active or not
    async fn list_exercises(&self) -> Result<Vec<CatalogExercise>, StoreError>;

    /// A user's workouts, newest first, with exercise references resolved
    async fn list_workouts(&self, user_id: &str) -> Result<Vec<WorkoutRecord>, StoreError>;

    /// Persist a completed workout and return its id
    async fn create_workout(&self, document: &WorkoutDocument) -> Result<String, StoreError>;

    async fn delete_workout(&self, workout_id: &str) -> Result<(), StoreError>;
}

pub async fn connect(settings: &StoreSettings) -> anyhow::Result<Arc<dyn ContentStore>> {
    match settings {
        StoreSettings::Sanity(config) => {
            log::info!(
                "Using Sanity content store: project={} dataset={} cdn={}",
                config.project_id,
                config.dataset,
                config.use_cdn
            );
            Ok(Arc::new(sanity::SanityStore::new(config.clone())?))
        }
        StoreSettings::Postgres { database_url } => {
            log::info!("Using Postgres content store");
            Ok(Arc::new(postgres::PgStore::new(database_url).await?))
        }
    }
}
