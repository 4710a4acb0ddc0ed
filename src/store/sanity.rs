use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

use crate::config::settings::SanityConfig;
use crate::models::exercise::CatalogExercise;
use crate::models::workout::{WorkoutDocument, WorkoutRecord};
use crate::store::{ContentStore, StoreError};

const EXERCISES_QUERY: &str = r#"*[_type == "exercise"] | order(name asc){
  _id,
  name,
  description,
  difficulty,
  "imageUrl": image.asset->url,
  videoUrl,
  isActive
}"#;

const WORKOUTS_QUERY: &str = r#"*[_type == "workout" && userId == $userId] | order(date desc){
  _id,
  date,
  duration,
  userId,
  exercises[]{
    "exercise": exercise->{_id, name, "imageUrl": image.asset->url},
    "sets": sets[]{reps, weight, weightUnit}
  }
}"#;

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct MutationResult {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutationResult>,
}

/// Client for a Sanity dataset over its HTTP API
pub struct SanityStore {
    client: Client,
    config: SanityConfig,
}

impl SanityStore {
    pub fn new(config: SanityConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("neura_fit_tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn host(&self, read: bool) -> String {
        // Writes must never go through the CDN
        let api = if read && self.config.use_cdn { "apicdn" } else { "api" };
        format!("https://{}.{}.sanity.io", self.config.project_id, api)
    }

    pub fn query_url(&self) -> String {
        format!(
            "{}/v{}/data/query/{}",
            self.host(true),
            self.config.api_version,
            self.config.dataset
        )
    }

    pub fn mutate_url(&self) -> String {
        format!(
            "{}/v{}/data/mutate/{}",
            self.host(false),
            self.config.api_version,
            self.config.dataset
        )
    }

    async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, Value)],
    ) -> Result<T, StoreError> {
        // GROQ parameters travel as JSON-encoded `$name` query args
        let mut pairs: Vec<(String, String)> = vec![("query".to_string(), groq.to_string())];
        for (name, value) in params {
            pairs.push((format!("${}", name), value.to_string()));
        }

        let mut request = self.client.get(self.query_url()).query(&pairs);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let body = Self::checked_body(response).await?;
        decode_query_response(&body)
    }

    async fn query_list<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, Value)],
    ) -> Result<Vec<T>, StoreError> {
        let items: Vec<Value> = self.query(groq, params).await?;
        Ok(decode_each(items))
    }

    async fn mutate(&self, mutations: Value) -> Result<MutateResponse, StoreError> {
        let token = self.config.token.as_ref().ok_or(StoreError::ReadOnly)?;

        let response = self
            .client
            .post(self.mutate_url())
            .query(&[("returnIds", "true")])
            .bearer_auth(token)
            .json(&json!({ "mutations": mutations }))
            .send()
            .await?;

        let body = Self::checked_body(response).await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn checked_body(response: Response) -> Result<String, StoreError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = error_message(&body);
            log::warn!("Sanity request failed ({}): {}", status, message);
            return Err(StoreError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ContentStore for SanityStore {
    fn name(&self) -> &'static str {
        "sanity"
    }

    async fn list_exercises(&self) -> Result<Vec<CatalogExercise>, StoreError> {
        let exercises: Vec<CatalogExercise> = self.query_list(EXERCISES_QUERY, &[]).await?;
        log::info!("Fetched {} exercises from Sanity", exercises.len());
        Ok(exercises)
    }

    async fn list_workouts(&self, user_id: &str) -> Result<Vec<WorkoutRecord>, StoreError> {
        let workouts: Vec<WorkoutRecord> = self
            .query_list(WORKOUTS_QUERY, &[("userId", Value::String(user_id.to_string()))])
            .await?;
        log::info!("Fetched {} workouts for {}", workouts.len(), user_id);
        Ok(workouts)
    }

    async fn create_workout(&self, document: &WorkoutDocument) -> Result<String, StoreError> {
        let doc = serde_json::to_value(document).map_err(|e| StoreError::Decode(e.to_string()))?;
        let response = self.mutate(json!([{ "create": doc }])).await?;
        let id = response
            .results
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| StoreError::Decode("create returned no document id".to_string()))?;
        log::info!("Created workout {}", id);
        Ok(id)
    }

    async fn delete_workout(&self, workout_id: &str) -> Result<(), StoreError> {
        let response = self.mutate(json!([{ "delete": { "id": workout_id } }])).await?;
        if response.results.is_empty() {
            return Err(StoreError::NotFound(workout_id.to_string()));
        }
        log::info!("Deleted workout {}", workout_id);
        Ok(())
    }
}

pub(crate) fn decode_query_response<T: DeserializeOwned>(body: &str) -> Result<T, StoreError> {
    let response: QueryResponse<T> =
        serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;
    Ok(response.result)
}

/// Decode list items one by one. A malformed document is logged and skipped
/// so it can't hide the rest of the list.
pub(crate) fn decode_each<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| {
            let id = item.get("_id").and_then(Value::as_str).unwrap_or("?").to_string();
            match serde_json::from_value(item) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    log::warn!("Skipping document {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

/// Pull a human readable message out of an error body. Sanity uses a few
/// different shapes depending on the endpoint.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    let candidates = [
        value.pointer("/error/description"),
        value.get("message"),
        value.pointer("/error/message"),
        value.get("error"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
