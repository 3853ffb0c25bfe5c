//! MacroChef client implementation.

use std::time::Duration;

use macrochef_core::{sanitize_json, JobRecord, JobState, OutputFormat, RecipeError, RecipeRequest, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::stream::JobStream;

/// Longest single long-poll the node will honour.
const MAX_WAIT_MS: u64 = 30_000;

/// Client for interacting with a MacroChef node.
#[derive(Debug, Clone)]
pub struct MacroChefClient {
    /// Base URL of the node.
    base_url: String,

    /// HTTP client.
    http_client: reqwest::Client,
}

/// Response from submitting a recipe job.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    op_id: Uuid,
}

/// Error body returned by the node.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    kind: String,
    field: Option<String>,
    capacity: Option<usize>,
}

impl MacroChefClient {
    /// Connect to a node, checking that it answers its health endpoint.
    pub async fn connect(url: &str) -> Result<Self> {
        let base_url = url.trim_end_matches('/').to_string();
        let http_client = reqwest::Client::new();

        let health_url = format!("{}/health", base_url);
        http_client
            .get(&health_url)
            .send()
            .await
            .map_err(|e| RecipeError::Connection(e.to_string()))?
            .error_for_status()
            .map_err(|e| RecipeError::Connection(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Base URL of the node this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a recipe request and return its operation id.
    pub async fn submit(&self, request: &RecipeRequest) -> Result<Uuid> {
        let url = format!("{}/api/v1/recipes", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&request.to_params())
            .send()
            .await
            .map_err(|e| RecipeError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| RecipeError::Serialization(e.to_string()))?;
        tracing::debug!(op_id = %submitted.op_id, "Submitted recipe job");
        Ok(submitted.op_id)
    }

    /// Submit a recipe request and follow its state changes.
    pub async fn submit_and_watch(&self, request: &RecipeRequest) -> Result<JobStream> {
        let op_id = self.submit(request).await?;
        Ok(self.watch(op_id))
    }

    /// Follow the state changes of an existing job.
    pub fn watch(&self, op_id: Uuid) -> JobStream {
        JobStream::spawn(self.clone(), op_id)
    }

    /// Fetch the current state of a job. `None` if the node does not know
    /// the id or the record has expired.
    pub async fn get_job(&self, op_id: Uuid) -> Result<Option<JobRecord>> {
        self.fetch(op_id, None).await
    }

    /// Block until the job is terminal or `timeout` elapses.
    pub async fn wait_for_result(&self, op_id: Uuid, timeout: Duration) -> Result<JobRecord> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let wait_ms = (remaining.as_millis() as u64).min(MAX_WAIT_MS);

            let record = self.fetch(op_id, Some(wait_ms)).await?.ok_or_else(|| {
                RecipeError::NotFound {
                    resource_type: "Recipe job".to_string(),
                    id: op_id.to_string(),
                }
            })?;

            if record.state.is_terminal() {
                return Ok(record);
            }
            if remaining.is_zero() {
                return Err(RecipeError::Timeout {
                    duration_ms: timeout.as_millis() as u64,
                    message: format!("job {} still pending", op_id),
                });
            }
        }
    }

    /// Wait for a job and parse its payload as JSON in the given format.
    pub async fn wait_for_recipes(
        &self,
        op_id: Uuid,
        format: OutputFormat,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        let record = self.wait_for_result(op_id, timeout).await?;
        match record.state {
            JobState::Completed { payload } => sanitize_json(&payload, format),
            JobState::Failed { error } => Err(RecipeError::Internal(format!(
                "job {} failed ({}): {}",
                op_id, error.kind, error.message
            ))),
            JobState::Pending => Err(RecipeError::Internal(format!("job {} still pending", op_id))),
        }
    }

    /// Long-poll a job record, waiting up to `wait_ms` on the node.
    pub(crate) async fn fetch(&self, op_id: Uuid, wait_ms: Option<u64>) -> Result<Option<JobRecord>> {
        let mut url = format!("{}/api/v1/recipes/{}", self.base_url, op_id);
        if let Some(wait_ms) = wait_ms.filter(|ms| *ms > 0) {
            url.push_str(&format!("?wait_ms={}", wait_ms));
        }

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| RecipeError::Connection(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| RecipeError::Serialization(e.to_string()))
    }
}

/// Turn a non-success node response back into a typed error.
async fn error_from_response(response: reqwest::Response) -> RecipeError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if body.kind == "validation_error" => RecipeError::Validation {
            field: body.field.unwrap_or_default(),
            message: body.error,
        },
        Ok(body) if body.kind == "queue_full" => RecipeError::QueueFull {
            capacity: body.capacity.unwrap_or_default(),
        },
        Ok(body) => RecipeError::Upstream {
            status,
            message: format!("{}: {}", body.kind, body.error),
        },
        Err(_) => RecipeError::Upstream {
            status,
            message: text,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const KNOWN: &str = "6f2c1b7e-0d64-4a43-9a57-3a4e5f0d9c11";

    fn record(op_id: Uuid, state: JobState) -> Value {
        let now = "2026-01-01T00:00:00Z";
        let mut value = serde_json::to_value(state).unwrap();
        value["op_id"] = json!(op_id);
        value["created_at"] = json!(now);
        value["updated_at"] = json!(now);
        value["expires_at"] = json!("2026-01-01T00:05:00Z");
        value
    }

    async fn mock_node() -> String {
        let app = Router::new()
            .route("/health", get(|| async { Json(json!({"status": "healthy"})) }))
            .route(
                "/api/v1/recipes",
                post(|Json(body): Json<HashMap<String, String>>| async move {
                    if body.get("calories").map(String::as_str) == Some("9999") {
                        return (
                            StatusCode::SERVICE_UNAVAILABLE,
                            Json(json!({
                                "error": "job queue is full (capacity 256)",
                                "kind": "queue_full",
                                "capacity": 256
                            })),
                        );
                    }
                    if body.get("calories").map(String::as_str) == Some("0") {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "error": "invalid calories",
                                "kind": "validation_error",
                                "field": "calories"
                            })),
                        );
                    }
                    (
                        StatusCode::ACCEPTED,
                        Json(json!({"op_id": KNOWN, "status": "pending", "message": "ok"})),
                    )
                }),
            )
            .route(
                "/api/v1/recipes/:op_id",
                get(
                    |Path(op_id): Path<Uuid>, Query(q): Query<HashMap<String, u64>>| async move {
                        if op_id.to_string() != KNOWN {
                            return (StatusCode::NOT_FOUND, Json(json!({"error": "nope"})));
                        }
                        let state = if q.get("wait_ms").copied().unwrap_or(0) > 0 {
                            JobState::Completed {
                                payload: "[\"Risotto\"]".to_string(),
                            }
                        } else {
                            JobState::Pending
                        };
                        (StatusCode::OK, Json(record(op_id, state)))
                    },
                ),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request(calories: u32) -> RecipeRequest {
        RecipeRequest::builder("u-1")
            .macros(calories, 45, 60, 18)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_connect_fails_without_node() {
        let err = MacroChefClient::connect("http://127.0.0.1:1").await.unwrap_err();
        assert_eq!(err.kind(), "connection_error");
    }

    #[tokio::test]
    async fn test_submit_returns_op_id() {
        let client = MacroChefClient::connect(&mock_node().await).await.unwrap();
        let op_id = client.submit(&request(600)).await.unwrap();
        assert_eq!(op_id.to_string(), KNOWN);
    }

    #[tokio::test]
    async fn test_submit_validation_error() {
        let client = MacroChefClient::connect(&mock_node().await).await.unwrap();
        let err = client.submit(&request(0)).await.unwrap_err();
        assert_eq!(
            err,
            RecipeError::Validation {
                field: "calories".to_string(),
                message: "invalid calories".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_submit_full_queue_is_typed() {
        let client = MacroChefClient::connect(&mock_node().await).await.unwrap();
        let err = client.submit(&request(9999)).await.unwrap_err();
        assert_eq!(err, RecipeError::QueueFull { capacity: 256 });
    }

    #[tokio::test]
    async fn test_get_job_unknown_is_none() {
        let client = MacroChefClient::connect(&mock_node().await).await.unwrap();
        assert!(client.get_job(Uuid::new_v4()).await.unwrap().is_none());

        let pending = client.get_job(KNOWN.parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(pending.state, JobState::Pending);
    }

    #[tokio::test]
    async fn test_wait_for_recipes_parses_payload() {
        let client = MacroChefClient::connect(&mock_node().await).await.unwrap();
        let recipes = client
            .wait_for_recipes(
                KNOWN.parse().unwrap(),
                OutputFormat::NamesOnly,
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(recipes, json!(["Risotto"]));
    }

    #[tokio::test]
    async fn test_wait_for_result() {
        let client = MacroChefClient::connect(&mock_node().await).await.unwrap();
        let record = client
            .wait_for_result(KNOWN.parse().unwrap(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(
            record.state,
            JobState::Completed {
                payload: "[\"Risotto\"]".to_string()
            }
        );
    }
}
