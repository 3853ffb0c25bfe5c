//! Recipe job endpoints.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use macrochef_core::request::{params_from_json, parse_query_string};
use macrochef_core::{JobRecord, RecipeError, RecipeRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

/// Longest a retrieval call may block waiting for completion.
pub const MAX_WAIT_MS: u64 = 30_000;

/// Response after submitting a recipe job.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRecipeResponse {
    pub op_id: Uuid,
    pub status: String,
    pub message: String,
}

/// Error body for every non-success response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Queue size, on `queue_full` rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

/// Query parameters for retrieval.
#[derive(Debug, Deserialize)]
pub struct WaitParams {
    /// Block up to this many milliseconds for a terminal state.
    pub wait_ms: Option<u64>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: &RecipeError) -> ApiError {
    let status = match err {
        RecipeError::Validation { .. } => StatusCode::BAD_REQUEST,
        RecipeError::QueueFull { .. } => StatusCode::SERVICE_UNAVAILABLE,
        RecipeError::NotFound { .. } => StatusCode::NOT_FOUND,
        RecipeError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let field = match err {
        RecipeError::Validation { field, .. } => Some(field.clone()),
        _ => None,
    };
    let capacity = match err {
        RecipeError::QueueFull { capacity } => Some(*capacity),
        _ => None,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            kind: err.kind().to_string(),
            field,
            capacity,
        }),
    )
}

/// Validate flat parameters and hand them to the correlator.
async fn submit_params(
    state: &AppState,
    params: HashMap<String, String>,
) -> Result<(StatusCode, Json<SubmitRecipeResponse>), ApiError> {
    let request = RecipeRequest::from_params(&params).map_err(|e| api_error(&e))?;
    let op_id = state
        .correlator
        .submit(request)
        .await
        .map_err(|e| api_error(&e))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitRecipeResponse {
            op_id,
            status: "pending".to_string(),
            message: "Recipe generation started".to_string(),
        }),
    ))
}

/// Submit a recipe job from a JSON object of flat key/values.
pub async fn submit_recipe(
    State(state): State<AppState>,
    body: std::result::Result<Json<serde_json::Map<String, serde_json::Value>>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitRecipeResponse>), ApiError> {
    let Json(body) = body.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("expected a JSON object of parameters: {}", rejection.body_text()),
                kind: "validation_error".to_string(),
                field: None,
                capacity: None,
            }),
        )
    })?;
    let params = params_from_json(&body).map_err(|e| api_error(&e))?;
    submit_params(&state, params).await
}

/// Submit a recipe job from a `{key=value, key=value}` text body.
pub async fn submit_recipe_query(
    State(state): State<AppState>,
    body: String,
) -> Result<(StatusCode, Json<SubmitRecipeResponse>), ApiError> {
    submit_params(&state, parse_query_string(&body)).await
}

/// Get the state of a recipe job, optionally waiting for it to finish.
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(op_id): Path<Uuid>,
    Query(params): Query<WaitParams>,
) -> Result<Json<JobRecord>, ApiError> {
    let wait = params.wait_ms.unwrap_or(0).min(MAX_WAIT_MS);
    // Subscribe before reading so a completion between the two is not missed.
    let subscription = (wait > 0).then(|| state.results.subscribe(op_id));

    let record = state
        .correlator
        .status(op_id)
        .await
        .map_err(|e| api_error(&e))?
        .ok_or_else(|| not_found(op_id))?;

    match subscription {
        Some(subscription) if !record.state.is_terminal() => {
            match subscription.wait(Duration::from_millis(wait)).await {
                Some(done) => Ok(Json(done)),
                // A missed notification must not hide a result already in the store.
                None => {
                    let latest = state
                        .correlator
                        .status(op_id)
                        .await
                        .map_err(|e| api_error(&e))?
                        .ok_or_else(|| not_found(op_id))?;
                    Ok(Json(latest))
                }
            }
        }
        _ => Ok(Json(record)),
    }
}

fn not_found(op_id: Uuid) -> ApiError {
    api_error(&RecipeError::NotFound {
        resource_type: "Recipe job".to_string(),
        id: op_id.to_string(),
    })
}
