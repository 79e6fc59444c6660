use crate::dtos::BatchRequest;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;
use service_core::models::BatchResult;
use validator::Validate;

/// Per-item results; one failing id never aborts the others.
#[tracing::instrument(skip(state, request), fields(count = request.file_ids.len()))]
pub async fn move_files(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<Vec<BatchResult>>, AppError> {
    request.validate()?;
    let results = state
        .drive
        .move_files(&request.file_ids, &request.target_folder_id)
        .await?;
    Ok(Json(results))
}

#[tracing::instrument(skip(state, request), fields(count = request.file_ids.len()))]
pub async fn copy_files(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<Vec<BatchResult>>, AppError> {
    request.validate()?;
    let results = state
        .drive
        .copy_files(&request.file_ids, &request.target_folder_id)
        .await?;
    Ok(Json(results))
}
