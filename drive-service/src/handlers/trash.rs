use crate::services::TrashListing;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use service_core::models::{EmptyTrashSummary, ItemAck, TrashContents};

/// 200 with the trash contents, or 503 with `available: false` when no
/// trash query spelling worked.
pub async fn list_trash(State(state): State<AppState>) -> (StatusCode, Json<TrashContents>) {
    match state.drive.list_trash().await {
        TrashListing::Available(files) => (
            StatusCode::OK,
            Json(TrashContents {
                available: true,
                files,
            }),
        ),
        TrashListing::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(TrashContents {
                available: false,
                files: Vec::new(),
            }),
        ),
    }
}

pub async fn restore_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItemAck>, AppError> {
    state.drive.restore(&id).await?;
    Ok(Json(ItemAck { id, success: true }))
}

pub async fn permanent_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItemAck>, AppError> {
    state.drive.permanent_delete(&id).await?;
    Ok(Json(ItemAck { id, success: true }))
}

#[tracing::instrument(skip(state))]
pub async fn empty_trash(
    State(state): State<AppState>,
) -> Result<Json<EmptyTrashSummary>, AppError> {
    let results = state.drive.empty_trash().await?;
    let summary = EmptyTrashSummary::from_results(results);
    tracing::info!(
        deleted = summary.deleted,
        failed = summary.failed,
        "Trash emptied"
    );
    Ok(Json(summary))
}
