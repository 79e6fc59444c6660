use crate::dtos::{CreateFolderRequest, ListFilesParams, RenameRequest, SearchParams};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use service_core::models::{
    CreatedFolder, FileEntry, FilePage, FolderInfo, FolderTreeNode, ItemAck, StorageQuota,
    UploadLimits,
};
use validator::Validate;

/// `GET /api/files`: always paginated.
#[tracing::instrument(skip(state))]
pub async fn list_files(
    State(state): State<AppState>,
    Query(params): Query<ListFilesParams>,
) -> Result<Json<FilePage>, AppError> {
    let options = params.list_options()?;
    let page = state
        .drive
        .list_files_page(params.parent_id.as_deref(), options)
        .await?;
    Ok(Json(page))
}

/// `GET /api/files/all`: the whole folder as one sorted array.
#[tracing::instrument(skip(state))]
pub async fn list_all_files(
    State(state): State<AppState>,
    Query(params): Query<ListFilesParams>,
) -> Result<Json<Vec<FileEntry>>, AppError> {
    let options = params.list_options()?;
    let files = state
        .drive
        .list_files(
            params.parent_id.as_deref(),
            options.sort_by,
            options.sort_order,
        )
        .await?;
    Ok(Json(files))
}

pub async fn folder_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FolderInfo>, AppError> {
    Ok(Json(state.drive.folder_info(&id).await?))
}

pub async fn folder_tree(
    State(state): State<AppState>,
) -> Result<Json<Vec<FolderTreeNode>>, AppError> {
    Ok(Json(state.drive.folder_tree().await?))
}

#[tracing::instrument(skip(state, request))]
pub async fn create_folder(
    State(state): State<AppState>,
    Json(request): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<CreatedFolder>), AppError> {
    request.validate()?;
    let folder = state
        .drive
        .create_folder(request.name.trim(), request.parent_id.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

#[tracing::instrument(skip(state, request))]
pub async fn rename_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<CreatedFolder>, AppError> {
    request.validate()?;
    Ok(Json(state.drive.rename(&id, request.name.trim()).await?))
}

/// Soft delete: the item goes to the trash.
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItemAck>, AppError> {
    state.drive.delete(&id).await?;
    Ok(Json(ItemAck { id, success: true }))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<FileEntry>>, AppError> {
    Ok(Json(state.drive.search(&params.q).await?))
}

pub async fn storage(State(state): State<AppState>) -> Result<Json<StorageQuota>, AppError> {
    Ok(Json(state.drive.storage_quota().await?))
}

pub async fn upload_config(State(state): State<AppState>) -> Json<UploadLimits> {
    Json(state.drive.upload_limits())
}
