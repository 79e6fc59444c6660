use crate::services::filename::repair_mojibake;
use crate::services::UploadRequest;
use crate::startup::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use service_core::models::UploadResult;

struct PendingFile {
    file_name: String,
    mime_type: String,
    data: Bytes,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(anyhow::anyhow!("Upload exceeds the request size limit"))
    } else {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart body: {}", err))
    }
}

/// `POST /api/upload`: one or more `file` parts plus optional `parentId` and
/// `relativePath` parts. Relative paths pair with files by position.
///
/// One file yields a single object and fails the request on error. Several
/// yield an array with one outcome per file; a failed file does not stop the
/// ones after it. The status is 201 when at least one file was stored.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let limits = state.drive.upload_limits();
    let mut files: Vec<PendingFile> = Vec::new();
    let mut relative_paths: Vec<String> = Vec::new();
    let mut parent_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or_default() {
            "file" => {
                if files.len() >= limits.max_files {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "Too many files: at most {} per upload",
                        limits.max_files
                    )));
                }
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                if data.len() as u64 > limits.max_file_size {
                    return Err(AppError::PayloadTooLarge(anyhow::anyhow!(
                        "{} exceeds the {} MB limit",
                        file_name,
                        limits.max_file_size_mb
                    )));
                }
                files.push(PendingFile {
                    file_name,
                    mime_type,
                    data,
                });
            }
            "parentId" => parent_id = Some(field.text().await.map_err(multipart_error)?),
            "relativePath" => relative_paths.push(field.text().await.map_err(multipart_error)?),
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    if files.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("No file uploaded")));
    }

    let mut relative_paths = relative_paths.into_iter();
    let mut requests: Vec<UploadRequest> = files
        .into_iter()
        .map(|file| UploadRequest {
            file_name: file.file_name,
            mime_type: file.mime_type,
            data: file.data,
            parent_id: parent_id.clone(),
            relative_path: relative_paths.next().filter(|p| !p.trim().is_empty()),
        })
        .collect();

    if requests.len() == 1 {
        if let Some(request) = requests.pop() {
            let stored = state.drive.upload(request).await?;
            return Ok((StatusCode::CREATED, Json(stored)).into_response());
        }
    }

    let mut outcomes: Vec<UploadResult> = Vec::with_capacity(requests.len());
    for request in requests {
        let name = repair_mojibake(&request.file_name);
        match state.drive.upload(request).await {
            Ok(stored) => outcomes.push(stored.into()),
            Err(e) => {
                tracing::warn!(file_name = %name, error = %e, "Upload failed, continuing batch");
                outcomes.push(UploadResult::failed(name, e));
            }
        }
    }

    let status = if outcomes.iter().any(|o| o.success) {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcomes)).into_response())
}

/// `filename="…"` fallback plus RFC 5987 `filename*` for non-ASCII names.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}

/// `GET /api/download/:id`: streams the content straight from the gateway.
#[tracing::instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let stream = state.drive.download(&id).await?;
    let item = stream.item;

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, item.mime_type.as_str())
        .header(header::CONTENT_DISPOSITION, content_disposition(&item.name));
    if let Some(size) = item.size {
        response = response.header(header::CONTENT_LENGTH, size);
    }

    response
        .body(Body::from_stream(stream.body))
        .map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to build download response: {}", e))
        })
}
