//! Client for the drive-service HTTP API.
//!
//! [`DriveApi`] is the seam the browser controller and upload queue depend
//! on; [`DriveApiClient`] is the `reqwest` implementation.

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use service_core::models::{
    BatchResult, CreatedFolder, EmptyTrashSummary, FileEntry, FilePage, FolderInfo,
    FolderTreeNode, ItemAck, SortField, SortOrder, StorageQuota, TrashContents, UploadLimits,
    UploadedFile,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// Listing parameters for the paginated endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub page: usize,
    pub limit: usize,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 50,
            sort_by: SortField::Name,
            sort_order: SortOrder::Asc,
        }
    }
}

/// A file picked by the user, ready to send.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    /// Path inside a dropped directory, e.g. `photos/2024/a.jpg`.
    pub relative_path: Option<String>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
            relative_path: None,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[async_trait]
pub trait DriveApi: Send + Sync {
    async fn list_page(
        &self,
        parent_id: Option<&str>,
        query: ListQuery,
    ) -> Result<FilePage, ClientError>;

    async fn list_all(
        &self,
        parent_id: Option<&str>,
        sort_by: SortField,
        sort_order: SortOrder,
    ) -> Result<Vec<FileEntry>, ClientError>;

    async fn folder_info(&self, id: &str) -> Result<FolderInfo, ClientError>;

    async fn folder_tree(&self) -> Result<Vec<FolderTreeNode>, ClientError>;

    async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<CreatedFolder, ClientError>;

    async fn rename(&self, id: &str, name: &str) -> Result<CreatedFolder, ClientError>;

    async fn delete(&self, id: &str) -> Result<ItemAck, ClientError>;

    async fn search(&self, query: &str) -> Result<Vec<FileEntry>, ClientError>;

    /// An unavailable trash comes back as `available: false`, not as an error.
    async fn trash(&self) -> Result<TrashContents, ClientError>;

    async fn restore(&self, id: &str) -> Result<ItemAck, ClientError>;

    async fn permanent_delete(&self, id: &str) -> Result<ItemAck, ClientError>;

    async fn empty_trash(&self) -> Result<EmptyTrashSummary, ClientError>;

    async fn move_items(&self, ids: &[String], target_id: &str)
        -> Result<Vec<BatchResult>, ClientError>;

    async fn copy_items(&self, ids: &[String], target_id: &str)
        -> Result<Vec<BatchResult>, ClientError>;

    async fn upload(
        &self,
        file: UploadFile,
        parent_id: Option<&str>,
    ) -> Result<UploadedFile, ClientError>;

    async fn storage(&self) -> Result<StorageQuota, ClientError>;

    async fn upload_config(&self) -> Result<UploadLimits, ClientError>;

    /// Direct link for the browser to fetch; downloads are never proxied
    /// through the client.
    fn download_url(&self, id: &str) -> String;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

pub struct DriveApiClient {
    client: Client,
    base_url: String,
}

impl DriveApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn parent_param(parent_id: Option<&str>) -> Vec<(&'static str, String)> {
        parent_id
            .map(|id| vec![("parentId", id.to_string())])
            .unwrap_or_default()
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => match body.details {
                Some(details) => format!("{}: {}", body.error, details),
                None => body.error,
            },
            Err(_) if text.is_empty() => status.to_string(),
            Err(_) => text,
        };
        tracing::warn!(status = status.as_u16(), message = %message, "Drive API request failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self.client.get(self.url(path)).query(query).send().await?;
        Self::decode(response).await
    }

    async fn batch(
        &self,
        path: &str,
        ids: &[String],
        target_id: &str,
    ) -> Result<Vec<BatchResult>, ClientError> {
        let response = self
            .client
            .post(self.url(path))
            .json(&json!({ "fileIds": ids, "targetFolderId": target_id }))
            .send()
            .await?;
        Self::decode(response).await
    }
}

fn encode(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl DriveApi for DriveApiClient {
    async fn list_page(
        &self,
        parent_id: Option<&str>,
        query: ListQuery,
    ) -> Result<FilePage, ClientError> {
        let mut params = Self::parent_param(parent_id);
        params.extend([
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("sortBy", query.sort_by.to_string()),
            ("sortOrder", query.sort_order.to_string()),
        ]);
        self.get("/api/files", &params).await
    }

    async fn list_all(
        &self,
        parent_id: Option<&str>,
        sort_by: SortField,
        sort_order: SortOrder,
    ) -> Result<Vec<FileEntry>, ClientError> {
        let mut params = Self::parent_param(parent_id);
        params.extend([
            ("sortBy", sort_by.to_string()),
            ("sortOrder", sort_order.to_string()),
        ]);
        self.get("/api/files/all", &params).await
    }

    async fn folder_info(&self, id: &str) -> Result<FolderInfo, ClientError> {
        self.get(&format!("/api/folderinfo/{}", encode(id)), &[]).await
    }

    async fn folder_tree(&self) -> Result<Vec<FolderTreeNode>, ClientError> {
        self.get("/api/folder-tree", &[]).await
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<CreatedFolder, ClientError> {
        let response = self
            .client
            .post(self.url("/api/create-folder"))
            .json(&json!({ "name": name, "parentId": parent_id }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn rename(&self, id: &str, name: &str) -> Result<CreatedFolder, ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/api/rename/{}", encode(id))))
            .json(&json!({ "name": name }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete(&self, id: &str) -> Result<ItemAck, ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/delete/{}", encode(id))))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn search(&self, query: &str) -> Result<Vec<FileEntry>, ClientError> {
        self.get("/api/search", &[("q", query.to_string())]).await
    }

    async fn trash(&self) -> Result<TrashContents, ClientError> {
        let response = self.client.get(self.url("/api/trash")).send().await?;
        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(TrashContents {
                available: false,
                files: Vec::new(),
            });
        }
        Self::decode(response).await
    }

    async fn restore(&self, id: &str) -> Result<ItemAck, ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/api/restore/{}", encode(id))))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn permanent_delete(&self, id: &str) -> Result<ItemAck, ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/permanent-delete/{}", encode(id))))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn empty_trash(&self) -> Result<EmptyTrashSummary, ClientError> {
        let response = self
            .client
            .delete(self.url("/api/empty-trash"))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn move_items(
        &self,
        ids: &[String],
        target_id: &str,
    ) -> Result<Vec<BatchResult>, ClientError> {
        self.batch("/api/move", ids, target_id).await
    }

    async fn copy_items(
        &self,
        ids: &[String],
        target_id: &str,
    ) -> Result<Vec<BatchResult>, ClientError> {
        self.batch("/api/copy", ids, target_id).await
    }

    async fn upload(
        &self,
        file: UploadFile,
        parent_id: Option<&str>,
    ) -> Result<UploadedFile, ClientError> {
        let part = multipart::Part::bytes(file.data)
            .file_name(file.name)
            .mime_str(&file.mime_type)
            .map_err(|e| ClientError::Network(format!("Invalid MIME type: {}", e)))?;

        // Browsers send raw UTF-8 filenames; match them
        let mut form = multipart::Form::new().percent_encode_noop().part("file", part);
        if let Some(parent) = parent_id {
            form = form.text("parentId", parent.to_string());
        }
        if let Some(path) = file.relative_path {
            form = form.text("relativePath", path);
        }

        let response = self
            .client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn storage(&self) -> Result<StorageQuota, ClientError> {
        self.get("/api/storage", &[]).await
    }

    async fn upload_config(&self) -> Result<UploadLimits, ClientError> {
        self.get("/api/upload-config", &[]).await
    }

    fn download_url(&self, id: &str) -> String {
        self.url(&format!("/api/download/{}", encode(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = DriveApiClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.download_url("a b"),
            "http://localhost:8080/api/download/a%20b"
        );
    }
}
