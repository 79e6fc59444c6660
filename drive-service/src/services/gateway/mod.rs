//! Remote storage gateway abstraction.
//!
//! The gateway is an opaque folder/file CRUD, trash and quota API. The data
//! access layer only talks to it through [`DriveGateway`], so the Google Drive
//! adapter and the in-memory adapter are interchangeable.

pub mod google;
pub mod memory;

use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use service_core::error::AppError;
use service_core::models::{StorageQuota, FOLDER_MIME_TYPE};
use thiserror::Error;

pub use google::GoogleDriveGateway;
pub use memory::InMemoryGateway;

/// Error type for gateway operations.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Drive API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        metrics::counter!("drive_gateway_errors_total").increment(1);
        match err {
            GatewayError::NotFound(id) => {
                AppError::NotFound(anyhow::anyhow!("Item not found: {}", id))
            }
            other => AppError::remote("Drive request failed", other.to_string()),
        }
    }
}

/// Raw item as the gateway reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: Option<u64>,
    pub modified_time: Option<String>,
    pub parents: Vec<String>,
    /// Public view link, present only once the item has been shared.
    pub share_link: Option<String>,
    pub trashed: bool,
}

impl DriveItem {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    /// First parent wins; the UI models a tree.
    pub fn parent_id(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

/// File content to store.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub parent_id: String,
    pub mime_type: String,
    pub data: Bytes,
}

pub type ByteStream = BoxStream<'static, Result<Bytes, GatewayError>>;

/// Download handle: metadata plus a lazily consumed body.
pub struct DownloadStream {
    pub item: DriveItem,
    pub body: ByteStream,
}

/// Trait for remote storage backends (Google Drive, in-memory).
#[async_trait]
pub trait DriveGateway: Send + Sync {
    /// Id of the account's top-level container.
    fn top_container_id(&self) -> &str {
        "root"
    }

    /// Non-trashed children of a folder, up to `page_size` entries.
    async fn list_children(
        &self,
        parent_id: &str,
        page_size: u32,
    ) -> Result<Vec<DriveItem>, GatewayError>;

    /// Every non-trashed folder visible to the caller, regardless of parent.
    async fn list_folders(&self) -> Result<Vec<DriveItem>, GatewayError>;

    async fn get_item(&self, id: &str) -> Result<DriveItem, GatewayError>;

    async fn find_folder(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<DriveItem>, GatewayError>;

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<DriveItem, GatewayError>;

    async fn upload(&self, file: NewFile) -> Result<DriveItem, GatewayError>;

    async fn download(&self, id: &str) -> Result<DownloadStream, GatewayError>;

    async fn rename(&self, id: &str, name: &str) -> Result<DriveItem, GatewayError>;

    async fn set_trashed(&self, id: &str, trashed: bool) -> Result<DriveItem, GatewayError>;

    async fn delete_permanently(&self, id: &str) -> Result<(), GatewayError>;

    /// Adds `add_parent` and removes every id in `remove_parents` in one call.
    async fn reparent(
        &self,
        id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> Result<DriveItem, GatewayError>;

    /// Native single-file copy.
    async fn copy(&self, id: &str, name: &str, parent_id: &str)
        -> Result<DriveItem, GatewayError>;

    /// Runs one spelling of the "trashed items" query.
    async fn query_trashed(&self, query: &str) -> Result<Vec<DriveItem>, GatewayError>;

    /// Coarse case-insensitive name substring search over non-trashed items.
    async fn search(&self, term: &str) -> Result<Vec<DriveItem>, GatewayError>;

    async fn quota(&self) -> Result<StorageQuota, GatewayError>;

    /// Makes the item viewable by link and returns that link.
    async fn ensure_share_link(&self, id: &str) -> Result<String, GatewayError>;

    async fn health_check(&self) -> Result<(), GatewayError>;
}
