//! Data access layer between the HTTP handlers and the storage gateway.
//!
//! Everything the app manages lives below one well-known folder (the app
//! root) inside the account's top container. [`DriveService`] resolves that
//! folder once, keeps a process-lifetime cache of folder names and parents,
//! and turns raw gateway items into [`FileEntry`] values.

use crate::config::DriveSettings;
use crate::services::filename::{folder_segments, repair_mojibake};
use crate::services::gateway::{DownloadStream, DriveGateway, DriveItem, GatewayError, NewFile};
use axum::body::Bytes;
use dashmap::DashMap;
use futures::future::join_all;
use metrics::counter;
use service_core::error::AppError;
use service_core::models::{
    build_folder_tree, paginate, sort_entries, BatchResult, CreatedFolder, FileEntry, FilePage,
    FolderInfo, FolderRecord, FolderTreeNode, SortField, SortOrder, StorageQuota, UploadLimits,
    UploadedFile,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Query spellings tried in order when listing the trash. Some accounts
/// reject one form and accept another.
pub const TRASH_QUERIES: [&str; 3] = [
    "trashed=true",
    "trashed = true",
    "trashed=true and 'me' in owners",
];

/// Upper bound on parent hops when walking towards the app root.
const MAX_ANCESTRY_DEPTH: usize = 64;

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub page: usize,
    pub limit: usize,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            sort_by: SortField::Name,
            sort_order: SortOrder::Asc,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Result of a trash listing.
#[derive(Debug, Clone, PartialEq)]
pub enum TrashListing {
    Available(Vec<FileEntry>),
    /// Every query spelling failed; holds the gateway errors in query order.
    Unavailable(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub mime_type: String,
    pub data: Bytes,
    pub parent_id: Option<String>,
    /// Browser-reported path of the file inside a dropped directory.
    pub relative_path: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedFolder {
    name: String,
    parent_id: Option<String>,
}

pub struct DriveService {
    gateway: Arc<dyn DriveGateway>,
    settings: DriveSettings,
    limits: UploadLimits,
    root_id: OnceCell<String>,
    folders: DashMap<String, CachedFolder>,
}

impl DriveService {
    pub fn new(
        gateway: Arc<dyn DriveGateway>,
        settings: DriveSettings,
        limits: UploadLimits,
    ) -> Self {
        Self {
            gateway,
            settings,
            limits,
            root_id: OnceCell::new(),
            folders: DashMap::new(),
        }
    }

    /// Id of the app root folder, created under the top container on first use.
    pub async fn ensure_root(&self) -> Result<String, AppError> {
        let id = self
            .root_id
            .get_or_try_init(|| async {
                let top = self.gateway.top_container_id();
                let name = self.settings.root_folder_name.as_str();
                let folder = match self.gateway.find_folder(name, top).await? {
                    Some(folder) => folder,
                    None => {
                        tracing::info!(folder_name = %name, "Creating app root folder");
                        self.gateway.create_folder(name, top).await?
                    }
                };
                self.remember(&folder);
                tracing::info!(root_id = %folder.id, "App root folder resolved");
                Ok::<_, GatewayError>(folder.id)
            })
            .await?;
        Ok(id.clone())
    }

    async fn resolve_parent(&self, parent_id: Option<&str>) -> Result<String, AppError> {
        match parent_id.map(str::trim) {
            Some(id) if !id.is_empty() && id != "root" => Ok(id.to_string()),
            _ => self.ensure_root().await,
        }
    }

    fn remember(&self, item: &DriveItem) {
        if item.is_folder() {
            self.folders.insert(
                item.id.clone(),
                CachedFolder {
                    name: item.name.clone(),
                    parent_id: item.parent_id().map(str::to_string),
                },
            );
        }
    }

    fn to_entry(item: DriveItem) -> FileEntry {
        let is_folder = item.is_folder();
        let parent_id = item.parent_id().map(str::to_string);
        FileEntry {
            id: item.id,
            name: item.name,
            is_folder,
            mime_type: item.mime_type,
            size: if is_folder { None } else { item.size },
            modified_time: item.modified_time,
            parent_id,
            share_link: item.share_link,
            trashed_time: None,
            path: None,
        }
    }

    /// Mints share links for files that lack one. Failures leave the link
    /// empty and never fail the caller.
    async fn attach_share_links(&self, entries: &mut [FileEntry]) {
        let pending: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_folder && e.share_link.is_none())
            .map(|(i, _)| i)
            .collect();
        if pending.is_empty() {
            return;
        }

        let links = join_all(
            pending
                .iter()
                .map(|&i| self.gateway.ensure_share_link(&entries[i].id)),
        )
        .await;

        for (i, link) in pending.into_iter().zip(links) {
            match link {
                Ok(link) => entries[i].share_link = Some(link),
                Err(e) => {
                    counter!("drive_share_link_failures_total").increment(1);
                    tracing::warn!(
                        file_id = %entries[i].id,
                        error = %e,
                        "Failed to create share link"
                    );
                }
            }
        }
    }

    async fn sorted_children(
        &self,
        parent_id: Option<&str>,
        sort_by: SortField,
        sort_order: SortOrder,
    ) -> Result<Vec<FileEntry>, AppError> {
        let parent = self.resolve_parent(parent_id).await?;
        let items = self
            .gateway
            .list_children(&parent, self.settings.list_page_size)
            .await?;
        items.iter().for_each(|item| self.remember(item));

        let mut entries: Vec<FileEntry> = items.into_iter().map(Self::to_entry).collect();
        sort_entries(&mut entries, sort_by, sort_order);
        Ok(entries)
    }

    /// Every child of a folder, sorted, with share links attached.
    #[tracing::instrument(skip(self))]
    pub async fn list_files(
        &self,
        parent_id: Option<&str>,
        sort_by: SortField,
        sort_order: SortOrder,
    ) -> Result<Vec<FileEntry>, AppError> {
        let mut entries = self.sorted_children(parent_id, sort_by, sort_order).await?;
        self.attach_share_links(&mut entries).await;
        Ok(entries)
    }

    /// One page of a folder listing. Only the returned page gets share links.
    #[tracing::instrument(skip(self))]
    pub async fn list_files_page(
        &self,
        parent_id: Option<&str>,
        options: ListOptions,
    ) -> Result<FilePage, AppError> {
        let entries = self
            .sorted_children(parent_id, options.sort_by, options.sort_order)
            .await?;
        let limit = options.limit.clamp(1, MAX_PAGE_LIMIT);
        let (mut files, pagination) = paginate(&entries, options.page, limit);
        self.attach_share_links(&mut files).await;

        tracing::debug!(
            total = pagination.total_files,
            page = pagination.current_page,
            returned = files.len(),
            "Listed folder page"
        );
        Ok(FilePage { files, pagination })
    }

    /// Folder hierarchy below the app root, built from one flat listing.
    #[tracing::instrument(skip(self))]
    pub async fn folder_tree(&self) -> Result<Vec<FolderTreeNode>, AppError> {
        let root = self.ensure_root().await?;
        let folders = self.gateway.list_folders().await?;
        folders.iter().for_each(|f| self.remember(f));

        let records: Vec<FolderRecord> = folders
            .into_iter()
            .map(|f| FolderRecord {
                parent_id: f.parent_id().map(str::to_string),
                id: f.id,
                name: f.name,
            })
            .collect();
        Ok(build_folder_tree(&records, &root))
    }

    pub async fn folder_info(&self, id: &str) -> Result<FolderInfo, AppError> {
        let item = self.gateway.get_item(id).await?;
        self.remember(&item);
        Ok(FolderInfo {
            is_folder: item.is_folder(),
            parent_id: item.parent_id().map(str::to_string),
            id: item.id,
            name: item.name,
            mime_type: item.mime_type,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<CreatedFolder, AppError> {
        let parent = self.resolve_parent(parent_id).await?;
        let folder = self.gateway.create_folder(name, &parent).await?;
        self.remember(&folder);
        tracing::info!(folder_id = %folder.id, parent_id = %parent, "Folder created");
        Ok(CreatedFolder {
            id: folder.id,
            name: folder.name,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn rename(&self, id: &str, name: &str) -> Result<CreatedFolder, AppError> {
        let item = self.gateway.rename(id, name).await?;
        self.remember(&item);
        Ok(CreatedFolder {
            id: item.id,
            name: item.name,
        })
    }

    async fn find_or_create_folder(&self, name: &str, parent_id: &str) -> Result<String, AppError> {
        let folder = match self.gateway.find_folder(name, parent_id).await? {
            Some(existing) => existing,
            None => self.gateway.create_folder(name, parent_id).await?,
        };
        self.remember(&folder);
        Ok(folder.id)
    }

    /// Stores one file, creating the folders named by its relative path first.
    #[tracing::instrument(
        skip(self, request),
        fields(file_name = %request.file_name, size = request.data.len())
    )]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadedFile, AppError> {
        if request.data.len() as u64 > self.limits.max_file_size {
            return Err(AppError::PayloadTooLarge(anyhow::anyhow!(
                "File exceeds the {} MB limit",
                self.limits.max_file_size_mb
            )));
        }

        let mut parent = self.resolve_parent(request.parent_id.as_deref()).await?;
        if let Some(relative_path) = request.relative_path.as_deref() {
            for segment in folder_segments(relative_path) {
                parent = self.find_or_create_folder(&segment, &parent).await?;
            }
        }

        let stored = self
            .gateway
            .upload(NewFile {
                name: repair_mojibake(&request.file_name),
                parent_id: parent,
                mime_type: request.mime_type,
                data: request.data,
            })
            .await?;

        let share_link = match self.gateway.ensure_share_link(&stored.id).await {
            Ok(link) => Some(link),
            Err(e) => {
                counter!("drive_share_link_failures_total").increment(1);
                tracing::warn!(file_id = %stored.id, error = %e, "Failed to share uploaded file");
                None
            }
        };

        counter!("drive_uploads_total").increment(1);
        tracing::info!(file_id = %stored.id, "File uploaded");
        Ok(UploadedFile {
            id: stored.id,
            name: stored.name,
            share_link,
        })
    }

    pub async fn download(&self, id: &str) -> Result<DownloadStream, AppError> {
        Ok(self.gateway.download(id).await?)
    }

    /// Name search with a location hint relative to the app root.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<FileEntry>, AppError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Search query must not be empty"
            )));
        }

        let root = self.ensure_root().await?;
        let items = self.gateway.search(term).await?;

        let mut entries = Vec::with_capacity(items.len());
        for item in items.into_iter().filter(|item| item.id != root) {
            self.remember(&item);
            let path = match item.parent_id() {
                Some(parent) => self.location_hint(parent, &root).await,
                None => None,
            };
            let mut entry = Self::to_entry(item);
            entry.path = path;
            entries.push(entry);
        }

        sort_entries(&mut entries, SortField::Name, SortOrder::Asc);
        self.attach_share_links(&mut entries).await;
        Ok(entries)
    }

    async fn cached_folder(&self, id: &str) -> Option<CachedFolder> {
        if let Some(hit) = self.folders.get(id) {
            return Some(hit.value().clone());
        }
        match self.gateway.get_item(id).await {
            Ok(item) => {
                self.remember(&item);
                self.folders.get(id).map(|hit| hit.value().clone())
            }
            Err(e) => {
                tracing::debug!(folder_id = %id, error = %e, "Parent lookup failed");
                None
            }
        }
    }

    /// `"<root name>/a/b"` for a folder below the app root, `None` otherwise.
    async fn location_hint(&self, folder_id: &str, root: &str) -> Option<String> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        let mut current = folder_id.to_string();

        while current != root {
            if names.len() >= MAX_ANCESTRY_DEPTH || !seen.insert(current.clone()) {
                return None;
            }
            let folder = self.cached_folder(&current).await?;
            names.push(folder.name);
            current = folder.parent_id?;
        }

        names.push(self.settings.root_folder_name.clone());
        names.reverse();
        Some(names.join("/"))
    }

    /// True when `candidate` is `ancestor` or lies somewhere below it.
    async fn is_within(&self, candidate: &str, ancestor: &str) -> Result<bool, AppError> {
        let mut seen = HashSet::new();
        let mut current = candidate.to_string();
        for _ in 0..MAX_ANCESTRY_DEPTH {
            if current == ancestor {
                return Ok(true);
            }
            if !seen.insert(current.clone()) {
                return Ok(false);
            }
            let item = match self.gateway.get_item(&current).await {
                Ok(item) => item,
                Err(e) if e.is_not_found() => return Ok(false),
                Err(e) => return Err(e.into()),
            };
            match item.parent_id() {
                Some(parent) => current = parent.to_string(),
                None => return Ok(false),
            }
        }
        Ok(false)
    }

    async fn move_one(&self, id: &str, target: &str) -> Result<DriveItem, AppError> {
        let item = self.gateway.get_item(id).await?;
        if item.is_folder() && self.is_within(target, &item.id).await? {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot move a folder into itself"
            )));
        }
        let previous: Vec<String> = item.parents.iter().filter(|p| *p != target).cloned().collect();
        let moved = self.gateway.reparent(id, target, &previous).await?;
        self.remember(&moved);
        Ok(moved)
    }

    /// Copies one item. For folders the second value lists the descendants
    /// that could not be copied; their siblings are still attempted.
    async fn copy_one(
        &self,
        id: &str,
        target: &str,
    ) -> Result<(DriveItem, Vec<BatchResult>), AppError> {
        let item = self.gateway.get_item(id).await?;
        let name = format!("Copy of {}", item.name);
        if !item.is_folder() {
            return Ok((self.gateway.copy(id, &name, target).await?, Vec::new()));
        }

        if self.is_within(target, &item.id).await? {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot copy a folder into itself"
            )));
        }

        let copy_root = self.gateway.create_folder(&name, target).await?;
        self.remember(&copy_root);
        let failed = self.copy_tree(&item.id, &copy_root.id).await;
        Ok((copy_root, failed))
    }

    /// Copies the contents of `source` into `destination` one level at a
    /// time. Every child of a level is copied concurrently.
    async fn copy_tree(&self, source: &str, destination: &str) -> Vec<BatchResult> {
        let page_size = self.settings.list_page_size;
        let mut failed = Vec::new();
        let mut visited = HashSet::from([source.to_string(), destination.to_string()]);
        let mut level = vec![(source.to_string(), destination.to_string())];

        while !level.is_empty() {
            let listings = join_all(level.iter().map(|(source, destination)| async move {
                let children = self.gateway.list_children(source, page_size).await;
                (source.clone(), destination.clone(), children)
            }))
            .await;

            let mut pending = Vec::new();
            for (source, destination, children) in listings {
                match children {
                    Ok(children) => pending.extend(
                        children
                            .into_iter()
                            .filter(|child| visited.insert(child.id.clone()))
                            .map(|child| (child, destination.clone())),
                    ),
                    Err(e) => {
                        tracing::warn!(folder_id = %source, error = %e, "Copy listing failed");
                        failed.push(BatchResult::failed(source, e));
                    }
                }
            }

            let copies = join_all(pending.into_iter().map(|(child, destination)| async move {
                let copied = if child.is_folder() {
                    self.gateway.create_folder(&child.name, &destination).await
                } else {
                    self.gateway.copy(&child.id, &child.name, &destination).await
                };
                (child, copied)
            }))
            .await;

            level = Vec::new();
            for (child, copied) in copies {
                match copied {
                    Ok(copy) if child.is_folder() => {
                        self.remember(&copy);
                        visited.insert(copy.id.clone());
                        level.push((child.id, copy.id));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(file_id = %child.id, error = %e, "Child copy failed");
                        failed.push(BatchResult::failed(child.id, e));
                    }
                }
            }
        }
        failed
    }

    fn record_batch(operation: &'static str, results: &[BatchResult]) {
        for result in results {
            let outcome = if result.success { "success" } else { "failure" };
            counter!("drive_batch_items_total", "operation" => operation, "outcome" => outcome)
                .increment(1);
        }
    }

    /// Moves every id into `target`, detaching all previous parents.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn move_files(
        &self,
        ids: &[String],
        target: &str,
    ) -> Result<Vec<BatchResult>, AppError> {
        let target = self.resolve_parent(Some(target)).await?;
        let target = target.as_str();
        let results: Vec<BatchResult> = join_all(ids.iter().map(|id| async move {
            match self.move_one(id, target).await {
                Ok(moved) => BatchResult::ok(id.clone(), Some(moved.name)),
                Err(e) => {
                    tracing::warn!(file_id = %id, error = %e, "Move failed");
                    BatchResult::failed(id.clone(), e)
                }
            }
        }))
        .await;
        Self::record_batch("move", &results);
        Ok(results)
    }

    /// Copies every id into `target`. Folders are copied recursively.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn copy_files(
        &self,
        ids: &[String],
        target: &str,
    ) -> Result<Vec<BatchResult>, AppError> {
        let target = self.resolve_parent(Some(target)).await?;
        let target = target.as_str();
        let results: Vec<BatchResult> = join_all(ids.iter().map(|id| async move {
            match self.copy_one(id, target).await {
                Ok((copied, failed)) => {
                    if !failed.is_empty() {
                        tracing::warn!(file_id = %id, failed = failed.len(), "Partial folder copy");
                    }
                    BatchResult::ok(id.clone(), Some(copied.name)).with_failed_children(failed)
                }
                Err(e) => {
                    tracing::warn!(file_id = %id, error = %e, "Copy failed");
                    BatchResult::failed(id.clone(), e)
                }
            }
        }))
        .await;
        Self::record_batch("copy", &results);
        Ok(results)
    }

    /// Moves an item to the trash.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.gateway.set_trashed(id, true).await?;
        self.folders.remove(id);
        tracing::info!(file_id = %id, "Item trashed");
        Ok(())
    }

    pub async fn restore(&self, id: &str) -> Result<(), AppError> {
        let item = self.gateway.set_trashed(id, false).await?;
        self.remember(&item);
        tracing::info!(file_id = %id, "Item restored");
        Ok(())
    }

    pub async fn permanent_delete(&self, id: &str) -> Result<(), AppError> {
        self.gateway.delete_permanently(id).await?;
        self.folders.remove(id);
        tracing::info!(file_id = %id, "Item permanently deleted");
        Ok(())
    }

    /// Trash contents, newest first. `trashedTime` mirrors the modification
    /// time since the gateway does not report when an item was trashed.
    #[tracing::instrument(skip(self))]
    pub async fn list_trash(&self) -> TrashListing {
        let mut failures = Vec::with_capacity(TRASH_QUERIES.len());
        for query in TRASH_QUERIES {
            match self.gateway.query_trashed(query).await {
                Ok(items) => {
                    let mut entries: Vec<FileEntry> = items
                        .into_iter()
                        .map(|item| {
                            let mut entry = Self::to_entry(item);
                            entry.trashed_time = entry.modified_time.clone();
                            entry
                        })
                        .collect();
                    sort_entries(&mut entries, SortField::ModifiedTime, SortOrder::Desc);
                    return TrashListing::Available(entries);
                }
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "Trash query rejected");
                    failures.push(e.to_string());
                }
            }
        }

        counter!("drive_trash_unavailable_total").increment(1);
        tracing::error!(attempts = failures.len(), "Trash listing unavailable");
        TrashListing::Unavailable(failures)
    }

    /// Permanently deletes everything in the trash. Refuses to run when the
    /// trash cannot be listed.
    #[tracing::instrument(skip(self))]
    pub async fn empty_trash(&self) -> Result<Vec<BatchResult>, AppError> {
        let files = match self.list_trash().await {
            TrashListing::Available(files) => files,
            TrashListing::Unavailable(_) => {
                return Err(AppError::ServiceUnavailable(
                    "Trash listing is unavailable".to_string(),
                ))
            }
        };

        let results: Vec<BatchResult> = join_all(files.into_iter().map(|file| async move {
            match self.gateway.delete_permanently(&file.id).await {
                // Purging a trashed folder can take already listed children with it.
                Ok(()) | Err(GatewayError::NotFound(_)) => {
                    self.folders.remove(&file.id);
                    BatchResult::ok(file.id, Some(file.name))
                }
                Err(e) => {
                    tracing::warn!(file_id = %file.id, error = %e, "Permanent delete failed");
                    BatchResult::failed(file.id, e)
                }
            }
        }))
        .await;

        Self::record_batch("empty_trash", &results);
        Ok(results)
    }

    pub async fn storage_quota(&self) -> Result<StorageQuota, AppError> {
        Ok(self.gateway.quota().await?)
    }

    pub fn upload_limits(&self) -> UploadLimits {
        self.limits
    }

    /// Ready when the gateway answers and the app root resolves.
    pub async fn ready(&self) -> Result<(), AppError> {
        self.gateway.health_check().await?;
        self.ensure_root().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gateway::InMemoryGateway;

    fn service() -> (Arc<InMemoryGateway>, DriveService) {
        let gateway = Arc::new(InMemoryGateway::new());
        let service = DriveService::new(
            gateway.clone(),
            DriveSettings {
                root_folder_name: "MiniDrive".to_string(),
                list_page_size: 1000,
            },
            UploadLimits::new(1024, 10),
        );
        (gateway, service)
    }

    fn upload(name: &str, parent: Option<&str>) -> UploadRequest {
        UploadRequest {
            file_name: name.to_string(),
            mime_type: "text/plain".to_string(),
            data: Bytes::from_static(b"content"),
            parent_id: parent.map(str::to_string),
            relative_path: None,
        }
    }

    #[tokio::test]
    async fn root_is_created_once_and_reused() {
        let (gateway, service) = service();
        let first = service.ensure_root().await.unwrap();
        let second = service.ensure_root().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(gateway.len().await, 1);
    }

    #[tokio::test]
    async fn relative_paths_create_intermediate_folders_once() {
        let (_, service) = service();
        let mut first = upload("a.txt", None);
        first.relative_path = Some("photos/2024/a.txt".to_string());
        let mut second = upload("b.txt", None);
        second.relative_path = Some("photos/2024/b.txt".to_string());

        service.upload(first).await.unwrap();
        service.upload(second).await.unwrap();

        let tree = service.folder_tree().await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "photos");
        assert_eq!(tree[0].children[0].name, "2024");
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let (_, service) = service();
        let mut request = upload("big.bin", None);
        request.data = Bytes::from(vec![0u8; 2048]);

        let err = service.upload(request).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn search_reports_location_below_root() {
        let (_, service) = service();
        let docs = service.create_folder("docs", None).await.unwrap();
        let inner = service.create_folder("inner", Some(docs.id.as_str())).await.unwrap();
        service.upload(upload("report.txt", Some(inner.id.as_str()))).await.unwrap();

        let hits = service.search("REPORT").await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path.as_deref(), Some("MiniDrive/docs/inner"));
        assert!(service.search("   ").await.is_err());
    }

    #[tokio::test]
    async fn moving_a_folder_into_its_descendant_fails_alone() {
        let (_, service) = service();
        let outer = service.create_folder("outer", None).await.unwrap();
        let inner = service.create_folder("inner", Some(outer.id.as_str())).await.unwrap();
        let file = service.upload(upload("f.txt", None)).await.unwrap();

        let results = service
            .move_files(&[outer.id.clone(), file.id.clone()], &inner.id)
            .await
            .unwrap();

        assert!(!results[0].success);
        assert!(results[1].success);
    }

    #[tokio::test]
    async fn folder_copy_is_recursive_and_keeps_child_names() {
        let (_, service) = service();
        let src = service.create_folder("src", None).await.unwrap();
        let sub = service.create_folder("sub", Some(src.id.as_str())).await.unwrap();
        service.upload(upload("leaf.txt", Some(sub.id.as_str()))).await.unwrap();
        let dest = service.create_folder("dest", None).await.unwrap();

        let results = service.copy_files(&[src.id.clone()], &dest.id).await.unwrap();
        assert_eq!(results[0].name.as_deref(), Some("Copy of src"));

        let tree = service.folder_tree().await.unwrap();
        let dest_node = tree.iter().find(|n| n.id == dest.id).unwrap();
        assert_eq!(dest_node.children[0].name, "Copy of src");
        assert_eq!(dest_node.children[0].children[0].name, "sub");

        let hits = service.search("leaf").await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn trash_falls_back_through_query_spellings() {
        let (gateway, service) = service();
        let file = service.upload(upload("gone.txt", None)).await.unwrap();
        service.delete(&file.id).await.unwrap();

        gateway.fail_trash_query(TRASH_QUERIES[0]).await;
        match service.list_trash().await {
            TrashListing::Available(files) => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].trashed_time, files[0].modified_time);
            }
            other => panic!("expected trash contents, got {:?}", other),
        }

        for query in TRASH_QUERIES {
            gateway.fail_trash_query(query).await;
        }
        assert!(matches!(
            service.list_trash().await,
            TrashListing::Unavailable(ref e) if e.len() == 3
        ));
        assert!(matches!(
            service.empty_trash().await,
            Err(AppError::ServiceUnavailable(_))
        ));
    }
}
