//! In-process gateway for local development and tests.
//!
//! Behaves like a small Drive account: items form a multi-parent graph, the
//! trash is a flag, and share links are minted on request. Individual ids and
//! trash query spellings can be made to fail to exercise error paths.

use super::{DownloadStream, DriveGateway, DriveItem, GatewayError, NewFile};
use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use futures::StreamExt;
use service_core::models::{StorageQuota, FOLDER_MIME_TYPE};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

const TOP_CONTAINER: &str = "root";
const QUOTA_LIMIT: u64 = 15 * 1024 * 1024 * 1024;

#[derive(Debug, Clone)]
struct StoredItem {
    item: DriveItem,
    content: Bytes,
}

#[derive(Default)]
struct Faults {
    ids: HashSet<String>,
    trash_queries: HashSet<String>,
}

/// In-memory gateway.
pub struct InMemoryGateway {
    items: RwLock<HashMap<String, StoredItem>>,
    faults: RwLock<Faults>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            faults: RwLock::new(Faults::default()),
        }
    }

    /// Every mutation touching `id` fails with an API error from now on.
    pub async fn fail_id(&self, id: &str) {
        self.faults.write().await.ids.insert(id.to_string());
    }

    /// The given trash query spelling fails from now on.
    pub async fn fail_trash_query(&self, query: &str) {
        self.faults
            .write()
            .await
            .trash_queries
            .insert(query.to_string());
    }

    /// Snapshot of one item, trashed or not.
    pub async fn item(&self, id: &str) -> Option<DriveItem> {
        self.items.read().await.get(id).map(|s| s.item.clone())
    }

    /// Adds an extra parent to an item, producing a multi-parent entry.
    pub async fn add_parent(&self, id: &str, parent_id: &str) -> Result<(), GatewayError> {
        let mut items = self.items.write().await;
        let stored = items
            .get_mut(id)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
        stored.item.parents.push(parent_id.to_string());
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    async fn check_fault(&self, id: &str) -> Result<(), GatewayError> {
        if self.faults.read().await.ids.contains(id) {
            return Err(GatewayError::Api {
                status: 500,
                message: format!("Injected failure for {}", id),
            });
        }
        Ok(())
    }

    async fn insert(
        &self,
        name: &str,
        parent_id: &str,
        mime_type: &str,
        content: Bytes,
    ) -> DriveItem {
        let item = DriveItem {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size: (mime_type != FOLDER_MIME_TYPE).then_some(content.len() as u64),
            modified_time: Some(Utc::now().to_rfc3339()),
            parents: vec![parent_id.to_string()],
            share_link: None,
            trashed: false,
        };
        self.items.write().await.insert(
            item.id.clone(),
            StoredItem {
                item: item.clone(),
                content,
            },
        );
        item
    }

    async fn update<F>(&self, id: &str, apply: F) -> Result<DriveItem, GatewayError>
    where
        F: FnOnce(&mut DriveItem) + Send,
    {
        self.check_fault(id).await?;
        let mut items = self.items.write().await;
        let stored = items
            .get_mut(id)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
        apply(&mut stored.item);
        stored.item.modified_time = Some(Utc::now().to_rfc3339());
        Ok(stored.item.clone())
    }

    async fn filter<F>(&self, predicate: F) -> Vec<DriveItem>
    where
        F: Fn(&DriveItem) -> bool + Send,
    {
        self.items
            .read()
            .await
            .values()
            .filter(|s| predicate(&s.item))
            .map(|s| s.item.clone())
            .collect()
    }

    fn parent_known(items: &HashMap<String, StoredItem>, parent_id: &str) -> bool {
        parent_id == TOP_CONTAINER || items.get(parent_id).is_some_and(|p| p.item.is_folder())
    }
}

#[async_trait]
impl DriveGateway for InMemoryGateway {
    fn top_container_id(&self) -> &str {
        TOP_CONTAINER
    }

    async fn list_children(
        &self,
        parent_id: &str,
        page_size: u32,
    ) -> Result<Vec<DriveItem>, GatewayError> {
        let mut children = self
            .filter(|item| !item.trashed && item.parents.iter().any(|p| p == parent_id))
            .await;
        children.truncate(page_size as usize);
        Ok(children)
    }

    async fn list_folders(&self) -> Result<Vec<DriveItem>, GatewayError> {
        Ok(self
            .filter(|item| !item.trashed && item.is_folder())
            .await)
    }

    async fn get_item(&self, id: &str) -> Result<DriveItem, GatewayError> {
        self.item(id)
            .await
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    async fn find_folder(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<DriveItem>, GatewayError> {
        Ok(self
            .filter(|item| {
                !item.trashed
                    && item.is_folder()
                    && item.name == name
                    && item.parents.iter().any(|p| p == parent_id)
            })
            .await
            .into_iter()
            .next())
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<DriveItem, GatewayError> {
        self.check_fault(parent_id).await?;
        if !Self::parent_known(&*self.items.read().await, parent_id) {
            return Err(GatewayError::NotFound(parent_id.to_string()));
        }
        Ok(self
            .insert(name, parent_id, FOLDER_MIME_TYPE, Bytes::new())
            .await)
    }

    async fn upload(&self, file: NewFile) -> Result<DriveItem, GatewayError> {
        self.check_fault(&file.parent_id).await?;
        if !Self::parent_known(&*self.items.read().await, &file.parent_id) {
            return Err(GatewayError::NotFound(file.parent_id));
        }
        Ok(self
            .insert(&file.name, &file.parent_id, &file.mime_type, file.data)
            .await)
    }

    async fn download(&self, id: &str) -> Result<DownloadStream, GatewayError> {
        let stored = self
            .items
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;

        if stored.item.is_folder() {
            return Err(GatewayError::Api {
                status: 403,
                message: "Only files with binary content can be downloaded".to_string(),
            });
        }

        let body = futures::stream::iter(vec![Ok(stored.content)]).boxed();
        Ok(DownloadStream {
            item: stored.item,
            body,
        })
    }

    async fn rename(&self, id: &str, name: &str) -> Result<DriveItem, GatewayError> {
        let name = name.to_string();
        self.update(id, move |item| item.name = name).await
    }

    async fn set_trashed(&self, id: &str, trashed: bool) -> Result<DriveItem, GatewayError> {
        self.update(id, move |item| item.trashed = trashed).await
    }

    async fn delete_permanently(&self, id: &str) -> Result<(), GatewayError> {
        self.check_fault(id).await?;
        let mut items = self.items.write().await;
        if items.remove(id).is_none() {
            return Err(GatewayError::NotFound(id.to_string()));
        }

        // Like Drive, purging a folder purges everything only reachable through it.
        let mut doomed = vec![id.to_string()];
        while let Some(parent) = doomed.pop() {
            let orphans: Vec<String> = items
                .values_mut()
                .filter_map(|stored| {
                    let before = stored.item.parents.len();
                    stored.item.parents.retain(|p| *p != parent);
                    (before != stored.item.parents.len() && stored.item.parents.is_empty())
                        .then(|| stored.item.id.clone())
                })
                .collect();
            for orphan in orphans {
                items.remove(&orphan);
                doomed.push(orphan);
            }
        }
        Ok(())
    }

    async fn reparent(
        &self,
        id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> Result<DriveItem, GatewayError> {
        if !Self::parent_known(&*self.items.read().await, add_parent) {
            return Err(GatewayError::NotFound(add_parent.to_string()));
        }
        let add_parent = add_parent.to_string();
        let remove: Vec<String> = remove_parents.to_vec();
        self.update(id, move |item| {
            item.parents.retain(|p| !remove.contains(p));
            if !item.parents.contains(&add_parent) {
                item.parents.push(add_parent);
            }
        })
        .await
    }

    async fn copy(
        &self,
        id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<DriveItem, GatewayError> {
        self.check_fault(id).await?;
        let source = self
            .items
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;

        if source.item.is_folder() {
            return Err(GatewayError::Api {
                status: 403,
                message: "Folders cannot be copied natively".to_string(),
            });
        }
        if !Self::parent_known(&*self.items.read().await, parent_id) {
            return Err(GatewayError::NotFound(parent_id.to_string()));
        }

        Ok(self
            .insert(name, parent_id, &source.item.mime_type, source.content)
            .await)
    }

    async fn query_trashed(&self, query: &str) -> Result<Vec<DriveItem>, GatewayError> {
        if self.faults.read().await.trash_queries.contains(query) {
            return Err(GatewayError::Api {
                status: 400,
                message: format!("Invalid Value: {}", query),
            });
        }
        let compact: String = query.chars().filter(|c| !c.is_whitespace()).collect();
        if !compact.starts_with("trashed=true") {
            return Err(GatewayError::Api {
                status: 400,
                message: format!("Unsupported query: {}", query),
            });
        }
        Ok(self.filter(|item| item.trashed).await)
    }

    async fn search(&self, term: &str) -> Result<Vec<DriveItem>, GatewayError> {
        let needle = term.to_lowercase();
        Ok(self
            .filter(|item| !item.trashed && item.name.to_lowercase().contains(&needle))
            .await)
    }

    async fn quota(&self) -> Result<StorageQuota, GatewayError> {
        let items = self.items.read().await;
        let (mut active, mut trashed) = (0u64, 0u64);
        for stored in items.values() {
            let size = stored.item.size.unwrap_or(0);
            if stored.item.trashed {
                trashed += size;
            } else {
                active += size;
            }
        }
        Ok(StorageQuota {
            limit: Some(QUOTA_LIMIT),
            usage: active + trashed,
            usage_in_drive: active,
            usage_in_drive_trash: trashed,
        })
    }

    async fn ensure_share_link(&self, id: &str) -> Result<String, GatewayError> {
        let link = format!("https://drive.local/file/d/{}/view", id);
        let minted = link.clone();
        self.update(id, move |item| item.share_link = Some(minted))
            .await?;
        Ok(link)
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
