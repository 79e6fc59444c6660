//! Google Drive gateway.
//!
//! Talks to the Drive API v3 over plain REST. The bearer token comes from
//! configuration; obtaining and refreshing it happens outside this service.

use super::{DownloadStream, DriveGateway, DriveItem, GatewayError, NewFile};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::json;
use service_core::models::{StorageQuota, FOLDER_MIME_TYPE};
use std::time::Duration;

/// Fields requested for every file resource.
const FILE_FIELDS: &str = "id,name,mimeType,size,modifiedTime,parents,webViewLink,shared,trashed";

/// Google Drive file metadata from API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
    #[serde(default)]
    size: Option<String>,
    modified_time: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    web_view_link: Option<String>,
    #[serde(default)]
    shared: bool,
    #[serde(default)]
    trashed: bool,
}

impl From<DriveFile> for DriveItem {
    fn from(file: DriveFile) -> Self {
        DriveItem {
            size: file.size.as_deref().and_then(|s| s.parse().ok()),
            share_link: file.web_view_link.filter(|_| file.shared),
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            modified_time: file.modified_time,
            parents: file.parents,
            trashed: file.trashed,
        }
    }
}

/// Google Drive file list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct About {
    storage_quota: RawQuota,
}

/// Drive reports every quota number as a decimal string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuota {
    limit: Option<String>,
    #[serde(default)]
    usage: Option<String>,
    #[serde(default)]
    usage_in_drive: Option<String>,
    #[serde(default)]
    usage_in_drive_trash: Option<String>,
}

fn parse_count(value: Option<&str>) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Escapes a value for use inside a single-quoted Drive query literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub struct GoogleDriveGateway {
    client: Client,
    api_base: String,
    upload_base: String,
    access_token: Secret<String>,
    /// Page size for unbounded listings (folders, trash, search).
    page_size: u32,
}

impl GoogleDriveGateway {
    pub fn new(
        api_base: &str,
        upload_base: &str,
        access_token: Secret<String>,
        page_size: u32,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            upload_base: upload_base.trim_end_matches('/').to_string(),
            access_token,
            page_size,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.access_token.expose_secret())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(text));
        }
        tracing::warn!(status = %status, body = %text, "Drive API request failed");
        Err(GatewayError::Api {
            status: status.as_u16(),
            message: text,
        })
    }

    async fn file_request(&self, request: RequestBuilder) -> Result<DriveItem, GatewayError> {
        let file: DriveFile = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(file.into())
    }

    /// Runs a `files.list` query, following page tokens until `limit` items
    /// have been collected or the listing ends.
    async fn list_query(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<DriveItem>, GatewayError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let fields = format!("nextPageToken,files({})", FILE_FIELDS);
        let page_size = self.page_size.to_string();

        loop {
            let mut params = vec![
                ("q", query.to_string()),
                ("fields", fields.clone()),
                ("pageSize", page_size.clone()),
            ];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let list: DriveFileList = self
                .send(self.client.get(format!("{}/files", self.api_base)).query(&params))
                .await?
                .json()
                .await
                .map_err(|e| GatewayError::Decode(e.to_string()))?;

            items.extend(list.files.into_iter().map(DriveItem::from));

            if let Some(max) = limit {
                if items.len() >= max {
                    items.truncate(max);
                    break;
                }
            }
            match list.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl DriveGateway for GoogleDriveGateway {
    async fn list_children(
        &self,
        parent_id: &str,
        page_size: u32,
    ) -> Result<Vec<DriveItem>, GatewayError> {
        let query = format!("{} in parents and trashed=false", quote(parent_id));
        self.list_query(&query, Some(page_size as usize)).await
    }

    async fn list_folders(&self) -> Result<Vec<DriveItem>, GatewayError> {
        let query = format!("mimeType={} and trashed=false", quote(FOLDER_MIME_TYPE));
        self.list_query(&query, None).await
    }

    async fn get_item(&self, id: &str) -> Result<DriveItem, GatewayError> {
        self.file_request(
            self.client
                .get(format!("{}/files/{}", self.api_base, id))
                .query(&[("fields", FILE_FIELDS)]),
        )
        .await
    }

    async fn find_folder(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<DriveItem>, GatewayError> {
        let query = format!(
            "name={} and mimeType={} and {} in parents and trashed=false",
            quote(name),
            quote(FOLDER_MIME_TYPE),
            quote(parent_id)
        );
        Ok(self.list_query(&query, Some(1)).await?.into_iter().next())
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<DriveItem, GatewayError> {
        let metadata = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id]
        });
        self.file_request(
            self.client
                .post(format!("{}/files", self.api_base))
                .query(&[("fields", FILE_FIELDS)])
                .json(&metadata),
        )
        .await
    }

    async fn upload(&self, file: NewFile) -> Result<DriveItem, GatewayError> {
        let metadata = json!({
            "name": file.name,
            "parents": [file.parent_id]
        });

        let metadata_part = multipart::Part::text(metadata.to_string())
            .mime_str("application/json; charset=UTF-8")
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        let content_part = multipart::Part::stream(reqwest::Body::from(file.data))
            .mime_str(&file.mime_type)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        let form = multipart::Form::new()
            .part("metadata", metadata_part)
            .part("file", content_part);

        // Drive wants multipart/related; reqwest only builds form-data, which
        // the upload endpoint also accepts for uploadType=multipart.
        self.file_request(
            self.client
                .post(format!("{}/files", self.upload_base))
                .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
                .multipart(form),
        )
        .await
    }

    async fn download(&self, id: &str) -> Result<DownloadStream, GatewayError> {
        let item = self.get_item(id).await?;
        let response = self
            .send(
                self.client
                    .get(format!("{}/files/{}", self.api_base, id))
                    .query(&[("alt", "media")]),
            )
            .await?;

        let body = response
            .bytes_stream()
            .map_err(|e| GatewayError::Network(e.to_string()))
            .boxed();

        Ok(DownloadStream { item, body })
    }

    async fn rename(&self, id: &str, name: &str) -> Result<DriveItem, GatewayError> {
        self.file_request(
            self.client
                .patch(format!("{}/files/{}", self.api_base, id))
                .query(&[("fields", FILE_FIELDS)])
                .json(&json!({ "name": name })),
        )
        .await
    }

    async fn set_trashed(&self, id: &str, trashed: bool) -> Result<DriveItem, GatewayError> {
        self.file_request(
            self.client
                .patch(format!("{}/files/{}", self.api_base, id))
                .query(&[("fields", FILE_FIELDS)])
                .json(&json!({ "trashed": trashed })),
        )
        .await
    }

    async fn delete_permanently(&self, id: &str) -> Result<(), GatewayError> {
        self.send(self.client.delete(format!("{}/files/{}", self.api_base, id)))
            .await?;
        Ok(())
    }

    async fn reparent(
        &self,
        id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> Result<DriveItem, GatewayError> {
        let remove = remove_parents
            .iter()
            .filter(|p| p.as_str() != add_parent)
            .cloned()
            .collect::<Vec<_>>()
            .join(",");

        self.file_request(
            self.client
                .patch(format!("{}/files/{}", self.api_base, id))
                .query(&[
                    ("addParents", add_parent),
                    ("removeParents", remove.as_str()),
                    ("fields", FILE_FIELDS),
                ])
                .json(&json!({})),
        )
        .await
    }

    async fn copy(
        &self,
        id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<DriveItem, GatewayError> {
        self.file_request(
            self.client
                .post(format!("{}/files/{}/copy", self.api_base, id))
                .query(&[("fields", FILE_FIELDS)])
                .json(&json!({ "name": name, "parents": [parent_id] })),
        )
        .await
    }

    async fn query_trashed(&self, query: &str) -> Result<Vec<DriveItem>, GatewayError> {
        self.list_query(query, None).await
    }

    async fn search(&self, term: &str) -> Result<Vec<DriveItem>, GatewayError> {
        let query = format!("name contains {} and trashed=false", quote(term));
        self.list_query(&query, Some(self.page_size as usize)).await
    }

    async fn quota(&self) -> Result<StorageQuota, GatewayError> {
        let about: About = self
            .send(
                self.client
                    .get(format!("{}/about", self.api_base))
                    .query(&[("fields", "storageQuota")]),
            )
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let raw = about.storage_quota;
        Ok(StorageQuota {
            limit: raw.limit.as_deref().and_then(|v| v.parse().ok()),
            usage: parse_count(raw.usage.as_deref()),
            usage_in_drive: parse_count(raw.usage_in_drive.as_deref()),
            usage_in_drive_trash: parse_count(raw.usage_in_drive_trash.as_deref()),
        })
    }

    async fn ensure_share_link(&self, id: &str) -> Result<String, GatewayError> {
        self.send(
            self.client
                .post(format!("{}/files/{}/permissions", self.api_base, id))
                .json(&json!({ "role": "reader", "type": "anyone" })),
        )
        .await?;

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct FileLink {
            web_view_link: Option<String>,
        }

        let link: FileLink = self
            .send(
                self.client
                    .get(format!("{}/files/{}", self.api_base, id))
                    .query(&[("fields", "webViewLink")]),
            )
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        Ok(link
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view?usp=sharing", id)))
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        self.send(
            self.client
                .get(format!("{}/about", self.api_base))
                .query(&[("fields", "user")]),
        )
        .await?;
        Ok(())
    }
}
