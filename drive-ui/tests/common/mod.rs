#![allow(dead_code)]

use drive_service::config::DriveConfig;
use drive_service::services::InMemoryGateway;
use drive_service::startup::Application;
use drive_ui::{BrowserConfig, DriveApi, DriveApiClient, FileBrowser, UploadFile};
use std::sync::Arc;

/// A drive-service instance on a random port backed by the in-memory gateway.
pub struct TestDrive {
    pub address: String,
    pub gateway: Arc<InMemoryGateway>,
    pub api: Arc<DriveApiClient>,
}

impl TestDrive {
    pub async fn spawn() -> Self {
        let gateway = Arc::new(InMemoryGateway::new());
        let app = Application::build_with_gateway(DriveConfig::in_memory(), gateway.clone())
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(format!("{}/health", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestDrive {
            api: Arc::new(DriveApiClient::with_client(client, address.clone())),
            address,
            gateway,
        }
    }

    pub fn browser(&self, config: BrowserConfig) -> FileBrowser<DriveApiClient> {
        FileBrowser::new(self.api.clone(), "MiniDrive", config)
    }

    pub async fn folder(&self, name: &str, parent_id: Option<&str>) -> String {
        self.api
            .create_folder(name, parent_id)
            .await
            .expect("Failed to create folder")
            .id
    }

    pub async fn file(&self, name: &str, content: &str, parent_id: Option<&str>) -> String {
        let file = UploadFile::new(name, "text/plain", content.as_bytes().to_vec());
        self.api
            .upload(file, parent_id)
            .await
            .expect("Failed to upload file")
            .id
    }
}

pub fn names<'a>(
    entries: impl IntoIterator<Item = &'a service_core::models::FileEntry>,
) -> Vec<String> {
    entries.into_iter().map(|e| e.name.clone()).collect()
}
