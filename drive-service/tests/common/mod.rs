#![allow(dead_code)]

use drive_service::config::DriveConfig;
use drive_service::services::InMemoryGateway;
use drive_service::startup::Application;
use reqwest::multipart;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub gateway: Arc<InMemoryGateway>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(DriveConfig::in_memory()).await
    }

    pub async fn spawn_with(config: DriveConfig) -> Self {
        let gateway = Arc::new(InMemoryGateway::new());
        let app = Application::build_with_gateway(config, gateway.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            gateway,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> String {
        let response = self
            .client
            .post(self.url("/api/create-folder"))
            .json(&json!({ "name": name, "parentId": parent_id }))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["id"].as_str().expect("missing id").to_string()
    }

    pub async fn upload_text(&self, name: &str, content: &str, parent_id: Option<&str>) -> Value {
        // Raw UTF-8 filenames, the way browsers send them
        let mut form = multipart::Form::new().percent_encode_noop().part(
            "file",
            multipart::Part::bytes(content.as_bytes().to_vec())
                .file_name(name.to_string())
                .mime_str("text/plain")
                .expect("valid mime"),
        );
        if let Some(parent) = parent_id {
            form = form.text("parentId", parent.to_string());
        }

        let response = self
            .client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request.");
        let status = response.status().as_u16();
        (status, response.json().await.expect("Failed to parse JSON"))
    }

    pub async fn delete_json(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to execute request.");
        let status = response.status().as_u16();
        (status, response.json().await.expect("Failed to parse JSON"))
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");
        let status = response.status().as_u16();
        (status, response.json().await.expect("Failed to parse JSON"))
    }
}

pub fn names(files: &Value) -> Vec<String> {
    files
        .as_array()
        .expect("expected an array")
        .iter()
        .map(|f| f["name"].as_str().unwrap_or_default().to_string())
        .collect()
}
