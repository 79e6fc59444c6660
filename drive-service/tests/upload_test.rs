mod common;

use common::{names, TestApp};
use drive_service::config::DriveConfig;
use reqwest::multipart;

fn text_part(name: &str, content: &str) -> multipart::Part {
    multipart::Part::bytes(content.as_bytes().to_vec())
        .file_name(name.to_string())
        .mime_str("text/plain")
        .unwrap()
}

#[tokio::test]
async fn single_upload_returns_object_with_share_link() {
    let app = TestApp::spawn().await;

    let body = app.upload_text("hello.txt", "hello world", None).await;

    assert!(body.is_object());
    assert_eq!(body["name"], "hello.txt");
    assert!(body["shareLink"].as_str().unwrap().contains(body["id"].as_str().unwrap()));
}

#[tokio::test]
async fn multi_upload_returns_array() {
    let app = TestApp::spawn().await;
    let form = multipart::Form::new()
        .part("file", text_part("a.txt", "a"))
        .part("file", text_part("b.txt", "b"));

    let response = app
        .client
        .post(app.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(names(&body), vec!["a.txt", "b.txt"]);
}

#[tokio::test]
async fn multi_upload_reports_each_file_and_continues_after_a_failure() {
    let app = TestApp::spawn().await;
    let broken = app.create_folder("sub", None).await;
    app.gateway.fail_id(&broken).await;
    let form = multipart::Form::new()
        .part("file", text_part("ok.txt", "fine"))
        .text("relativePath", "ok.txt")
        .part("file", text_part("bad.txt", "lost"))
        .text("relativePath", "sub/bad.txt")
        .part("file", text_part("after.txt", "also fine"))
        .text("relativePath", "after.txt");

    let response = app
        .client
        .post(app.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(names(&body), vec!["ok.txt", "bad.txt", "after.txt"]);
    let outcomes: Vec<bool> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["success"].as_bool().unwrap())
        .collect();
    assert_eq!(outcomes, vec![true, false, true]);
    assert!(body[0]["id"].is_string());
    assert!(body[1]["error"].is_string());
    assert!(body[1].get("id").is_none());

    let (_, root) = app.get_json("/api/files/all").await;
    assert_eq!(names(&root), vec!["sub", "after.txt", "ok.txt"]);
}

#[tokio::test]
async fn relative_path_recreates_directory_structure() {
    let app = TestApp::spawn().await;
    let form = multipart::Form::new()
        .part("file", text_part("a.jpg", "a"))
        .text("relativePath", "photos/2024/a.jpg")
        .part("file", text_part("b.jpg", "b"))
        .text("relativePath", "photos/2024/b.jpg");

    let response = app
        .client
        .post(app.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 201);

    let (_, tree) = app.get_json("/api/folder-tree").await;
    assert_eq!(names(&tree), vec!["photos"]);
    let year = tree[0]["children"][0]["id"].as_str().unwrap().to_string();

    let (_, listing) = app
        .get_json(&format!("/api/files/all?parentId={}", year))
        .await;
    assert_eq!(names(&listing), vec!["a.jpg", "b.jpg"]);
}

#[tokio::test]
async fn mangled_utf8_filenames_are_repaired() {
    let app = TestApp::spawn().await;

    let body = app.upload_text("cafÃ©.txt", "x", None).await;

    assert_eq!(body["name"], "café.txt");
}

#[tokio::test]
async fn too_many_files_is_a_bad_request() {
    let mut config = DriveConfig::in_memory();
    config.upload.max_files = 2;
    let app = TestApp::spawn_with(config).await;

    let form = multipart::Form::new()
        .part("file", text_part("1.txt", "1"))
        .part("file", text_part("2.txt", "2"))
        .part("file", text_part("3.txt", "3"));
    let response = app
        .client
        .post(app.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn oversized_file_is_413() {
    let mut config = DriveConfig::in_memory();
    config.upload.max_file_size = 16;
    let app = TestApp::spawn_with(config).await;

    let form = multipart::Form::new().part("file", text_part("big.txt", &"x".repeat(64)));
    let response = app
        .client
        .post(app.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 413);
}

#[tokio::test]
async fn missing_file_part_is_a_bad_request() {
    let app = TestApp::spawn().await;
    let form = multipart::Form::new().text("parentId", "root");

    let response = app
        .client
        .post(app.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn download_streams_content_with_encoded_filename() {
    let app = TestApp::spawn().await;
    let file = app.upload_text("résumé.txt", "curriculum", None).await;

    let response = app
        .client
        .get(app.url(&format!("/api/download/{}", file["id"].as_str().unwrap())))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename*=UTF-8''r%C3%A9sum%C3%A9.txt"));
    assert_eq!(
        response.headers()["content-security-policy"],
        "default-src 'none'; sandbox"
    );
    assert_eq!(response.text().await.unwrap(), "curriculum");
}

#[tokio::test]
async fn downloading_unknown_id_is_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/api/download/missing"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 404);
}
