mod common;

use common::{names, TestDrive};
use drive_ui::upload::UploadError;
use drive_ui::{DriveApi, UploadEvent, UploadFile, UploadQueue};
use service_core::models::{SortField, SortOrder, UploadLimits};

fn text(name: &str, content: &str) -> UploadFile {
    UploadFile::new(name, "text/plain", content.as_bytes().to_vec())
}

#[tokio::test]
async fn batch_uploads_in_order_and_reports_progress() {
    let drive = TestDrive::spawn().await;
    let limits = drive.api.upload_config().await.unwrap();
    let mut queue = UploadQueue::new(limits);
    let mut events = queue.subscribe();

    let report = queue
        .run(
            drive.api.as_ref(),
            vec![text("one.txt", "1"), text("two.txt", "22")],
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(matches!(&seen[0], UploadEvent::Started { index: 0, total: 2, .. }));
    assert!(matches!(&seen[1], UploadEvent::Completed { index: 0, .. }));
    assert_eq!(
        seen[2],
        UploadEvent::Progress {
            settled_bytes: 1,
            total_bytes: 3
        }
    );
    assert!(matches!(&seen[3], UploadEvent::Started { index: 1, .. }));
    assert_eq!(
        seen.last(),
        Some(&UploadEvent::Finished {
            succeeded: 2,
            failed: 0
        })
    );
}

#[tokio::test]
async fn oversized_file_fails_locally_and_the_batch_continues() {
    let drive = TestDrive::spawn().await;
    let queue = UploadQueue::new(UploadLimits::new(4, 10));

    let report = queue
        .run(
            drive.api.as_ref(),
            vec![text("big.txt", "too large"), text("ok.txt", "ok")],
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcomes[0].result,
        Err(UploadError::TooLarge { .. })
    ));
    let uploaded: Vec<_> = report.uploaded().map(|f| f.name.clone()).collect();
    assert_eq!(uploaded, vec!["ok.txt"]);

    let listing = drive
        .api
        .list_all(None, SortField::Name, SortOrder::Asc)
        .await
        .unwrap();
    assert_eq!(names(&listing), vec!["ok.txt"]);
}

#[tokio::test]
async fn too_many_files_are_rejected_before_any_request() {
    let drive = TestDrive::spawn().await;
    let queue = UploadQueue::new(UploadLimits::new(1024, 1));

    let result = queue
        .run(
            drive.api.as_ref(),
            vec![text("a.txt", "a"), text("b.txt", "b")],
            None,
        )
        .await;

    assert_eq!(result, Err(UploadError::TooManyFiles { count: 2, max: 1 }));
    assert!(drive.api.search("txt").await.unwrap().is_empty());
}

#[tokio::test]
async fn dropped_directories_recreate_their_folders() {
    let drive = TestDrive::spawn().await;
    let queue = UploadQueue::new(drive.api.upload_config().await.unwrap());
    let mut first = text("a.jpg", "a");
    first.relative_path = Some("photos/2024/a.jpg".to_string());
    let mut second = text("b.jpg", "b");
    second.relative_path = Some("photos/2024/b.jpg".to_string());

    let report = queue
        .run(drive.api.as_ref(), vec![first, second], None)
        .await
        .unwrap();
    assert_eq!(report.succeeded(), 2);

    let root = drive
        .api
        .list_all(None, SortField::Name, SortOrder::Asc)
        .await
        .unwrap();
    assert_eq!(names(&root), vec!["photos"]);

    let results = drive.api.search(".jpg").await.unwrap();
    assert_eq!(names(&results), vec!["a.jpg", "b.jpg"]);
    assert!(results
        .iter()
        .all(|e| e.path.as_deref() == Some("MiniDrive/photos/2024")));
}

#[tokio::test]
async fn non_ascii_names_survive_the_round_trip() {
    let drive = TestDrive::spawn().await;
    let queue = UploadQueue::new(drive.api.upload_config().await.unwrap());

    let report = queue
        .run(drive.api.as_ref(), vec![text("résumé 履歴書.txt", "cv")], None)
        .await
        .unwrap();

    assert_eq!(
        report.uploaded().next().map(|f| f.name.as_str()),
        Some("résumé 履歴書.txt")
    );
}
