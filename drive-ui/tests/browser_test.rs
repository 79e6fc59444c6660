mod common;

use common::{names, TestDrive};
use drive_ui::session::Mode;
use drive_ui::{BrowserConfig, ClipboardMode, DriveApi, ListingView, ViewMode};
use futures::future::join_all;
use service_core::models::{SortField, SortOrder};

#[tokio::test]
async fn folders_open_and_breadcrumbs_lead_back() {
    let drive = TestDrive::spawn().await;
    let docs = drive.folder("Docs", None).await;
    drive.file("a.txt", "a", Some(&docs)).await;
    drive.file("z.txt", "z", None).await;
    let mut browser = drive.browser(BrowserConfig::default());

    assert!(browser.refresh().await.unwrap());
    assert_eq!(names(browser.entries()), vec!["Docs", "z.txt"]);

    browser.open_folder(&docs, Some("Docs")).await.unwrap();
    assert_eq!(names(browser.entries()), vec!["a.txt"]);
    let crumbs: Vec<_> = browser.session().breadcrumbs().iter().map(|c| c.name.clone()).collect();
    assert_eq!(crumbs, vec!["MiniDrive", "Docs"]);

    browser.navigate_breadcrumb(0).await.unwrap();
    assert_eq!(browser.session().breadcrumbs().len(), 1);
    assert_eq!(names(browser.entries()), vec!["Docs", "z.txt"]);
}

#[tokio::test]
async fn opening_an_unnamed_folder_resolves_its_name_and_quota() {
    let drive = TestDrive::spawn().await;
    let photos = drive.folder("Photos", None).await;
    drive.file("a.jpg", "abc", Some(&photos)).await;
    let mut browser = drive.browser(BrowserConfig::default());
    assert!(browser.quota().is_none());

    browser.open_folder(&photos, None).await.unwrap();

    let crumbs: Vec<_> = browser.session().breadcrumbs().iter().map(|c| c.name.clone()).collect();
    assert_eq!(crumbs, vec!["MiniDrive", "Photos"]);
    assert_eq!(browser.session().folder_name(&photos), Some("Photos"));
    assert_eq!(browser.quota().unwrap().usage_in_drive, 3);
}

#[tokio::test]
async fn deleting_several_items_reports_each_outcome() {
    let drive = TestDrive::spawn().await;
    let a = drive.file("a.txt", "a", None).await;
    let b = drive.file("b.txt", "b", None).await;
    drive.file("c.txt", "c", None).await;
    let mut browser = drive.browser(BrowserConfig::default());
    browser.refresh().await.unwrap();
    browser.session_mut().toggle_selection(&a);
    browser.session_mut().toggle_selection(&b);
    browser.session_mut().toggle_selection("missing");
    drive.gateway.fail_id(&b).await;

    let results = browser.delete_selected().await.unwrap();

    let outcomes: Vec<(&str, bool)> = results.iter().map(|r| (r.id.as_str(), r.success)).collect();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.contains(&(a.as_str(), true)));
    assert!(outcomes.contains(&(b.as_str(), false)));
    assert!(outcomes.contains(&("missing", false)));
    assert_eq!(names(browser.entries()), vec!["b.txt", "c.txt"]);
}

#[tokio::test]
async fn late_response_for_an_abandoned_folder_is_discarded() {
    let drive = TestDrive::spawn().await;
    let slow = drive.folder("Slow", None).await;
    let fast = drive.folder("Fast", None).await;
    drive.file("old.txt", "x", Some(&slow)).await;
    drive.file("new.txt", "y", Some(&fast)).await;
    let mut browser = drive.browser(BrowserConfig::default());

    let first = browser.begin_open_folder(&slow, Some("Slow"));
    let second = browser.begin_open_folder(&fast, Some("Fast"));
    let first_listing = browser.fetch(&first).await.unwrap();
    let second_listing = browser.fetch(&second).await.unwrap();

    assert!(browser.apply(second.ticket, second_listing));
    assert!(!browser.apply(first.ticket, first_listing));
    assert_eq!(names(browser.entries()), vec!["new.txt"]);
    assert_eq!(browser.session().current_folder(), fast);
}

#[tokio::test]
async fn search_shows_a_banner_and_exit_returns_to_the_folder() {
    let drive = TestDrive::spawn().await;
    let docs = drive.folder("Docs", None).await;
    drive.file("report-2024.txt", "r", Some(&docs)).await;
    drive.file("notes.txt", "n", None).await;
    let mut browser = drive.browser(BrowserConfig::default());
    browser.open_folder(&docs, Some("Docs")).await.unwrap();

    browser.search("REPORT").await.unwrap();
    assert!(browser.session().is_searching());
    assert_eq!(names(browser.entries()), vec!["report-2024.txt"]);
    assert_eq!(browser.entries()[0].path.as_deref(), Some("MiniDrive/Docs"));

    let view = browser.render().unwrap();
    assert!(view.header.contains("1 result for"));

    browser.exit_search().await.unwrap();
    assert_eq!(browser.session().mode(), &Mode::Browse);
    assert_eq!(browser.session().current_folder(), docs);
    assert!(browser.render().unwrap().header.contains("breadcrumbs"));
}

#[tokio::test]
async fn blank_search_leaves_search_mode() {
    let drive = TestDrive::spawn().await;
    let mut browser = drive.browser(BrowserConfig::default());
    browser.search("x").await.unwrap();

    browser.search("   ").await.unwrap();

    assert!(!browser.session().is_searching());
}

#[tokio::test]
async fn cut_and_paste_moves_the_selection() {
    let drive = TestDrive::spawn().await;
    let target = drive.folder("Target", None).await;
    let file = drive.file("move-me.txt", "m", None).await;
    let mut browser = drive.browser(BrowserConfig::default());
    browser.refresh().await.unwrap();

    browser.session_mut().toggle_selection(&file);
    assert!(browser.stage(ClipboardMode::Cut));
    browser.open_folder(&target, Some("Target")).await.unwrap();
    let results = browser.paste().await.unwrap();

    assert!(results.iter().all(|r| r.success));
    assert_eq!(names(browser.entries()), vec!["move-me.txt"]);
    assert!(browser.session().clipboard().is_none());
    assert!(browser.paste().await.is_err());
}

#[tokio::test]
async fn copy_can_be_pasted_repeatedly() {
    let drive = TestDrive::spawn().await;
    let target = drive.folder("Target", None).await;
    let file = drive.file("copy-me.txt", "c", None).await;
    let mut browser = drive.browser(BrowserConfig::default());

    browser.session_mut().toggle_selection(&file);
    browser.stage(ClipboardMode::Copy);
    browser.open_folder(&target, Some("Target")).await.unwrap();
    browser.paste().await.unwrap();
    browser.paste().await.unwrap();

    assert_eq!(browser.entries().len(), 2);
    assert!(browser.entries().iter().all(|e| e.name == "Copy of copy-me.txt"));
}

#[tokio::test]
async fn dropping_a_folder_onto_itself_is_ignored() {
    let drive = TestDrive::spawn().await;
    let folder = drive.folder("Box", None).await;
    let file = drive.file("item.txt", "i", None).await;
    let mut browser = drive.browser(BrowserConfig::default());
    browser.refresh().await.unwrap();

    let results = browser.drop_onto(&[folder.clone()], &folder).await.unwrap();
    assert!(results.is_empty());

    let results = browser
        .drop_onto(&[file.clone(), folder.clone()], &folder)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(names(browser.entries()), vec!["Box"]);
}

#[tokio::test]
async fn deleting_the_selection_sends_it_to_trash() {
    let drive = TestDrive::spawn().await;
    let a = drive.file("a.txt", "aaaa", None).await;
    drive.file("b.txt", "bb", None).await;
    let mut browser = drive.browser(BrowserConfig::default());
    browser.refresh().await.unwrap();

    browser.session_mut().toggle_selection(&a);
    let results = browser.delete_selected().await.unwrap();

    assert!(results[0].success);
    assert!(browser.session().selection().is_empty());
    assert_eq!(names(browser.entries()), vec!["b.txt"]);
    let trash = drive.api.trash().await.unwrap();
    assert_eq!(names(&trash.files), vec!["a.txt"]);
    assert_eq!(browser.quota().unwrap().usage_in_drive_trash, 4);
}

#[tokio::test]
async fn sorting_by_the_same_field_twice_reverses() {
    let drive = TestDrive::spawn().await;
    drive.file("small.txt", "1", None).await;
    drive.file("large.txt", "1234567890", None).await;
    drive.folder("Folder", None).await;
    let mut browser = drive.browser(BrowserConfig::default());

    browser.change_sort(SortField::Size).await.unwrap();
    assert_eq!(browser.session().sort(), (SortField::Size, SortOrder::Asc));
    assert_eq!(names(browser.entries()), vec!["Folder", "small.txt", "large.txt"]);

    browser.change_sort(SortField::Size).await.unwrap();
    assert_eq!(names(browser.entries()), vec!["Folder", "large.txt", "small.txt"]);
}

#[tokio::test]
async fn paged_listings_render_a_pagination_bar() {
    let drive = TestDrive::spawn().await;
    for i in 0..5 {
        drive.file(&format!("file{}.txt", i), "x", None).await;
    }
    let mut browser = drive.browser(BrowserConfig {
        page_limit: Some(2),
        ..BrowserConfig::default()
    });

    browser.go_to_page(2).await.unwrap();

    assert_eq!(names(browser.entries()), vec!["file2.txt", "file3.txt"]);
    let pagination = browser.pagination().unwrap();
    assert_eq!(pagination.total_pages, 3);
    assert!(browser.render().unwrap().pagination.contains("Page 2 of 3"));
}

#[tokio::test]
async fn large_folders_render_through_the_virtual_scroller() {
    let drive = TestDrive::spawn().await;
    let parent = drive.folder("Big", None).await;
    join_all((0..520).map(|i| {
        let api = drive.api.clone();
        let parent = parent.clone();
        async move {
            api.create_folder(&format!("f{:04}", i), Some(&parent))
                .await
                .expect("Failed to create folder");
        }
    }))
    .await;

    let mut browser = drive.browser(BrowserConfig {
        page_limit: None,
        ..BrowserConfig::default()
    });
    browser.open_folder(&parent, Some("Big")).await.unwrap();
    assert_eq!(browser.entries().len(), 520);

    let view = browser.render().unwrap();
    match &view.listing {
        ListingView::Virtual { frame, markup } => {
            assert_eq!(frame.total_height, 520.0 * 48.0);
            assert_eq!(markup.matches("file-row").count(), frame.range.len());
            assert!(frame.range.len() < 40);
        }
        ListingView::Full(_) => panic!("expected a virtual listing"),
    }

    assert_eq!(browser.toggle_view(), ViewMode::Grid);
    let view = browser.render().unwrap();
    assert!(view.listing.markup().contains("file-card"));
}
