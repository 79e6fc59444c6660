//! JSON bodies exchanged between the API server and its clients.

use super::entry::{BatchResult, FileEntry};
use super::pagination::PaginationState;
use serde::{Deserialize, Serialize};

/// One page of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePage {
    pub files: Vec<FileEntry>,
    pub pagination: PaginationState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedFolder {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub share_link: Option<String>,
}

/// Outcome of one file inside a multi-file upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    pub fn failed(name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            name: name.into(),
            success: false,
            id: None,
            share_link: None,
            error: Some(error.to_string()),
        }
    }
}

impl From<UploadedFile> for UploadResult {
    fn from(file: UploadedFile) -> Self {
        Self {
            name: file.name,
            success: true,
            id: Some(file.id),
            share_link: file.share_link,
            error: None,
        }
    }
}

/// Acknowledgement for single-item mutations (delete, restore, purge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAck {
    pub id: String,
    pub success: bool,
}

/// Trash contents. `available` is false when the gateway could not answer any
/// trash query, which is distinct from an empty trash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashContents {
    pub available: bool,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyTrashSummary {
    pub deleted: usize,
    pub failed: usize,
    pub results: Vec<BatchResult>,
}

impl EmptyTrashSummary {
    pub fn from_results(results: Vec<BatchResult>) -> Self {
        let deleted = results.iter().filter(|r| r.success).count();
        Self {
            deleted,
            failed: results.len() - deleted,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trash_summary_counts_outcomes() {
        let summary = EmptyTrashSummary::from_results(vec![
            BatchResult::ok("a", None),
            BatchResult::failed("b", "gone"),
            BatchResult::ok("c", None),
        ]);
        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn upload_results_keep_either_the_file_or_the_error() {
        let stored = serde_json::to_value(UploadResult::from(UploadedFile {
            id: "f1".into(),
            name: "a.txt".into(),
            share_link: None,
        }))
        .unwrap();
        assert_eq!(
            stored,
            serde_json::json!({"name": "a.txt", "success": true, "id": "f1"})
        );

        let failed = serde_json::to_value(UploadResult::failed("b.txt", "quota")).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"name": "b.txt", "success": false, "error": "quota"})
        );
    }

    #[test]
    fn unavailable_trash_serializes_distinctly() {
        let json = serde_json::to_value(TrashContents {
            available: false,
            files: Vec::new(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"available": false, "files": []}));
    }
}
