use serde::{Deserialize, Serialize};

/// MIME type the gateway uses to mark folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A file or folder as surfaced to the UI.
///
/// Entries are value objects rebuilt from the gateway on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    /// First parent only; the gateway allows several but the UI is a tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_link: Option<String>,
    /// Only set in trash listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trashed_time: Option<String>,
    /// Human-readable location hint, only set on search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl FileEntry {
    pub fn extension(&self) -> Option<&str> {
        if self.is_folder {
            return None;
        }
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderInfo {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub is_folder: bool,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageQuota {
    /// Absent for unlimited accounts.
    pub limit: Option<u64>,
    pub usage: u64,
    pub usage_in_drive: u64,
    pub usage_in_drive_trash: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLimits {
    pub max_file_size: u64,
    pub max_files: usize,
    #[serde(rename = "maxFileSizeMB")]
    pub max_file_size_mb: u64,
}

impl UploadLimits {
    pub fn new(max_file_size: u64, max_files: usize) -> Self {
        Self {
            max_file_size,
            max_files,
            max_file_size_mb: max_file_size / (1024 * 1024),
        }
    }
}

/// Outcome of one item inside a batch operation (move, copy, empty-trash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Items below a copied folder that could not be copied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_children: Vec<BatchResult>,
}

impl BatchResult {
    pub fn ok(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
            success: true,
            error: None,
            failed_children: Vec::new(),
        }
    }

    pub fn with_failed_children(mut self, failed: Vec<BatchResult>) -> Self {
        self.failed_children = failed;
        self
    }

    pub fn failed(id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            id: id.into(),
            name: None,
            success: false,
            error: Some(error.to_string()),
            failed_children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> FileEntry {
        FileEntry {
            id: "1".into(),
            name: name.into(),
            is_folder: false,
            mime_type: "text/plain".into(),
            size: Some(3),
            modified_time: None,
            parent_id: None,
            share_link: None,
            trashed_time: None,
            path: None,
        }
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_fields() {
        let json = serde_json::to_value(file("a.txt")).unwrap();
        assert_eq!(json["isFolder"], false);
        assert_eq!(json["mimeType"], "text/plain");
        assert!(json.get("shareLink").is_none());
        assert!(json.get("trashedTime").is_none());
    }

    #[test]
    fn upload_limits_expose_megabytes() {
        let limits = UploadLimits::new(100 * 1024 * 1024, 10);
        let json = serde_json::to_value(limits).unwrap();
        assert_eq!(json["maxFileSizeMB"], 100);
        assert_eq!(json["maxFiles"], 10);
    }

    #[test]
    fn extension_ignores_folders_and_trailing_dots() {
        assert_eq!(file("report.PDF").extension(), Some("PDF"));
        assert_eq!(file("trailing.").extension(), None);
        let mut folder = file("dir.d");
        folder.is_folder = true;
        assert_eq!(folder.extension(), None);
    }
}
