//! Drive value types shared by the API server and the UI client.
pub mod entry;
pub mod folder_tree;
pub mod pagination;
pub mod responses;
pub mod sort;

pub use entry::{BatchResult, FOLDER_MIME_TYPE, FileEntry, FolderInfo, StorageQuota, UploadLimits};
pub use folder_tree::{FolderRecord, FolderTreeNode, build_folder_tree};
pub use pagination::{PaginationState, page_range, paginate};
pub use responses::{
    CreatedFolder, EmptyTrashSummary, FilePage, ItemAck, TrashContents, UploadResult,
    UploadedFile,
};
pub use sort::{SortField, SortOrder, compare_names, sort_entries};
