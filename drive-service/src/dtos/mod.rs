pub mod batch;
pub mod files;

pub use batch::BatchRequest;
pub use files::{CreateFolderRequest, ListFilesParams, RenameRequest, SearchParams};
