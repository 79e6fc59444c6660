pub mod batch;
pub mod files;
pub mod health;
pub mod transfer;
pub mod trash;

pub use batch::{copy_files, move_files};
pub use files::{
    create_folder, delete_item, folder_info, folder_tree, list_all_files, list_files, rename_item,
    search, storage, upload_config,
};
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use transfer::{download, upload};
pub use trash::{empty_trash, list_trash, permanent_delete, restore_item};
