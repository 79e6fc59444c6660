pub mod drive;
pub mod filename;
pub mod gateway;
pub mod metrics;

pub use drive::{DriveService, ListOptions, TrashListing, UploadRequest};
pub use gateway::{DriveGateway, GoogleDriveGateway, InMemoryGateway};
pub use metrics::{get_metrics, init_metrics};
