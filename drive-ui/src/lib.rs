//! Client side of the drive: API client, session state, the browser
//! controller and the performance helpers it renders through.
pub mod api;
pub mod browser;
pub mod render;
pub mod session;
pub mod thumbnails;
pub mod upload;
pub mod virtual_scroll;

pub use api::{ClientError, DriveApi, DriveApiClient, ListQuery, UploadFile};
pub use browser::{BrowserConfig, BrowserError, FileBrowser, ListingView, RenderedView};
pub use session::{ClipboardMode, SessionState, ViewMode};
pub use upload::{UploadEvent, UploadQueue, UploadReport};
