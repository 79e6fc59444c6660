//! service-core: shared infrastructure for the mini-drive services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod observability;

pub use async_trait;
pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tower;
pub use tower_http;
pub use tracing;
pub use validator;
