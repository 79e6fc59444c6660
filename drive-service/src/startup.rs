use crate::config::{DriveConfig, GatewayBackend};
use crate::handlers;
use crate::services::{
    init_metrics, DriveGateway, DriveService, GoogleDriveGateway, InMemoryGateway,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use service_core::models::UploadLimits;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Multipart framing overhead allowed on top of the raw file bytes.
const BODY_LIMIT_SLACK: u64 = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: DriveConfig,
    pub drive: Arc<DriveService>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

/// Builds the configured gateway backend.
pub fn build_gateway(config: &DriveConfig) -> Result<Arc<dyn DriveGateway>, AppError> {
    match config.gateway.backend {
        GatewayBackend::Memory => {
            tracing::warn!("Using the in-memory gateway; nothing is persisted");
            Ok(Arc::new(InMemoryGateway::new()))
        }
        GatewayBackend::Google => {
            let token = config.gateway.access_token.clone().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("GOOGLE_DRIVE_ACCESS_TOKEN is not set"))
            })?;
            let gateway = GoogleDriveGateway::new(
                &config.gateway.api_base,
                &config.gateway.upload_base,
                token,
                config.drive.list_page_size,
            )
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid gateway setup: {}", e)))?;
            Ok(Arc::new(gateway))
        }
    }
}

impl Application {
    pub async fn build(config: DriveConfig) -> Result<Self, AppError> {
        let gateway = build_gateway(&config)?;
        Self::build_with_gateway(config, gateway).await
    }

    /// Builds the app over a caller-supplied gateway.
    pub async fn build_with_gateway(
        config: DriveConfig,
        gateway: Arc<dyn DriveGateway>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let limits = UploadLimits::new(config.upload.max_file_size, config.upload.max_files);
        let drive = Arc::new(DriveService::new(gateway, config.drive.clone(), limits));

        // Resolving the root eagerly surfaces gateway misconfiguration at boot.
        // A failure is not fatal: /ready keeps reporting it until it clears.
        if let Err(e) = drive.ensure_root().await {
            tracing::error!(error = %e, "Failed to resolve the app root folder");
        }

        let state = AppState {
            config: config.clone(),
            drive,
        };

        let app = router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn drive(&self) -> &Arc<DriveService> {
        &self.state.drive
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

pub fn router(state: AppState) -> Router {
    let max_upload = state
        .config
        .upload
        .max_file_size
        .saturating_mul(state.config.upload.max_files as u64)
        .saturating_add(BODY_LIMIT_SLACK);
    let body_limit = usize::try_from(max_upload).unwrap_or(usize::MAX);

    let api = Router::new()
        .route("/api/storage", get(handlers::storage))
        .route("/api/upload-config", get(handlers::upload_config))
        .route("/api/files", get(handlers::list_files))
        .route("/api/files/all", get(handlers::list_all_files))
        .route("/api/folderinfo/:id", get(handlers::folder_info))
        .route("/api/folder-tree", get(handlers::folder_tree))
        .route("/api/create-folder", post(handlers::create_folder))
        .route(
            "/api/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/download/:id", get(handlers::download))
        .route("/api/delete/:id", delete(handlers::delete_item))
        .route("/api/rename/:id", put(handlers::rename_item))
        .route("/api/search", get(handlers::search))
        .route("/api/trash", get(handlers::list_trash))
        .route("/api/restore/:id", post(handlers::restore_item))
        .route("/api/permanent-delete/:id", delete(handlers::permanent_delete))
        .route("/api/empty-trash", delete(handlers::empty_trash))
        .route("/api/move", post(handlers::move_files))
        .route("/api/copy", post(handlers::copy_files));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(api)
        // Route layer so MatchedPath is available for metric labels
        .route_layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
