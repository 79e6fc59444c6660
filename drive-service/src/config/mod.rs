use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_parsed};
use service_core::error::AppError;
use std::env;

const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 10;
const DEFAULT_LIST_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct DriveConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub gateway: GatewayConfig,
    pub drive: DriveSettings,
    pub upload: UploadConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub backend: GatewayBackend,
    pub api_base: String,
    pub upload_base: String,
    /// Bearer token for the Drive API. Obtaining and refreshing it is the
    /// deployment's job.
    pub access_token: Option<Secret<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveSettings {
    /// Name of the top-level folder that confines everything this app manages.
    pub root_folder_name: String,
    /// Page size ceiling for a single children listing.
    pub list_page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_file_size: u64,
    pub max_files: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Origins allowed by CORS. Empty means same-origin only.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayBackend {
    Google,
    Memory,
}

impl DriveConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let mut common_config = core_config::Config::load()?;
        let is_prod = core_config::is_production();

        // Plain LOG_LEVEL / OTLP_ENDPOINT win over the APP__ prefixed keys.
        if let Ok(level) = env::var("LOG_LEVEL") {
            common_config.log_level = level;
        }
        if let Ok(endpoint) = env::var("OTLP_ENDPOINT") {
            common_config.otlp_endpoint = Some(endpoint).filter(|e| !e.is_empty());
        }

        let backend: GatewayBackend = get_env("GATEWAY_BACKEND", Some("google"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let access_token = match backend {
            GatewayBackend::Google => Some(Secret::new(get_env(
                "GOOGLE_DRIVE_ACCESS_TOKEN",
                None,
                is_prod,
            )?)),
            GatewayBackend::Memory => env::var("GOOGLE_DRIVE_ACCESS_TOKEN").ok().map(Secret::new),
        };

        Ok(DriveConfig {
            common: common_config,
            gateway: GatewayConfig {
                backend,
                api_base: get_env(
                    "GOOGLE_DRIVE_API_BASE",
                    Some("https://www.googleapis.com/drive/v3"),
                    is_prod,
                )?,
                upload_base: get_env(
                    "GOOGLE_DRIVE_UPLOAD_BASE",
                    Some("https://www.googleapis.com/upload/drive/v3"),
                    is_prod,
                )?,
                access_token,
            },
            drive: DriveSettings {
                root_folder_name: get_env("DRIVE_ROOT_FOLDER_NAME", Some("MiniDrive"), is_prod)?,
                list_page_size: get_env_parsed(
                    "DRIVE_LIST_PAGE_SIZE",
                    DEFAULT_LIST_PAGE_SIZE,
                    is_prod,
                )?,
            },
            upload: UploadConfig {
                max_file_size: get_env_parsed(
                    "UPLOAD_MAX_FILE_SIZE",
                    DEFAULT_MAX_FILE_SIZE,
                    is_prod,
                )?,
                max_files: get_env_parsed("UPLOAD_MAX_FILES", DEFAULT_MAX_FILES, is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "CORS_ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            },
        })
    }

    /// In-memory configuration for tests and local development.
    pub fn in_memory() -> Self {
        DriveConfig {
            common: core_config::Config {
                port: 0,
                log_level: "info".to_string(),
                otlp_endpoint: None,
            },
            gateway: GatewayConfig {
                backend: GatewayBackend::Memory,
                api_base: String::new(),
                upload_base: String::new(),
                access_token: None,
            },
            drive: DriveSettings {
                root_folder_name: "MiniDrive".to_string(),
                list_page_size: DEFAULT_LIST_PAGE_SIZE,
            },
            upload: UploadConfig {
                max_file_size: DEFAULT_MAX_FILE_SIZE,
                max_files: DEFAULT_MAX_FILES,
            },
            security: SecurityConfig {
                allowed_origins: Vec::new(),
            },
        }
    }
}

impl std::str::FromStr for GatewayBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(GatewayBackend::Google),
            "memory" => Ok(GatewayBackend::Memory),
            _ => Err(format!("Invalid gateway backend: {}", s)),
        }
    }
}
