//! # Node Configuration
//!
//! Unified configuration for the services and the runtime. Loaded from an
//! optional TOML file (`PAS_CONFIG`), then overridden by environment
//! variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PAS_AUTH_SECRET` | `security.auth_secret` (64 hex chars) |
//! | `PAS_HTTP_PORT` | `gateway.http.port` |
//! | `PAS_DATA_DIR` | `storage.data_dir` |
//! | `PAS_STORAGE_BACKEND` | `storage.backend` |
//! | `PAS_LOG_JSON` | `logging.json` |
//!
//! ## Security Requirements
//!
//! - `auth_secret` MUST NOT be the all-zero default outside `dev_mode`
//! - Every field has a default, so an empty file is a valid config

use chrono::Duration as ChronoDuration;
use pas_02_qr_codec::RenderOptions;
use pas_04_batch_lifecycle::LifecycleConfig;
use pas_05_verification::VerificationConfig;
use pas_06_api_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use shared_crypto::{AuthSecret, CryptoError};
use shared_store::DatabaseConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_CONFIG_PATH: &str = "PAS_CONFIG";
pub const ENV_AUTH_SECRET: &str = "PAS_AUTH_SECRET";
pub const ENV_HTTP_PORT: &str = "PAS_HTTP_PORT";
pub const ENV_DATA_DIR: &str = "PAS_DATA_DIR";
pub const ENV_STORAGE_BACKEND: &str = "PAS_STORAGE_BACKEND";
pub const ENV_LOG_JSON: &str = "PAS_LOG_JSON";

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// HTTP listener, timeouts, CORS and body limits.
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub production: ProductionConfig,
    pub verification: VerificationSettings,
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Read `PAS_CONFIG` (if set) and apply environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_AUTH_SECRET) {
            AuthSecret::from_hex(&secret).map_err(ConfigError::InvalidAuthSecret)?;
            self.security.auth_secret = Some(secret.trim().to_string());
        }

        if let Some(port) = lookup(ENV_HTTP_PORT) {
            self.gateway.http.port = parse_env(ENV_HTTP_PORT, &port)?;
        }

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Some(backend) = lookup(ENV_STORAGE_BACKEND) {
            self.storage.backend = parse_env(ENV_STORAGE_BACKEND, &backend)?;
        }

        if let Some(json) = lookup(ENV_LOG_JSON) {
            self.logging.json = match json.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: ENV_LOG_JSON,
                        value: json,
                    })
                }
            };
        }

        Ok(())
    }

    /// The configured secret, or the all-zero default when none is set.
    pub fn auth_secret(&self) -> Result<AuthSecret, ConfigError> {
        match &self.security.auth_secret {
            Some(hex) => AuthSecret::from_hex(hex).map_err(ConfigError::InvalidAuthSecret),
            None => Ok(AuthSecret::default()),
        }
    }

    /// Validate configuration for production readiness.
    ///
    /// # Returns
    ///
    /// Returns `Err` if:
    /// - the auth secret is missing or the all-zero value
    /// - the auth secret is not 64 hex chars
    /// - a gateway or production limit is zero
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.auth_secret()?.is_zero() {
            return Err(ConfigError::InsecureAuthSecret);
        }
        Ok(())
    }

    /// Checks that hold in every mode, dev included.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway.validate()?;
        self.auth_secret()?;
        if self.production.max_batch_quantity == 0 {
            return Err(ConfigError::Invalid(
                "production.max_batch_quantity cannot be 0".into(),
            ));
        }
        if self.storage.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "storage.lock_timeout_ms cannot be 0".into(),
            ));
        }
        Ok(())
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            lock_timeout: Duration::from_millis(self.storage.lock_timeout_ms),
        }
    }

    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            max_batch_quantity: self.production.max_batch_quantity,
            default_shelf_life_days: self.production.default_shelf_life_days,
            qr: RenderOptions {
                min_dimension: self.production.qr_min_dimension,
                quiet_zone: true,
            },
        }
    }

    pub fn verification_config(&self) -> VerificationConfig {
        VerificationConfig {
            duplicate_grace_window: ChronoDuration::seconds(
                self.verification.duplicate_grace_window_secs as i64,
            ),
            scan_history_limit: self.verification.scan_history_limit,
        }
    }
}

fn parse_env<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Auth secret is not set (zero value).
    #[error(
        "SECURITY VIOLATION: auth secret is the default zero value. \
         Set PAS_AUTH_SECRET or security.auth_secret, or enable security.dev_mode."
    )]
    InsecureAuthSecret,

    #[error("Invalid auth secret: {0}")]
    InvalidAuthSecret(#[source] CryptoError),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Gateway(#[from] pas_06_api_gateway::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
    RocksDb,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::File => "file",
            StorageBackend::RocksDb => "rocksdb",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            "rocksdb" => Ok(StorageBackend::RocksDb),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Data directory for the persistent backends.
    pub data_dir: PathBuf,
    /// How long a transaction waits for a row lock.
    pub lock_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from("./data"),
            lock_timeout_ms: 5_000,
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Hex-encoded 32-byte secret keying unit auth hashes.
    /// MUST be set in production.
    pub auth_secret: Option<String>,
    /// Start with the zero secret, logging a warning instead of refusing.
    pub dev_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    pub max_batch_quantity: u32,
    /// Expiry offset when neither request nor product gives one.
    pub default_shelf_life_days: u32,
    /// Minimum rendered QR size in pixels.
    pub qr_min_dimension: u32,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        let lifecycle = LifecycleConfig::default();
        Self {
            max_batch_quantity: lifecycle.max_batch_quantity,
            default_shelf_life_days: lifecycle.default_shelf_life_days,
            qr_min_dimension: lifecycle.qr.min_dimension,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationSettings {
    /// A rescan from a new context counts as a duplicate only after this.
    pub duplicate_grace_window_secs: u64,
    pub scan_history_limit: usize,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            duplicate_grace_window_secs: 3600,
            scan_history_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: "info".to_string(),
        }
    }
}
