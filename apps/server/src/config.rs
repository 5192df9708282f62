//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SMARTPOS_PORT=9000                                                 │
//! │     SMARTPOS_JWT_SECRET=...                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $SMARTPOS_CONFIG, or                                               │
//! │     ~/.config/smartpos/smartpos.toml (Linux)                           │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "./smartpos.db"
//! max_connections = 5
//!
//! [sales]
//! allow_negative_stock = true
//! default_credit_days = 30
//! loyalty_unit_cents = 100000
//!
//! [auth]
//! jwt_secret = "change-me"
//!
//! [identity]
//! max_attempts = 5
//! initial_interval_ms = 200
//! ```

use serde::{Deserialize, Serialize};
use smartpos_core::SalePolicy;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SMARTPOS_CONFIG";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available")]
    NoPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address (default: 0.0.0.0 for all interfaces).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Created on first start.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./smartpos.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HS256 secret shared with the identity provider.
    #[serde(default)]
    pub jwt_secret: String,
}

/// Lookup of the local user behind a fresh token.
///
/// The identity provider creates the user row asynchronously, so the first
/// request of a new account may arrive before it exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_interval")]
    pub initial_interval_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_interval() -> u64 {
    200
}

impl Default for IdentitySettings {
    fn default() -> Self {
        IdentitySettings {
            max_attempts: default_max_attempts(),
            initial_interval_ms: default_initial_interval(),
        }
    }
}

impl IdentitySettings {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub sales: SalePolicy,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub identity: IdentitySettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (smartpos.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading server config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Server config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret must be set (or SMARTPOS_JWT_SECRET)".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.identity.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "identity.max_attempts must be greater than 0".into(),
            ));
        }

        if self.sales.loyalty_unit_cents <= 0 {
            return Err(ConfigError::Invalid(
                "sales.loyalty_unit_cents must be greater than 0".into(),
            ));
        }

        if self.sales.default_credit_days <= 0 {
            return Err(ConfigError::Invalid(
                "sales.default_credit_days must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("SMARTPOS_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Ok(port) = std::env::var("SMARTPOS_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding port from environment");
                    self.server.port = p;
                }
                Err(_) => warn!(port = %port, "Ignoring invalid SMARTPOS_PORT"),
            }
        }

        if let Ok(path) = std::env::var("SMARTPOS_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(secret) = std::env::var("SMARTPOS_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Ok(allow) = std::env::var("SMARTPOS_ALLOW_NEGATIVE_STOCK") {
            match allow.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.sales.allow_negative_stock = true,
                "0" | "false" | "no" => self.sales.allow_negative_stock = false,
                _ => warn!(value = %allow, "Unknown SMARTPOS_ALLOW_NEGATIVE_STOCK value"),
            }
        }
    }

    /// Returns the config file path: `$SMARTPOS_CONFIG`, else the platform
    /// config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        directories::ProjectDirs::from("com", "smartpos", "server")
            .map(|dirs| dirs.config_dir().join("smartpos.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.auth.jwt_secret = "secret".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.sales.allow_negative_stock);
        assert_eq!(config.sales.default_credit_days, 30);
        assert_eq!(config.identity.max_attempts, 5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServerConfig::default();
        // No secret
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "secret".to_string();
        assert!(config.validate().is_ok());

        config.identity.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.sales.loyalty_unit_cents = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [sales]
            allow_negative_stock = false

            [auth]
            jwt_secret = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert!(!config.sales.allow_negative_stock);
        assert_eq!(config.sales.loyalty_unit_cents, 100_000);
        assert_eq!(config.identity.initial_interval(), Duration::from_millis(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&valid()).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[sales]"));
        assert!(toml_str.contains("[identity]"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("smartpos-config-{}", std::process::id()));
        let path = dir.join("smartpos.toml");

        let mut config = valid();
        config.server.port = 9123;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: ServerConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.server.port, 9123);
        assert_eq!(loaded.auth.jwt_secret, "secret");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bind_address() {
        let settings = ServerSettings::default();
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
    }
}
