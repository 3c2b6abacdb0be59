//! Operator configuration file handling.
//!
//! TOML format, stored under the platform data directory. The `[server]`
//! table is optional: with no server configured the upload engine performs
//! no network activity and reports a no-op pass.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::AccountId;
use crate::uploader::ServerInfo;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level operator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FieldpostConfig {
    /// Target server; absent means uploads are disabled.
    pub server: Option<ServerConfig>,

    /// Upload delivery log.
    #[serde(default)]
    pub upload_log: UploadLogConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The remote server this account delivers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Human-chosen label, echoed into the upload log.
    pub label: String,

    /// The server's account id.
    pub account_id: String,

    /// Transport endpoint, host:port.
    pub address: String,
}

impl ServerConfig {
    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            label: self.label.clone(),
            account: AccountId(self.account_id.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UploadLogConfig {
    /// When false, no log file is ever created.
    #[serde(default)]
    pub enabled: bool,

    /// Log file path; defaults to `upload.log` next to the config file.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl FieldpostConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a TOML file, creating parent directories as
    /// needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Generate default configuration content with comments.
    pub fn generate_default_toml() -> String {
        r#"# Fieldpost client configuration
#
# Uploads stay disabled until a [server] table is configured. With no
# server, the upload engine performs no network activity.

# [server]
# Human-chosen server label (recorded in the upload log)
# label = "hq relay"
# Server account id
# account_id = "..."
# Transport endpoint
# address = "relay.example.org:4780"

[upload_log]
# Record each successful delivery (3 lines per record: local id, server
# label, title). The file is created on the first logged delivery.
enabled = false
# path = "/var/lib/fieldpost/upload.log"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"
"#
        .to_string()
    }

    /// Write a default configuration file.
    pub fn create_default(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, Self::generate_default_toml()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolved upload log path: explicit, or `upload.log` adjacent to the
    /// config file.
    pub fn upload_log_path(&self, config_path: &Path) -> PathBuf {
        self.upload_log.path.clone().unwrap_or_else(|| {
            config_path
                .parent()
                .unwrap_or(Path::new("."))
                .join("upload.log")
        })
    }
}

/// Default config file location: `<data dir>/fieldpost/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fieldpost")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_have_no_server_and_logging_off() {
        let config = FieldpostConfig::default();
        assert!(config.server.is_none());
        assert!(!config.upload_log.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = FieldpostConfig {
            server: Some(ServerConfig {
                label: "hq relay".to_string(),
                account_id: "aabb".to_string(),
                address: "127.0.0.1:4780".to_string(),
            }),
            upload_log: UploadLogConfig {
                enabled: true,
                path: None,
            },
            logging: LoggingConfig::default(),
        };
        config.save(&path).unwrap();

        let loaded = FieldpostConfig::load(&path).unwrap();
        let server = loaded.server.unwrap();
        assert_eq!(server.label, "hq relay");
        assert_eq!(server.address, "127.0.0.1:4780");
        assert!(loaded.upload_log.enabled);
    }

    #[test]
    fn minimal_file_gets_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = FieldpostConfig::load(&path).unwrap();
        assert!(config.server.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn default_toml_parses_with_uploads_disabled() {
        let contents = FieldpostConfig::generate_default_toml();
        let config: FieldpostConfig = toml::from_str(&contents).unwrap();
        assert!(config.server.is_none());
        assert!(!config.upload_log.enabled);
    }

    #[test]
    fn upload_log_path_defaults_next_to_config() {
        let config = FieldpostConfig::default();
        let path = config.upload_log_path(Path::new("/data/fieldpost/config.toml"));
        assert_eq!(path, PathBuf::from("/data/fieldpost/upload.log"));
    }
}
