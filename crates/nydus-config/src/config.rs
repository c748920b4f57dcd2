//! Process-wide daemon configuration
//!
//! Loaded once from TOML and passed explicitly to every descriptor builder.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{is_valid_log_level, ConfigError, ConfigResult, DaemonMode, LOG_LEVELS};

/// Default root of the snapshotter's on-disk state
pub const DEFAULT_ROOT_DIR: &str = "/var/lib/containerd-nydus";

/// Environment variable overriding [`DaemonConfig::daemon_mode`]
pub const ENV_DAEMON_MODE: &str = "NYDUS_DAEMON_MODE";
/// Environment variable overriding [`DaemonConfig::root_dir`]
pub const ENV_ROOT_DIR: &str = "NYDUS_ROOT_DIR";
/// Environment variable overriding [`DaemonConfig::log_level`]
pub const ENV_LOG_LEVEL: &str = "NYDUS_LOG_LEVEL";

/// Defaults shared by all daemons managed by this process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Mode given to descriptors that do not choose one explicitly
    pub daemon_mode: DaemonMode,
    /// Root under which snapshots, sockets, configs and logs live
    pub root_dir: PathBuf,
    /// Daemon log level
    pub log_level: String,
    /// Send daemon logs to stdout instead of the log file
    pub log_to_stdout: bool,
    /// Worker thread hint; `0` lets the daemon choose
    pub thread_num: i32,
    /// Fixed control socket path, overriding the per-daemon default
    pub api_socket: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            daemon_mode: DaemonMode::default(),
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            log_level: "info".to_string(),
            log_to_stdout: false,
            thread_num: 0,
            api_socket: None,
        }
    }
}

impl DaemonConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|source| ConfigError::Parse { path: None, source })
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading daemon config from {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    /// Apply `NYDUS_*` environment overrides on top of loaded values
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        if let Some(mode) = env_value(ENV_DAEMON_MODE) {
            self.daemon_mode = mode.parse()?;
            debug!("Daemon mode overridden from environment: {}", self.daemon_mode);
        }

        if let Some(root) = env_value(ENV_ROOT_DIR) {
            self.root_dir = PathBuf::from(root);
        }

        if let Some(level) = env_value(ENV_LOG_LEVEL) {
            self.log_level = level;
        }

        Ok(())
    }

    /// Check values that serde cannot constrain
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.root_dir.is_absolute() {
            return Err(ConfigError::Validation(format!(
                "root_dir must be absolute, got {:?}",
                self.root_dir
            )));
        }

        if !is_valid_log_level(&self.log_level) {
            return Err(ConfigError::Validation(format!(
                "log_level must be one of {}, got {:?}",
                LOG_LEVELS.join("|"),
                self.log_level
            )));
        }

        if let Some(sock) = &self.api_socket {
            if !sock.is_absolute() {
                return Err(ConfigError::Validation(format!(
                    "api_socket must be absolute, got {:?}",
                    sock
                )));
            }
        }

        Ok(())
    }

    /// Directory holding per-snapshot state (`<root>/snapshots`)
    pub fn snapshots_dir(&self) -> PathBuf {
        self.root_dir.join("snapshots")
    }

    /// Control socket directory of one daemon (`<root>/socket/<id>`)
    pub fn socket_dir(&self, daemon_id: &str) -> PathBuf {
        self.root_dir.join("socket").join(daemon_id)
    }

    /// Config directory of one daemon (`<root>/config/<id>`)
    pub fn config_dir(&self, daemon_id: &str) -> PathBuf {
        self.root_dir.join("config").join(daemon_id)
    }

    /// Log directory of one daemon (`<root>/logs/<id>`)
    pub fn log_dir(&self, daemon_id: &str) -> PathBuf {
        self.root_dir.join("logs").join(daemon_id)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
