//! # Nydus Daemon Configuration
//!
//! Process-wide settings shared by every daemon descriptor: the default
//! [`DaemonMode`], the on-disk layout root, and the logging and threading
//! defaults handed to each daemon.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nydus_config::DaemonConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = DaemonConfig::load_from_file("/etc/nydus/daemon.toml")?;
//!     config.apply_env_overrides()?;
//!     config.validate()?;
//!     println!("default mode: {}", config.daemon_mode);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod mode;

pub use config::*;
pub use error::{ConfigError, ConfigResult};
pub use mode::DaemonMode;

/// Log levels accepted by the daemon.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Check whether `level` is one of [`LOG_LEVELS`].
pub fn is_valid_log_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level)
}
