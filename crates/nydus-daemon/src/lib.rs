//! Nydus Daemon Descriptor
//!
//! Describes one out-of-process nydus filesystem daemon backing a container
//! image snapshot:
//!
//! - [`Daemon`]: identity, directory layout and runtime handles, built through
//!   [`DaemonBuilder`]
//! - [`bootstrap_file`]: locates the image boot metadata across the current and
//!   legacy on-disk layouts
//! - [`ControlClient`]/[`ClientFactory`]: the seam through which status, mount
//!   and unmount calls reach the daemon's control socket
//!
//! Process supervision and the control transport live outside this crate.

pub mod bootstrap;
pub mod client;
pub mod daemon;
pub mod error;

pub use bootstrap::{bootstrap_file, BootstrapError, BOOTSTRAP_FILE_NAME};
pub use client::{BoxError, BuildTimeInfo, ClientFactory, ControlClient, DaemonInfo, DaemonState};
pub use daemon::{
    Daemon, DaemonBuilder, DaemonOption, MountStrategy, API_SOCKET_FILE_NAME, CONFIG_FILE_NAME,
    LOG_FILE_NAME, SHARED_DAEMON_ID,
};
pub use error::{DaemonError, DaemonResult, Operation};

pub use nydus_config::{DaemonConfig, DaemonMode};
