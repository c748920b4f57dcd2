//! Control-plane client seam
//!
//! The daemon exposes a control API on a local socket. This crate does not
//! speak that transport; it resolves the socket and file paths and hands them
//! to a [`ControlClient`] obtained from a [`ClientFactory`].

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Error type returned by control client implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build information reported by the daemon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildTimeInfo {
    pub package_ver: String,
    pub git_commit: String,
    pub build_time: String,
    pub profile: String,
    pub rustc: String,
}

/// Lifecycle state reported by the daemon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DaemonState {
    Init,
    Ready,
    Running,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Status document returned by the daemon's control API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: BuildTimeInfo,
    #[serde(default)]
    pub state: DaemonState,
}

impl DaemonInfo {
    /// Decode the daemon's JSON status body
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// Daemon has finished starting and is serving mounts
    pub fn is_running(&self) -> bool {
        self.state == DaemonState::Running
    }
}

/// Calls a running daemon's control API
pub trait ControlClient {
    /// Query the daemon's status
    fn check_status(&self) -> Result<DaemonInfo, BoxError>;

    /// Mount `bootstrap` at `mount_point` inside a shared daemon
    fn shared_mount(
        &self,
        mount_point: &Path,
        bootstrap: &Path,
        config: &Path,
    ) -> Result<(), BoxError>;

    /// Remove the mount at `mount_point`
    fn umount(&self, mount_point: &Path) -> Result<(), BoxError>;
}

/// Creates control clients bound to a socket path
pub trait ClientFactory {
    type Client: ControlClient;

    fn connect(&self, api_sock: &Path) -> Result<Self::Client, BoxError>;
}

impl<F, C> ClientFactory for F
where
    F: Fn(&Path) -> Result<C, BoxError>,
    C: ControlClient,
{
    type Client = C;

    fn connect(&self, api_sock: &Path) -> Result<C, BoxError> {
        self(api_sock)
    }
}
