//! Error types for daemon descriptors

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::client::BoxError;

/// Control operation a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Query daemon state
    CheckStatus,
    /// Mount a snapshot into the daemon
    Mount,
    /// Unmount a snapshot from the daemon
    Umount,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::CheckStatus => write!(f, "check status"),
            Operation::Mount => write!(f, "mount"),
            Operation::Umount => write!(f, "umount"),
        }
    }
}

/// Daemon descriptor error type
#[derive(Error, Debug)]
pub enum DaemonError {
    /// A builder option rejected its input
    #[error("Invalid daemon option {option}: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    /// Shared mount point requested from a descriptor without a shared root
    #[error("No shared root mount point configured for snapshot {snapshot_id}")]
    NoSharedRoot { snapshot_id: String },

    /// Bootstrap discovery failed
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// The control client could not be constructed
    #[error("failed to {operation}, client has not been initialized: {source}")]
    ClientUnavailable {
        operation: Operation,
        #[source]
        source: BoxError,
    },

    /// The control client call itself failed
    #[error("failed to {operation} for snapshot {snapshot_id}: {source}")]
    Operation {
        operation: Operation,
        snapshot_id: String,
        #[source]
        source: BoxError,
    },
}

impl DaemonError {
    pub(crate) fn invalid_option(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.into(),
        }
    }
}

/// Result type for daemon descriptor operations
pub type DaemonResult<T> = Result<T, DaemonError>;
