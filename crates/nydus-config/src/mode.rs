//! Daemon operating modes

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How nydus daemons are laid out relative to snapshots
///
/// | Mode | Daemons | Mount strategy |
/// |------|---------|----------------|
/// | Multiple | one per snapshot | per-snapshot mount point |
/// | Shared | one for all snapshots | sub-mounts under a shared root |
/// | Prefetch | one per snapshot, prefetch only | per-snapshot mount point |
/// | None | no dedicated daemon | n/a |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonMode {
    /// One daemon per snapshot
    #[default]
    Multiple,

    /// A single daemon serving every snapshot
    Shared,

    /// Daemon used only to prefetch image data
    Prefetch,

    /// No daemon is managed for the snapshot
    None,
}

impl DaemonMode {
    /// All known modes, in declaration order
    pub const ALL: [DaemonMode; 4] = [
        DaemonMode::Multiple,
        DaemonMode::Shared,
        DaemonMode::Prefetch,
        DaemonMode::None,
    ];

    /// Wire/config name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            DaemonMode::Multiple => "multiple",
            DaemonMode::Shared => "shared",
            DaemonMode::Prefetch => "prefetch",
            DaemonMode::None => "none",
        }
    }
}

impl std::fmt::Display for DaemonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DaemonMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "multiple" => Ok(DaemonMode::Multiple),
            "shared" => Ok(DaemonMode::Shared),
            "prefetch" => Ok(DaemonMode::Prefetch),
            "none" => Ok(DaemonMode::None),
            _ => Err(ConfigError::InvalidDaemonMode(s.to_string())),
        }
    }
}
