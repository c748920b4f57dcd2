//! Bootstrap (image boot metadata) discovery
//!
//! Two layout generations exist under a snapshot's `fs` directory:
//!
//! - current: `<storage>/<snapshot>/fs/image/image.boot`
//! - legacy:  `<storage>/<snapshot>/fs/image.boot`
//!
//! The current layout is probed first. The legacy path is only consulted when
//! the current one is reported missing; any other probe failure is returned
//! as-is so permission problems are never mistaken for absence.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// File name of the bootstrap in both layouts
pub const BOOTSTRAP_FILE_NAME: &str = "image.boot";

/// Subdirectory of `fs` holding the bootstrap in the current layout
const IMAGE_DIR: &str = "image";

/// Bootstrap discovery failure
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Neither layout has a bootstrap file
    #[error("failed to find bootstrap file for ID {snapshot_id}: {source}")]
    NotFound {
        snapshot_id: String,
        /// Last path probed
        legacy: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A probe failed for a reason other than absence
    #[error("failed to find bootstrap file for ID {snapshot_id}: {path:?}: {source}")]
    Io {
        snapshot_id: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BootstrapError {
    /// True when the bootstrap is genuinely absent from both layouts
    pub fn is_not_found(&self) -> bool {
        matches!(self, BootstrapError::NotFound { .. })
    }

    /// Snapshot the lookup was for
    pub fn snapshot_id(&self) -> &str {
        match self {
            BootstrapError::NotFound { snapshot_id, .. }
            | BootstrapError::Io { snapshot_id, .. } => snapshot_id,
        }
    }
}

/// Current-layout bootstrap path for a snapshot
pub fn bootstrap_path(storage_dir: &Path, snapshot_id: &str) -> PathBuf {
    storage_dir
        .join(snapshot_id)
        .join("fs")
        .join(IMAGE_DIR)
        .join(BOOTSTRAP_FILE_NAME)
}

/// Legacy-layout bootstrap path for a snapshot
pub fn legacy_bootstrap_path(storage_dir: &Path, snapshot_id: &str) -> PathBuf {
    storage_dir
        .join(snapshot_id)
        .join("fs")
        .join(BOOTSTRAP_FILE_NAME)
}

/// Locate the bootstrap file of `snapshot_id` under `storage_dir`
pub fn bootstrap_file(storage_dir: &Path, snapshot_id: &str) -> Result<PathBuf, BootstrapError> {
    let current = bootstrap_path(storage_dir, snapshot_id);

    match std::fs::metadata(&current) {
        Ok(_) => return Ok(current),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No bootstrap at {:?}, trying legacy layout", current);
        }
        Err(source) => {
            return Err(BootstrapError::Io {
                snapshot_id: snapshot_id.to_string(),
                path: current,
                source,
            })
        }
    }

    let legacy = legacy_bootstrap_path(storage_dir, snapshot_id);

    match std::fs::metadata(&legacy) {
        Ok(_) => {
            debug!("Using legacy bootstrap {:?}", legacy);
            Ok(legacy)
        }
        Err(source) if source.kind() == io::ErrorKind::NotFound => Err(BootstrapError::NotFound {
            snapshot_id: snapshot_id.to_string(),
            legacy,
            source,
        }),
        Err(source) => Err(BootstrapError::Io {
            snapshot_id: snapshot_id.to_string(),
            path: legacy,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_current_layout() {
        let tmp = TempDir::new().unwrap();
        let expected = tmp.path().join("s1/fs/image/image.boot");
        touch(&expected);

        assert_eq!(bootstrap_file(tmp.path(), "s1").unwrap(), expected);
    }

    #[test]
    fn test_legacy_layout() {
        let tmp = TempDir::new().unwrap();
        let expected = tmp.path().join("s1/fs/image.boot");
        touch(&expected);

        assert_eq!(bootstrap_file(tmp.path(), "s1").unwrap(), expected);
    }

    #[test]
    fn test_current_wins_over_legacy() {
        let tmp = TempDir::new().unwrap();
        let current = tmp.path().join("s1/fs/image/image.boot");
        touch(&current);
        touch(&tmp.path().join("s1/fs/image.boot"));

        assert_eq!(bootstrap_file(tmp.path(), "s1").unwrap(), current);
    }

    #[test]
    fn test_missing_names_snapshot() {
        let tmp = TempDir::new().unwrap();

        let err = bootstrap_file(tmp.path(), "missing-snap").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.snapshot_id(), "missing-snap");
        assert!(err.to_string().contains("missing-snap"));
        match err {
            BootstrapError::NotFound { legacy, .. } => {
                assert_eq!(legacy, tmp.path().join("missing-snap/fs/image.boot"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_other_probe_error_is_not_collapsed() {
        let tmp = TempDir::new().unwrap();
        // `fs` is a regular file, so probing below it fails with NotADirectory
        touch(&tmp.path().join("s1/fs"));

        let err = bootstrap_file(tmp.path(), "s1").unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(
            err,
            BootstrapError::Io { ref path, .. } if path.ends_with("image/image.boot")
        ));
        assert!(err.to_string().contains("s1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_legacy_probe_error_is_not_collapsed() {
        let tmp = TempDir::new().unwrap();
        let fs_dir = tmp.path().join("s1/fs");
        std::fs::create_dir_all(&fs_dir).unwrap();
        // Current layout is absent; the legacy path is a symlink to itself
        let legacy = fs_dir.join("image.boot");
        std::os::unix::fs::symlink(&legacy, &legacy).unwrap();

        let err = bootstrap_file(tmp.path(), "s1").unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(
            err,
            BootstrapError::Io { ref path, .. } if path.ends_with("fs/image.boot")
        ));
        assert_eq!(err.snapshot_id(), "s1");
        assert!(err.to_string().contains("s1"));
    }
}
