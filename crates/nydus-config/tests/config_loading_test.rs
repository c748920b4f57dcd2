//! File loading and environment override tests

use nydus_config::{
    ConfigError, DaemonConfig, DaemonMode, ENV_DAEMON_MODE, ENV_LOG_LEVEL, ENV_ROOT_DIR,
};
use serial_test::serial;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    std::env::remove_var(ENV_DAEMON_MODE);
    std::env::remove_var(ENV_ROOT_DIR);
    std::env::remove_var(ENV_LOG_LEVEL);
}

#[test]
fn test_load_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("daemon.toml");
    std::fs::write(
        &path,
        r#"
daemon_mode = "prefetch"
root_dir = "/srv/nydus"
log_level = "debug"
log_to_stdout = true
api_socket = "/run/nydus/api.sock"
"#,
    )
    .unwrap();

    let config = DaemonConfig::load_from_file(&path).unwrap();
    assert_eq!(config.daemon_mode, DaemonMode::Prefetch);
    assert_eq!(config.root_dir, PathBuf::from("/srv/nydus"));
    assert_eq!(config.log_level, "debug");
    assert!(config.log_to_stdout);
    assert_eq!(config.api_socket, Some(PathBuf::from("/run/nydus/api.sock")));
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_reports_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("absent.toml");

    let err = DaemonConfig::load_from_file(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, source } => {
            assert_eq!(reported, path);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn test_invalid_toml_reports_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.toml");
    std::fs::write(&path, "daemon_mode = [").unwrap();

    let err = DaemonConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { path: Some(ref p), .. } if p == &path));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var(ENV_DAEMON_MODE, "shared");
    std::env::set_var(ENV_ROOT_DIR, "/tmp/nydus-root");
    std::env::set_var(ENV_LOG_LEVEL, "warn");

    let mut config = DaemonConfig::default();
    config.apply_env_overrides().unwrap();
    clear_env();

    assert_eq!(config.daemon_mode, DaemonMode::Shared);
    assert_eq!(config.root_dir, PathBuf::from("/tmp/nydus-root"));
    assert_eq!(config.log_level, "warn");
}

#[test]
#[serial]
fn test_invalid_env_mode_is_error() {
    clear_env();
    std::env::set_var(ENV_DAEMON_MODE, "bogus");

    let mut config = DaemonConfig::default();
    let result = config.apply_env_overrides();
    clear_env();

    assert!(matches!(result, Err(ConfigError::InvalidDaemonMode(ref s)) if s == "bogus"));
    assert_eq!(config.daemon_mode, DaemonMode::Multiple);
}

#[test]
#[serial]
fn test_blank_env_is_ignored() {
    clear_env();
    std::env::set_var(ENV_DAEMON_MODE, "  ");

    let mut config = DaemonConfig::default();
    config.apply_env_overrides().unwrap();
    clear_env();

    assert_eq!(config.daemon_mode, DaemonMode::Multiple);
}
