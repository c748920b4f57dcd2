//! Daemon descriptor: identity, path layout and control delegation

use std::path::{Component, Path, PathBuf};

use nydus_config::{is_valid_log_level, DaemonConfig, DaemonMode, LOG_LEVELS};
use tracing::debug;
use uuid::Uuid;

use crate::bootstrap;
use crate::client::{ClientFactory, ControlClient, DaemonInfo};
use crate::error::{DaemonError, DaemonResult, Operation};

/// Control socket file name inside the socket directory
pub const API_SOCKET_FILE_NAME: &str = "api.sock";
/// Daemon config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";
/// Daemon stderr log file name inside the log directory
pub const LOG_FILE_NAME: &str = "stderr.log";
/// Fixed id of the single daemon in shared mode
pub const SHARED_DAEMON_ID: &str = "shared_daemon";

/// Where a daemon mounts its snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MountStrategy {
    /// `<snapshot_dir>/<snapshot_id>/fs`
    #[default]
    Default,
    /// Sub-mount under a root shared by all snapshots of a shared daemon
    SharedRoot(PathBuf),
    /// Caller-chosen mount point, used verbatim
    Custom(PathBuf),
}

/// A single configuration step applied by [`Daemon::new`]
#[derive(Debug, Clone)]
pub enum DaemonOption {
    Id(String),
    SnapshotId(String),
    ImageId(String),
    ConfigDir(PathBuf),
    SocketDir(PathBuf),
    LogDir(PathBuf),
    SnapshotDir(PathBuf),
    LogLevel(String),
    LogToStdout(bool),
    Mode(DaemonMode),
    RootMountPoint(PathBuf),
    CustomMountPoint(PathBuf),
    ApiSocket(PathBuf),
    /// Non-positive values leave the thread count unset
    ThreadNum(i32),
}

/// Runtime descriptor of one nydus daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Daemon {
    id: String,
    snapshot_id: String,
    image_id: String,
    config_dir: PathBuf,
    socket_dir: PathBuf,
    log_dir: PathBuf,
    snapshot_dir: PathBuf,
    log_level: String,
    log_to_stdout: bool,
    pid: Option<u32>,
    mode: DaemonMode,
    mount: MountStrategy,
    api_sock: Option<PathBuf>,
    thread_num: Option<u32>,
}

impl Daemon {
    /// Build a descriptor by applying `options` in order
    ///
    /// The descriptor starts with a fresh id and `default_mode`. The first
    /// option that rejects its input aborts construction.
    pub fn new(
        default_mode: DaemonMode,
        options: impl IntoIterator<Item = DaemonOption>,
    ) -> DaemonResult<Self> {
        let mut daemon = Self {
            id: Uuid::new_v4().simple().to_string(),
            snapshot_id: String::new(),
            image_id: String::new(),
            config_dir: PathBuf::new(),
            socket_dir: PathBuf::new(),
            log_dir: PathBuf::new(),
            snapshot_dir: PathBuf::new(),
            log_level: "info".to_string(),
            log_to_stdout: false,
            pid: None,
            mode: default_mode,
            mount: MountStrategy::Default,
            api_sock: None,
            thread_num: None,
        };

        for option in options {
            daemon.apply(option)?;
        }

        if daemon.snapshot_id.is_empty() {
            return Err(DaemonError::invalid_option("snapshot_id", "must be set"));
        }

        Ok(daemon)
    }

    /// Start a builder using `default_mode` for unset modes
    pub fn builder(default_mode: DaemonMode) -> DaemonBuilder {
        DaemonBuilder::new(default_mode)
    }

    fn apply(&mut self, option: DaemonOption) -> DaemonResult<()> {
        match option {
            DaemonOption::Id(id) => self.id = validate_id("id", id)?,
            DaemonOption::SnapshotId(id) => self.snapshot_id = validate_id("snapshot_id", id)?,
            DaemonOption::ImageId(id) => {
                if id.is_empty() {
                    return Err(DaemonError::invalid_option("image_id", "must not be empty"));
                }
                self.image_id = id;
            }
            DaemonOption::ConfigDir(dir) => self.config_dir = validate_abs("config_dir", dir)?,
            DaemonOption::SocketDir(dir) => self.socket_dir = validate_abs("socket_dir", dir)?,
            DaemonOption::LogDir(dir) => self.log_dir = validate_abs("log_dir", dir)?,
            DaemonOption::SnapshotDir(dir) => {
                self.snapshot_dir = validate_abs("snapshot_dir", dir)?
            }
            DaemonOption::LogLevel(level) => {
                if !is_valid_log_level(&level) {
                    return Err(DaemonError::invalid_option(
                        "log_level",
                        format!("{:?} is not one of {}", level, LOG_LEVELS.join("|")),
                    ));
                }
                self.log_level = level;
            }
            DaemonOption::LogToStdout(enabled) => self.log_to_stdout = enabled,
            DaemonOption::Mode(mode) => self.mode = mode,
            DaemonOption::RootMountPoint(root) => {
                self.mount = MountStrategy::SharedRoot(validate_abs("root_mount_point", root)?);
            }
            DaemonOption::CustomMountPoint(point) => {
                let point = validate_abs("custom_mount_point", point)?;
                // A shared root always takes precedence
                if !matches!(self.mount, MountStrategy::SharedRoot(_)) {
                    self.mount = MountStrategy::Custom(point);
                }
            }
            DaemonOption::ApiSocket(sock) => {
                self.api_sock = Some(validate_abs("api_socket", sock)?);
            }
            DaemonOption::ThreadNum(n) => {
                self.thread_num = u32::try_from(n).ok().filter(|n| *n > 0);
            }
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn snapshot_id(&self) -> &str {
        &self.snapshot_id
    }

    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn socket_dir(&self) -> &Path {
        &self.socket_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn log_to_stdout(&self) -> bool {
        self.log_to_stdout
    }

    pub fn mode(&self) -> DaemonMode {
        self.mode
    }

    pub fn mount_strategy(&self) -> &MountStrategy {
        &self.mount
    }

    /// Process id of the running daemon, if the supervisor recorded one
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Record the daemon's process id; owned by the process supervisor
    pub fn set_pid(&mut self, pid: u32) {
        self.pid = Some(pid).filter(|p| *p != 0);
    }

    pub fn clear_pid(&mut self) {
        self.pid = None;
    }

    pub fn has_pid(&self) -> bool {
        self.pid.is_some()
    }

    /// Relocate the control socket; the path must be absolute
    pub fn set_api_sock(&mut self, sock: impl Into<PathBuf>) -> DaemonResult<()> {
        self.api_sock = Some(validate_abs("api_socket", sock.into())?);
        Ok(())
    }

    pub fn is_multiple_daemon(&self) -> bool {
        self.mode == DaemonMode::Multiple
    }

    pub fn is_shared_daemon(&self) -> bool {
        self.mode == DaemonMode::Shared
    }

    pub fn is_prefetch_daemon(&self) -> bool {
        self.mode == DaemonMode::Prefetch
    }

    /// `<snapshot_dir>/<snapshot_id>/fs`
    fn snapshot_fs_dir(&self) -> PathBuf {
        debug_assert!(!self.snapshot_id.is_empty(), "path derived without snapshot id");
        self.snapshot_dir.join(&self.snapshot_id).join("fs")
    }

    /// `<root_mount_point>/<snapshot_id>/fs`; requires a shared root
    pub fn shared_mount_point(&self) -> DaemonResult<PathBuf> {
        debug_assert!(!self.snapshot_id.is_empty(), "path derived without snapshot id");
        match &self.mount {
            MountStrategy::SharedRoot(root) => Ok(root.join(&self.snapshot_id).join("fs")),
            MountStrategy::Default | MountStrategy::Custom(_) => Err(DaemonError::NoSharedRoot {
                snapshot_id: self.snapshot_id.clone(),
            }),
        }
    }

    /// Mount point as seen by the daemon
    ///
    /// Relative to the shared root (`/<snapshot_id>/fs`) for shared daemons,
    /// the custom point verbatim when one is set, the per-snapshot default
    /// otherwise.
    pub fn mount_point(&self) -> PathBuf {
        match &self.mount {
            MountStrategy::SharedRoot(_) => {
                debug_assert!(!self.snapshot_id.is_empty(), "path derived without snapshot id");
                Path::new("/").join(&self.snapshot_id).join("fs")
            }
            MountStrategy::Custom(point) => point.clone(),
            MountStrategy::Default => self.snapshot_fs_dir(),
        }
    }

    /// Pre-multi-mode mount point, ignoring shared/custom strategies
    pub fn old_mount_point(&self) -> PathBuf {
        self.snapshot_fs_dir()
    }

    pub fn bootstrap_file(&self) -> Result<PathBuf, bootstrap::BootstrapError> {
        bootstrap::bootstrap_file(&self.snapshot_dir, &self.snapshot_id)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    pub fn api_sock(&self) -> PathBuf {
        match &self.api_sock {
            Some(sock) => sock.clone(),
            None => self.socket_dir.join(API_SOCKET_FILE_NAME),
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    /// Value for the daemon's `--thread-num`; empty means "omit the option"
    pub fn nydusd_thread_num(&self) -> String {
        self.thread_num.map(|n| n.to_string()).unwrap_or_default()
    }

    fn client<F: ClientFactory>(
        &self,
        factory: &F,
        operation: Operation,
    ) -> DaemonResult<F::Client> {
        let sock = self.api_sock();
        factory
            .connect(&sock)
            .map_err(|source| DaemonError::ClientUnavailable { operation, source })
    }

    /// Ask the daemon for its current status
    pub fn check_status<F: ClientFactory>(&self, factory: &F) -> DaemonResult<DaemonInfo> {
        let client = self.client(factory, Operation::CheckStatus)?;
        debug!(
            daemon_id = %self.id,
            snapshot_id = %self.snapshot_id,
            "Checking daemon status via {:?}",
            self.api_sock()
        );

        client.check_status().map_err(|source| DaemonError::Operation {
            operation: Operation::CheckStatus,
            snapshot_id: self.snapshot_id.clone(),
            source,
        })
    }

    /// Mount this snapshot's bootstrap into a shared daemon
    pub fn shared_mount<F: ClientFactory>(&self, factory: &F) -> DaemonResult<()> {
        let client = self.client(factory, Operation::Mount)?;
        let bootstrap = self.bootstrap_file()?;
        let mount_point = self.mount_point();
        let config = self.config_file();

        debug!(
            daemon_id = %self.id,
            snapshot_id = %self.snapshot_id,
            "Mounting {:?} at {:?} with config {:?}",
            bootstrap,
            mount_point,
            config
        );

        client
            .shared_mount(&mount_point, &bootstrap, &config)
            .map_err(|source| DaemonError::Operation {
                operation: Operation::Mount,
                snapshot_id: self.snapshot_id.clone(),
                source,
            })
    }

    /// Remove this snapshot's mount from a shared daemon
    pub fn shared_umount<F: ClientFactory>(&self, factory: &F) -> DaemonResult<()> {
        let client = self.client(factory, Operation::Umount)?;
        let mount_point = self.mount_point();

        debug!(
            daemon_id = %self.id,
            snapshot_id = %self.snapshot_id,
            "Unmounting {:?}",
            mount_point
        );

        client.umount(&mount_point).map_err(|source| DaemonError::Operation {
            operation: Operation::Umount,
            snapshot_id: self.snapshot_id.clone(),
            source,
        })
    }
}

fn validate_id(option: &'static str, id: String) -> DaemonResult<String> {
    if id.is_empty() {
        return Err(DaemonError::invalid_option(option, "must not be empty"));
    }

    let mut components = Path::new(&id).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == id.as_str()
    );

    if single {
        Ok(id)
    } else {
        Err(DaemonError::invalid_option(
            option,
            format!("{:?} must be a single path component", id),
        ))
    }
}

fn validate_abs(option: &'static str, path: PathBuf) -> DaemonResult<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Err(DaemonError::invalid_option(
            option,
            format!("{:?} must be an absolute path", path),
        ))
    }
}

/// Collects [`DaemonOption`]s and builds a [`Daemon`]
#[derive(Debug, Clone)]
pub struct DaemonBuilder {
    default_mode: DaemonMode,
    options: Vec<DaemonOption>,
}

impl DaemonBuilder {
    pub fn new(default_mode: DaemonMode) -> Self {
        Self {
            default_mode,
            options: Vec::new(),
        }
    }

    /// Builder pre-populated from the process configuration
    ///
    /// Fixes the daemon id up front so the per-daemon socket, config and log
    /// directories can be derived from it.
    pub fn from_config(config: &DaemonConfig, snapshot_id: impl Into<String>) -> Self {
        Self::from_config_with_id(config, Uuid::new_v4().simple().to_string(), snapshot_id)
    }

    /// The single daemon serving every snapshot in shared mode
    pub fn shared(config: &DaemonConfig, snapshot_id: impl Into<String>) -> Self {
        Self::from_config_with_id(config, SHARED_DAEMON_ID.to_string(), snapshot_id)
            .mode(DaemonMode::Shared)
    }

    fn from_config_with_id(
        config: &DaemonConfig,
        id: String,
        snapshot_id: impl Into<String>,
    ) -> Self {
        let mut builder = Self::new(config.daemon_mode)
            .socket_dir(config.socket_dir(&id))
            .config_dir(config.config_dir(&id))
            .log_dir(config.log_dir(&id))
            .id(id)
            .snapshot_id(snapshot_id)
            .snapshot_dir(config.snapshots_dir())
            .log_level(config.log_level.clone())
            .log_to_stdout(config.log_to_stdout)
            .thread_num(config.thread_num);

        if let Some(sock) = &config.api_socket {
            builder = builder.api_socket(sock.clone());
        }
        builder
    }

    pub fn option(mut self, option: DaemonOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.option(DaemonOption::Id(id.into()))
    }

    pub fn snapshot_id(self, id: impl Into<String>) -> Self {
        self.option(DaemonOption::SnapshotId(id.into()))
    }

    pub fn image_id(self, id: impl Into<String>) -> Self {
        self.option(DaemonOption::ImageId(id.into()))
    }

    pub fn config_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.option(DaemonOption::ConfigDir(dir.into()))
    }

    pub fn socket_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.option(DaemonOption::SocketDir(dir.into()))
    }

    pub fn log_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.option(DaemonOption::LogDir(dir.into()))
    }

    pub fn snapshot_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.option(DaemonOption::SnapshotDir(dir.into()))
    }

    pub fn log_level(self, level: impl Into<String>) -> Self {
        self.option(DaemonOption::LogLevel(level.into()))
    }

    pub fn log_to_stdout(self, enabled: bool) -> Self {
        self.option(DaemonOption::LogToStdout(enabled))
    }

    pub fn mode(self, mode: DaemonMode) -> Self {
        self.option(DaemonOption::Mode(mode))
    }

    pub fn root_mount_point(self, root: impl Into<PathBuf>) -> Self {
        self.option(DaemonOption::RootMountPoint(root.into()))
    }

    pub fn custom_mount_point(self, point: impl Into<PathBuf>) -> Self {
        self.option(DaemonOption::CustomMountPoint(point.into()))
    }

    pub fn api_socket(self, sock: impl Into<PathBuf>) -> Self {
        self.option(DaemonOption::ApiSocket(sock.into()))
    }

    pub fn thread_num(self, n: i32) -> Self {
        self.option(DaemonOption::ThreadNum(n))
    }

    pub fn build(self) -> DaemonResult<Daemon> {
        Daemon::new(self.default_mode, self.options)
    }
}
