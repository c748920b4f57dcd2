// nydus-daemon - inspect daemon descriptor layout
//
// Prints the paths a daemon and its clients agree on for a snapshot, and
// locates the snapshot's bootstrap file. Never starts or contacts a daemon.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nydus_daemon::{DaemonBuilder, DaemonConfig, DaemonMode};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nydus-daemon")]
#[command(about = "Inspect nydus daemon descriptor paths")]
#[command(version)]
struct Cli {
    /// Daemon config file (TOML); defaults are used when omitted
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Override the daemon mode (multiple, shared, prefetch, none)
    #[arg(short, long, global = true)]
    mode: Option<DaemonMode>,

    /// Shared root mount point, for shared-mode layouts
    #[arg(long, global = true)]
    root_mount_point: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the derived paths for a snapshot's daemon
    Paths {
        /// Snapshot identifier
        snapshot_id: String,
    },
    /// Locate the bootstrap file for a snapshot
    Bootstrap {
        /// Snapshot identifier
        snapshot_id: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<DaemonConfig> {
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => DaemonConfig::default(),
    };

    config.apply_env_overrides()?;
    if let Some(mode) = cli.mode {
        config.daemon_mode = mode;
    }
    config.validate()?;

    debug!("Using daemon mode {}", config.daemon_mode);
    Ok(config)
}

fn builder(cli: &Cli, config: &DaemonConfig, snapshot_id: &str) -> DaemonBuilder {
    let builder = if config.daemon_mode == DaemonMode::Shared {
        DaemonBuilder::shared(config, snapshot_id)
    } else {
        DaemonBuilder::from_config(config, snapshot_id)
    };

    match &cli.root_mount_point {
        Some(root) => builder.root_mount_point(root.clone()),
        None => builder,
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Paths { snapshot_id } => {
            let daemon = builder(&cli, &config, snapshot_id).build()?;

            println!("id:              {}", daemon.id());
            println!("mode:            {}", daemon.mode());
            println!("mount point:     {}", daemon.mount_point().display());
            if let Ok(shared) = daemon.shared_mount_point() {
                println!("shared mount:    {}", shared.display());
            }
            println!("old mount point: {}", daemon.old_mount_point().display());
            println!("config file:     {}", daemon.config_file().display());
            println!("api socket:      {}", daemon.api_sock().display());
            println!("log file:        {}", daemon.log_file().display());
            println!("thread num:      {}", daemon.nydusd_thread_num());
        }
        Commands::Bootstrap { snapshot_id } => {
            let daemon = builder(&cli, &config, snapshot_id).build()?;
            let bootstrap = daemon.bootstrap_file()?;
            println!("{}", bootstrap.display());
        }
    }

    Ok(())
}
