//! dbus-notify CLI
//!
//! Sends desktop notifications through org.freedesktop.Notifications

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use dbus_notify::{
    cli::{
        handle_close, handle_info, handle_listen, handle_send, CloseArgs, InfoArgs, ListenArgs,
        SendArgs,
    },
    ManagerConfig, Verbosity,
};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "dbus-notify")]
#[command(about = "Sends a notification")]
#[command(version)]
struct Cli {
    /// Application name sent to the daemon, also the action namespace
    #[arg(long, global = true)]
    app_name: Option<String>,

    /// Config file (default: ~/.config/dbus-notify/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send or update a notification
    Send(SendArgs),
    /// Close a notification
    Close(CloseArgs),
    /// Print button clicks and closes as JSON lines until Ctrl-C
    Listen(ListenArgs),
    /// Show daemon information and capabilities
    Info(InfoArgs),
}

fn verbosity_from_count(count: u8) -> Option<Verbosity> {
    match count {
        0 => None,
        1 => Some(Verbosity::Info),
        2 => Some(Verbosity::Debug),
        _ => Some(Verbosity::Trace),
    }
}

fn load_config(cli: &Cli) -> Result<ManagerConfig> {
    let mut config = match &cli.config {
        Some(path) => ManagerConfig::load_from(path)?,
        None => ManagerConfig::load().context("failed to load config")?,
    };

    if let Some(app_name) = &cli.app_name {
        config = config.with_app_name(app_name.as_str());
    }
    if let Some(verbosity) = verbosity_from_count(cli.verbose) {
        config = config.with_verbosity(verbosity);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise -v raises the level
    let default_directive = match verbosity_from_count(cli.verbose) {
        None => "dbus_notify=warn",
        Some(Verbosity::Info) => "dbus_notify=info",
        Some(Verbosity::Debug) => "dbus_notify=debug",
        Some(_) => "dbus_notify=trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let config = load_config(&cli)?;
    debug!(app_name = %config.app_name, "Loaded configuration");

    match cli.command {
        Commands::Send(args) => handle_send(config, args)?,
        Commands::Close(args) => handle_close(config, args)?,
        Commands::Listen(args) => handle_listen(config, args).await?,
        Commands::Info(args) => handle_info(config, args)?,
    }

    Ok(())
}
