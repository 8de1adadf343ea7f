//! Close command - close a notification by bus id

use anyhow::{Context, Result};
use clap::Args;

use crate::config::ManagerConfig;
use crate::notification::{CloseTarget, NotificationManager};

/// Close command arguments
#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Bus id of the notification. Unique ids only resolve within one process,
    /// so from the command line they never match.
    pub target: CloseTarget,
}

pub fn handle_close(config: ManagerConfig, args: CloseArgs) -> Result<()> {
    let manager =
        NotificationManager::connect(config).context("failed to connect to the session bus")?;
    let id = manager.close(args.target).context("failed to close notification")?;
    println!("{}", id);
    Ok(())
}
