//! Info command - show what the notification daemon supports

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::config::ManagerConfig;
use crate::notification::{NotificationManager, ServerInformation};

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct InfoOutput {
    pub server: ServerInformation,
    pub capabilities: Vec<String>,
}

pub fn handle_info(config: ManagerConfig, args: InfoArgs) -> Result<()> {
    let manager =
        NotificationManager::connect(config).context("failed to connect to the session bus")?;
    let output = InfoOutput {
        server: manager.server_information().context("GetServerInformation failed")?,
        capabilities: manager.capabilities().context("GetCapabilities failed")?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {} ({})", output.server.name, output.server.version, output.server.vendor);
        println!("  spec version: {}", output.server.spec_version);
        println!("  capabilities: {}", output.capabilities.join(", "));
    }
    Ok(())
}
