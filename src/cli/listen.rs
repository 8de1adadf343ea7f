//! Listen command - print clicks and closes of notifications sent by this process
//!
//! With `--send` a notification is posted first so there is something to click.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use crate::config::ManagerConfig;
use crate::notification::{NotificationEvent, NotificationManager};

use super::send::SendArgs;

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Post this notification before listening
    #[arg(long)]
    pub send: bool,

    #[command(flatten)]
    pub notification: SendArgs,
}

/// Formats an event as one JSON line
pub fn format_event(event: &NotificationEvent) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

pub async fn handle_listen(config: ManagerConfig, args: ListenArgs) -> Result<()> {
    let request = args.notification.into_request(&config);
    let manager =
        NotificationManager::connect(config).context("failed to connect to the session bus")?;

    let handle = manager
        .start_listening(|event| {
            println!("{}", format_event(event)?);
            Ok(())
        })
        .context("failed to start listener")?;

    if args.send {
        let id = manager.send(&request).context("failed to send notification")?;
        info!(id, "Notification sent, waiting for events");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut check = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("failed to wait for Ctrl-C")?;
                info!("Stopping listener");
                break;
            }
            _ = check.tick() => {
                if handle.is_finished() {
                    warn!("Listener stopped on its own");
                    break;
                }
            }
        }
    }

    tokio::task::spawn_blocking(move || handle.shutdown())
        .await
        .context("listener task failed")?
        .context("listener ended with an error")?;
    Ok(())
}
