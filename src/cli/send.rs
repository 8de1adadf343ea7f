//! Send command - post or update a notification

use anyhow::{Context, Result};
use clap::Args;

use crate::config::ManagerConfig;
use crate::notification::{ActionPair, NotificationManager, NotificationRequest, Timeout, Urgency};

/// Send command arguments
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Title of the notification
    #[arg(long, short, default_value = "")]
    pub title: String,

    /// Body text of the notification
    #[arg(long, short, default_value = "")]
    pub message: String,

    /// Small icon (icon name or path)
    #[arg(long, short, default_value = "")]
    pub logo: String,

    /// Large image path
    #[arg(long, short)]
    pub image: Option<String>,

    /// Sound file path, or a system sound name like message-new-instant
    #[arg(long, short)]
    pub sound: Option<String>,

    /// Urgency: low, normal or critical
    #[arg(long, short)]
    pub urgency: Option<Urgency>,

    /// Expire timeout in milliseconds, "never" or "default"
    #[arg(long = "timeout", short = 'c', allow_hyphen_values = true)]
    pub timeout: Option<Timeout>,

    /// Action button as id:label (repeatable)
    #[arg(long = "action", short = 'a')]
    pub actions: Vec<ActionPair>,

    /// Bus id of the notification to replace
    #[arg(long)]
    pub id: Option<u32>,

    /// Caller-chosen key; a later send with the same key updates the notification
    #[arg(long)]
    pub unique_id: Option<String>,
}

impl SendArgs {
    pub fn into_request(self, config: &ManagerConfig) -> NotificationRequest {
        NotificationRequest {
            title: self.title,
            body: self.message,
            icon: self.logo,
            image: self.image,
            sound: self.sound,
            actions: self.actions,
            urgency: self.urgency,
            timeout: self.timeout.unwrap_or(config.default_timeout),
            replaces_id: self.id,
            unique_id: self.unique_id,
        }
    }
}

/// Handles the send command; prints the assigned id
pub fn handle_send(config: ManagerConfig, args: SendArgs) -> Result<()> {
    let request = args.into_request(&config);
    let manager =
        NotificationManager::connect(config).context("failed to connect to the session bus")?;

    let id = manager.send(&request).context("failed to send notification")?;
    println!("{}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SendArgs,
    }

    #[test]
    fn test_parse_send_args() {
        let cli = TestCli::try_parse_from([
            "send", "-t", "Build", "-m", "done", "-u", "critical", "-c", "never",
            "-a", "open:Open", "-a", "retry", "--unique-id", "build",
        ])
        .unwrap();

        let request = cli.args.into_request(&ManagerConfig::default());
        assert_eq!(request.title, "Build");
        assert_eq!(request.body, "done");
        assert_eq!(request.urgency, Some(Urgency::Critical));
        assert_eq!(request.timeout, Timeout::Never);
        assert_eq!(
            request.actions,
            vec![ActionPair::new("open", "Open"), ActionPair::new("retry", "retry")]
        );
        assert_eq!(request.unique_id(), Some("build"));
    }

    #[test]
    fn test_default_timeout_from_config() {
        let cli = TestCli::try_parse_from(["send", "-t", "x"]).unwrap();
        let config = ManagerConfig {
            default_timeout: Timeout::Millis(4000),
            ..ManagerConfig::default()
        };
        assert_eq!(cli.args.into_request(&config).timeout, Timeout::Millis(4000));
    }

    #[test]
    fn test_negative_timeout_means_default() {
        let cli = TestCli::try_parse_from(["send", "-c", "-1"]).unwrap();
        let config = ManagerConfig {
            default_timeout: Timeout::Never,
            ..ManagerConfig::default()
        };
        assert_eq!(cli.args.into_request(&config).timeout, Timeout::Default);
    }

    #[test]
    fn test_rejects_bad_urgency() {
        assert!(TestCli::try_parse_from(["send", "-u", "urgent"]).is_err());
    }
}
