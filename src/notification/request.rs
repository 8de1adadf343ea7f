//! Outgoing notification request

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::NotifyError;
use super::urgency::Urgency;

/// Expiration timeout of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Timeout {
    /// Let the daemon decide (-1 on the wire)
    #[default]
    Default,
    /// Never expire (0 on the wire)
    Never,
    /// Expire after the given number of milliseconds
    Millis(u32),
}

impl Timeout {
    pub fn as_i32(&self) -> i32 {
        match self {
            Timeout::Default => -1,
            Timeout::Never => 0,
            Timeout::Millis(ms) => i32::try_from(*ms).unwrap_or(i32::MAX),
        }
    }
}

impl From<i32> for Timeout {
    fn from(value: i32) -> Self {
        match value {
            v if v < 0 => Timeout::Default,
            0 => Timeout::Never,
            v => Timeout::Millis(v as u32),
        }
    }
}

impl From<Timeout> for i32 {
    fn from(timeout: Timeout) -> Self {
        timeout.as_i32()
    }
}

impl FromStr for Timeout {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Timeout::Default),
            "never" => Ok(Timeout::Never),
            other => other.parse::<i32>().map(Timeout::from).map_err(|_| {
                NotifyError::InvalidArgument(format!(
                    "invalid timeout '{}', expected milliseconds, 'never' or 'default'",
                    s
                ))
            }),
        }
    }
}

/// A clickable button: machine id and the label shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPair {
    pub id: String,
    pub label: String,
}

impl ActionPair {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl FromStr for ActionPair {
    type Err = NotifyError;

    /// Parses `id:label`; a bare `id` is used as its own label
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, label) = s.split_once(':').unwrap_or((s, s));
        if id.is_empty() {
            return Err(NotifyError::InvalidArgument(format!("action '{}' has an empty id", s)));
        }
        Ok(ActionPair::new(id, label))
    }
}

/// Everything needed to post or update one notification
#[derive(Debug, Clone, Default)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    /// Icon name or path shown next to the title
    pub icon: String,
    /// Path of a large image
    pub image: Option<String>,
    /// Sound file path, or a named system sound when it holds no '/'
    pub sound: Option<String>,
    pub actions: Vec<ActionPair>,
    pub urgency: Option<Urgency>,
    pub timeout: Timeout,
    /// Bus id of a notification to replace; `None` or 0 creates a new one
    pub replaces_id: Option<u32>,
    /// Caller-chosen key used to find and update an earlier notification
    pub unique_id: Option<String>,
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    pub fn with_action(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.actions.push(ActionPair::new(id, label));
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    pub fn with_timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_replaces_id(mut self, id: u32) -> Self {
        self.replaces_id = Some(id);
        self
    }

    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    /// The unique id, when set to something non-empty
    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref().filter(|uid| !uid.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_wire_values() {
        assert_eq!(Timeout::Default.as_i32(), -1);
        assert_eq!(Timeout::Never.as_i32(), 0);
        assert_eq!(Timeout::Millis(5000).as_i32(), 5000);
        assert_eq!(Timeout::Millis(u32::MAX).as_i32(), i32::MAX);
    }

    #[test]
    fn test_timeout_from_str() {
        assert_eq!("never".parse::<Timeout>().unwrap(), Timeout::Never);
        assert_eq!("Default".parse::<Timeout>().unwrap(), Timeout::Default);
        assert_eq!("-1".parse::<Timeout>().unwrap(), Timeout::Default);
        assert_eq!("0".parse::<Timeout>().unwrap(), Timeout::Never);
        assert_eq!("2500".parse::<Timeout>().unwrap(), Timeout::Millis(2500));
        assert!("soon".parse::<Timeout>().is_err());
    }

    #[test]
    fn test_action_pair_from_str() {
        let pair: ActionPair = "open:Open file".parse().unwrap();
        assert_eq!(pair, ActionPair::new("open", "Open file"));

        let pair: ActionPair = "dismiss".parse().unwrap();
        assert_eq!(pair, ActionPair::new("dismiss", "dismiss"));

        assert!(":label".parse::<ActionPair>().is_err());
    }

    #[test]
    fn test_request_builder() {
        let request = NotificationRequest::new("Build", "finished")
            .with_icon("dialog-information")
            .with_action("open", "Open")
            .with_urgency(Urgency::Critical)
            .with_unique_id("build-1");

        assert_eq!(request.title, "Build");
        assert_eq!(request.actions.len(), 1);
        assert_eq!(request.unique_id(), Some("build-1"));
        assert_eq!(request.timeout, Timeout::Default);
    }

    #[test]
    fn test_empty_unique_id_is_unset() {
        let request = NotificationRequest::new("a", "b").with_unique_id("");
        assert_eq!(request.unique_id(), None);
    }
}
