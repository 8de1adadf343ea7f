//! Urgency levels for desktop notifications
//!
//! The daemon receives the urgency as a byte hint:
//! - LOW (0): background information, may be shown silently
//! - NORMAL (1): the regular case
//! - CRITICAL (2): should not expire on its own

use std::str::FromStr;

use super::error::NotifyError;

/// Urgency level for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }

    /// Value of the `urgency` hint on the wire
    pub fn as_byte(&self) -> u8 {
        match self {
            Urgency::Low => 0,
            Urgency::Normal => 1,
            Urgency::Critical => 2,
        }
    }

    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Urgency::Low),
            1 => Some(Urgency::Normal),
            2 => Some(Urgency::Critical),
            _ => None,
        }
    }
}

impl FromStr for Urgency {
    type Err = NotifyError;

    /// Accepts the level name (case-insensitive) or its numeric value
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let urgency = match normalized.as_str() {
            "low" => Some(Urgency::Low),
            "normal" => Some(Urgency::Normal),
            "critical" => Some(Urgency::Critical),
            digits => digits.parse::<u8>().ok().and_then(Urgency::from_byte),
        };
        urgency.ok_or_else(|| {
            NotifyError::InvalidArgument(format!(
                "unknown urgency '{}', expected low, normal or critical",
                s
            ))
        })
    }
}
