//! Error types for the notification client

use thiserror::Error;

/// Errors surfaced by the notification manager and its transport
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The bus call could not be completed (bus unreachable, daemon error, connection dropped)
    #[error("D-Bus transport failure: {0}")]
    Transport(String),

    /// A unique id given to `close` does not belong to any live notification
    #[error("no notification found for unique id '{0}'")]
    UnresolvedUniqueId(String),

    /// An inbound message does not have the expected signal shape
    #[error("unexpected signal payload: {0}")]
    Decode(String),

    /// A value given on the command line or in a config file could not be parsed
    #[error("invalid value: {0}")]
    InvalidArgument(String),

    /// The configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<dbus::Error> for NotifyError {
    fn from(err: dbus::Error) -> Self {
        let message = err.message().unwrap_or("unknown error");
        match err.name() {
            Some(name) => NotifyError::Transport(format!("{}: {}", name, message)),
            None => NotifyError::Transport(message.to_string()),
        }
    }
}

/// Errors that terminate the signal listener
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The match rules for the notification signals could not be installed
    #[error("failed to subscribe to notification signals: {0}")]
    Subscribe(#[source] NotifyError),

    /// The listening connection is no longer usable
    #[error("listener connection lost: {0}")]
    TransportFatal(String),

    /// The listener thread panicked outside of the user callback
    #[error("listener thread panicked")]
    Panicked,
}
