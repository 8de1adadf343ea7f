//! dbus-notify - post, update, close and react to desktop notifications over D-Bus

pub mod cli;
pub mod config;
pub mod notification;

pub use config::{ManagerConfig, Verbosity};
pub use notification::{
    ActionPair, CloseReason, CloseTarget, EventKind, ListenerError, ListenerHandle,
    NotificationEvent, NotificationManager, NotificationRecord, NotificationRequest, NotifyError,
    Timeout, Urgency,
};
