//! D-Bus transport for the notification daemon
//!
//! `NotificationBus` carries the synchronous call path (Notify, CloseNotification),
//! `SignalSource` the inbound signal stream. The listener needs its own connection
//! because it blocks on receive while the call path keeps doing request/reply.

use std::time::Duration;

use dbus::arg::{ArgType, PropMap, RefArg, Variant};
use dbus::blocking::{Connection, SyncConnection};
use dbus::channel::Sender;
use dbus::message::{MatchRule, MessageType};
use dbus::Message;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::codec::{
    HintValue, InboundMessage, NotifyArgs, SignalArg, SIGNAL_ACTION_INVOKED,
    SIGNAL_NOTIFICATION_CLOSED,
};
use super::error::NotifyError;

pub const NOTIFICATIONS_BUS: &str = "org.freedesktop.Notifications";
pub const NOTIFICATIONS_OBJECT: &str = "/org/freedesktop/Notifications";
pub const NOTIFICATIONS_INTERFACE: &str = "org.freedesktop.Notifications";

/// Answer of `GetServerInformation`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInformation {
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub spec_version: String,
}

/// Outgoing calls to the notification daemon
pub trait NotificationBus: Send + Sync {
    /// Calls `Notify` and waits for the assigned id
    fn notify(&self, args: &NotifyArgs) -> Result<u32, NotifyError>;

    /// Sends `CloseNotification` without waiting for a reply
    fn close_notification(&self, id: u32) -> Result<(), NotifyError>;

    fn server_information(&self) -> Result<ServerInformation, NotifyError>;

    fn capabilities(&self) -> Result<Vec<String>, NotifyError>;
}

#[derive(Debug, Error)]
pub enum RecvError {
    /// A single receive failed but the connection is still up
    #[error("receive failed: {0}")]
    Transient(String),
    /// The connection is gone
    #[error("disconnected: {0}")]
    Disconnected(String),
}

/// Inbound side of the bus
pub trait SignalSource: Send {
    /// Installs the match rules for `ActionInvoked` and `NotificationClosed`
    fn subscribe(&mut self) -> Result<(), NotifyError>;

    /// Waits up to `timeout` for the next message
    fn recv(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, RecvError>;
}

/// Call path over a session bus connection
pub struct DBusBus {
    connection: SyncConnection,
    timeout: Duration,
}

impl DBusBus {
    /// Connects to the session bus; `timeout` bounds every call that expects a reply
    pub fn session(timeout: Duration) -> Result<Self, NotifyError> {
        let connection = SyncConnection::new_session()?;
        Ok(Self {
            connection,
            timeout,
        })
    }
}

fn hints_to_prop_map(hints: &std::collections::BTreeMap<String, HintValue>) -> PropMap {
    hints
        .iter()
        .map(|(key, value)| {
            let value: Box<dyn RefArg> = match value {
                HintValue::Byte(b) => Box::new(*b),
                HintValue::Str(s) => Box::new(s.clone()),
            };
            (key.clone(), Variant(value))
        })
        .collect()
}

impl NotificationBus for DBusBus {
    fn notify(&self, args: &NotifyArgs) -> Result<u32, NotifyError> {
        let proxy = self
            .connection
            .with_proxy(NOTIFICATIONS_BUS, NOTIFICATIONS_OBJECT, self.timeout);

        let actions: Vec<&str> = args.actions.iter().map(String::as_str).collect();
        let (id,): (u32,) = proxy.method_call(
            NOTIFICATIONS_INTERFACE,
            "Notify",
            (
                args.app_name.as_str(),
                args.replaces_id,
                args.app_icon.as_str(),
                args.summary.as_str(),
                args.body.as_str(),
                actions,
                hints_to_prop_map(&args.hints),
                args.expire_timeout,
            ),
        )?;

        Ok(id)
    }

    fn close_notification(&self, id: u32) -> Result<(), NotifyError> {
        let mut message = Message::new_method_call(
            NOTIFICATIONS_BUS,
            NOTIFICATIONS_OBJECT,
            NOTIFICATIONS_INTERFACE,
            "CloseNotification",
        )
        .map_err(NotifyError::Transport)?
        .append1(id);
        message.set_no_reply(true);

        self.connection
            .send(message)
            .map_err(|()| NotifyError::Transport("failed to queue CloseNotification".to_string()))?;
        self.connection.channel().flush();
        Ok(())
    }

    fn server_information(&self) -> Result<ServerInformation, NotifyError> {
        let proxy = self
            .connection
            .with_proxy(NOTIFICATIONS_BUS, NOTIFICATIONS_OBJECT, self.timeout);
        let (name, vendor, version, spec_version): (String, String, String, String) =
            proxy.method_call(NOTIFICATIONS_INTERFACE, "GetServerInformation", ())?;

        Ok(ServerInformation {
            name,
            vendor,
            version,
            spec_version,
        })
    }

    fn capabilities(&self) -> Result<Vec<String>, NotifyError> {
        let proxy = self
            .connection
            .with_proxy(NOTIFICATIONS_BUS, NOTIFICATIONS_OBJECT, self.timeout);
        let (capabilities,): (Vec<String>,) =
            proxy.method_call(NOTIFICATIONS_INTERFACE, "GetCapabilities", ())?;
        Ok(capabilities)
    }
}

/// Signal stream over a dedicated session bus connection
pub struct DBusSignalSource {
    connection: Connection,
}

impl DBusSignalSource {
    pub fn session() -> Result<Self, NotifyError> {
        let connection = Connection::new_session()?;
        Ok(Self { connection })
    }
}

impl SignalSource for DBusSignalSource {
    fn subscribe(&mut self) -> Result<(), NotifyError> {
        for member in [SIGNAL_ACTION_INVOKED, SIGNAL_NOTIFICATION_CLOSED] {
            let rule = MatchRule::new_signal(NOTIFICATIONS_INTERFACE, member)
                .with_path(NOTIFICATIONS_OBJECT);
            self.connection.add_match_no_cb(&rule.match_str())?;
            debug!(rule = %rule.match_str(), "Added match rule");
        }
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, RecvError> {
        let channel = self.connection.channel();
        match channel.blocking_pop_message(timeout) {
            Ok(message) => Ok(message.as_ref().map(inbound_from_message)),
            Err(err) => {
                let reason = err.message().unwrap_or("unknown error").to_string();
                if channel.is_connected() {
                    Err(RecvError::Transient(reason))
                } else {
                    Err(RecvError::Disconnected(reason))
                }
            }
        }
    }
}

fn inbound_from_message(message: &Message) -> InboundMessage {
    InboundMessage {
        is_signal: message.msg_type() == MessageType::Signal,
        interface: message.interface().map(|i| i.to_string()),
        member: message.member().map(|m| m.to_string()),
        args: collect_args(message),
    }
}

fn collect_args(message: &Message) -> Vec<SignalArg> {
    let mut args = Vec::new();
    let mut iter = message.iter_init();
    loop {
        let arg = match iter.arg_type() {
            ArgType::Invalid => break,
            ArgType::UInt32 => iter.get::<u32>().map_or(SignalArg::Other, SignalArg::U32),
            ArgType::String => iter.get::<String>().map_or(SignalArg::Other, SignalArg::Str),
            _ => SignalArg::Other,
        };
        args.push(arg);
        if !iter.next() {
            break;
        }
    }
    args
}
