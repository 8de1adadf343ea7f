//! Wire codec for the `org.freedesktop.Notifications` interface
//!
//! Outgoing: a `NotificationRequest` becomes the positional arguments of `Notify`.
//! Incoming: raw signal messages become typed `BusSignal`s.

use std::collections::BTreeMap;

use super::error::NotifyError;
use super::request::NotificationRequest;

pub const HINT_URGENCY: &str = "urgency";
pub const HINT_IMAGE_PATH: &str = "image-path";
pub const HINT_SOUND_FILE: &str = "sound-file";
pub const HINT_SOUND_NAME: &str = "sound-name";

pub const SIGNAL_ACTION_INVOKED: &str = "ActionInvoked";
pub const SIGNAL_NOTIFICATION_CLOSED: &str = "NotificationClosed";

/// Typed value of a hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintValue {
    Byte(u8),
    Str(String),
}

/// Positional arguments of the `Notify` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyArgs {
    pub app_name: String,
    pub replaces_id: u32,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub actions: Vec<String>,
    pub hints: BTreeMap<String, HintValue>,
    pub expire_timeout: i32,
}

/// Builds the hint map; unset fields are left out rather than sent empty
pub fn build_hints(request: &NotificationRequest) -> BTreeMap<String, HintValue> {
    let mut hints = BTreeMap::new();

    if let Some(urgency) = request.urgency {
        hints.insert(HINT_URGENCY.to_string(), HintValue::Byte(urgency.as_byte()));
    }

    if let Some(image) = request.image.as_deref().filter(|path| !path.is_empty()) {
        hints.insert(HINT_IMAGE_PATH.to_string(), HintValue::Str(image.to_string()));
    }

    if let Some(sound) = request.sound.as_deref().filter(|sound| !sound.is_empty()) {
        let key = if sound.contains('/') {
            HINT_SOUND_FILE
        } else {
            HINT_SOUND_NAME
        };
        hints.insert(key.to_string(), HintValue::Str(sound.to_string()));
    }

    hints
}

/// Encodes a request for the `Notify` call.
///
/// `actions` must already be namespaced by the caller.
pub fn encode(
    app_name: &str,
    replaces_id: u32,
    request: &NotificationRequest,
    actions: Vec<String>,
) -> NotifyArgs {
    NotifyArgs {
        app_name: app_name.to_string(),
        replaces_id,
        app_icon: request.icon.clone(),
        summary: request.title.clone(),
        body: request.body.clone(),
        actions,
        hints: build_hints(request),
        expire_timeout: request.timeout.as_i32(),
    }
}

/// One argument of an inbound message, as far as the listener cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalArg {
    U32(u32),
    Str(String),
    Other,
}

/// Transport-independent view of a message received on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub is_signal: bool,
    pub interface: Option<String>,
    pub member: Option<String>,
    pub args: Vec<SignalArg>,
}

impl InboundMessage {
    /// A signal on the notifications interface
    pub fn signal(member: &str, args: Vec<SignalArg>) -> Self {
        Self {
            is_signal: true,
            interface: Some(super::bus::NOTIFICATIONS_INTERFACE.to_string()),
            member: Some(member.to_string()),
            args,
        }
    }

    pub fn action_invoked(id: u32, action_key: &str) -> Self {
        Self::signal(
            SIGNAL_ACTION_INVOKED,
            vec![SignalArg::U32(id), SignalArg::Str(action_key.to_string())],
        )
    }

    pub fn notification_closed(id: u32, reason: u32) -> Self {
        Self::signal(
            SIGNAL_NOTIFICATION_CLOSED,
            vec![SignalArg::U32(id), SignalArg::U32(reason)],
        )
    }
}

/// Signals emitted by the notification daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusSignal {
    ActionInvoked { id: u32, action_key: String },
    NotificationClosed { id: u32, reason: u32 },
}

pub fn decode_signal(message: &InboundMessage) -> Result<BusSignal, NotifyError> {
    if !message.is_signal {
        return Err(NotifyError::Decode("not a signal".to_string()));
    }

    if let Some(interface) = message.interface.as_deref() {
        if interface != super::bus::NOTIFICATIONS_INTERFACE {
            return Err(NotifyError::Decode(format!("foreign interface {}", interface)));
        }
    }

    let member = message.member.as_deref().unwrap_or_default();
    match (member, message.args.as_slice()) {
        (SIGNAL_ACTION_INVOKED, [SignalArg::U32(id), SignalArg::Str(action_key)]) => {
            Ok(BusSignal::ActionInvoked {
                id: *id,
                action_key: action_key.clone(),
            })
        }
        (SIGNAL_NOTIFICATION_CLOSED, [SignalArg::U32(id), SignalArg::U32(reason)]) => {
            Ok(BusSignal::NotificationClosed {
                id: *id,
                reason: *reason,
            })
        }
        (SIGNAL_ACTION_INVOKED | SIGNAL_NOTIFICATION_CLOSED, args) => Err(NotifyError::Decode(
            format!("{} with unexpected arguments {:?}", member, args),
        )),
        _ => Err(NotifyError::Decode(format!("unhandled member '{}'", member))),
    }
}
