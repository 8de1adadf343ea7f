//! Desktop notifications over D-Bus
//!
//! # Layout
//! 1. `codec`: request -> `Notify` arguments, raw signals -> `BusSignal`
//! 2. `action`: per-application action id namespacing
//! 3. `store`: history of live notifications, looked up by id or unique id
//! 4. `manager`: send / close / close_all on top of a `NotificationBus`
//! 5. `listener`: background thread turning daemon signals into callback events
//!
//! Protocol: https://specifications.freedesktop.org/notification-spec/notification-spec-latest.html

pub mod action;
pub mod bus;
pub mod codec;
pub mod error;
pub mod listener;
pub mod manager;
pub mod observer;
pub mod request;
pub mod store;
pub mod urgency;

pub use action::ActionCodec;
pub use bus::{
    DBusBus, DBusSignalSource, NotificationBus, RecvError, ServerInformation, SignalSource,
};
pub use codec::{BusSignal, HintValue, InboundMessage, NotifyArgs, SignalArg};
pub use error::{ListenerError, NotifyError};
pub use listener::{
    CloseReason, Dispatch, EventKind, ListenerHandle, NotificationCallback, NotificationEvent,
    SignalListener,
};
pub use manager::{CloseTarget, NotificationManager};
pub use observer::Observer;
pub use request::{ActionPair, NotificationRequest, Timeout};
pub use store::{HistoryStore, NotificationRecord, SharedHistory};
pub use urgency::Urgency;
