//! Signal listener - turns daemon signals into callback events
//!
//! Runs on its own thread and its own bus connection. Every message is handled in
//! isolation: foreign or malformed signals are dropped, a failing callback is logged,
//! and only a lost connection ends the loop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, trace, warn, Level};

use super::action::ActionCodec;
use super::bus::{RecvError, SignalSource};
use super::codec::{self, BusSignal, InboundMessage};
use super::error::ListenerError;
use super::observer::Observer;
use super::store::{NotificationRecord, SharedHistory};

/// Consecutive receive failures tolerated before the connection is given up
const MAX_CONSECUTIVE_RECV_ERRORS: u32 = 5;

/// Why the daemon closed a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloseReason {
    Expired,
    Dismissed,
    ClosedByCall,
    Undefined,
}

impl From<u32> for CloseReason {
    fn from(code: u32) -> Self {
        match code {
            1 => CloseReason::Expired,
            2 => CloseReason::Dismissed,
            3 => CloseReason::ClosedByCall,
            _ => CloseReason::Undefined,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "reason", rename_all = "lowercase")]
pub enum EventKind {
    /// An action button was clicked
    Button,
    /// The notification went away
    Closed(CloseReason),
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Button => "button",
            EventKind::Closed(_) => "closed",
        }
    }
}

/// What the callback receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    pub notification: NotificationRecord,
}

pub type NotificationCallback = Arc<dyn Fn(&NotificationEvent) -> anyhow::Result<()> + Send + Sync>;

/// Result of handling one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Delivered(EventKind),
    /// Not for us: another member, another client's action, bad shape
    Ignored,
    /// The callback returned an error or panicked
    CallbackFailed,
}

pub struct SignalListener {
    actions: ActionCodec,
    history: SharedHistory,
    callback: NotificationCallback,
    observer: Observer,
    settle_delay: Duration,
    poll_interval: Duration,
}

impl SignalListener {
    pub fn new(
        actions: ActionCodec,
        history: SharedHistory,
        callback: NotificationCallback,
        observer: Observer,
    ) -> Self {
        Self {
            actions,
            history,
            callback,
            observer,
            settle_delay: Duration::from_millis(500),
            poll_interval: Duration::from_millis(250),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Starts the listener thread
    pub fn spawn<S>(self, source: S) -> Result<ListenerHandle, ListenerError>
    where
        S: SignalSource + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("notification-listener".to_string())
            .spawn(move || self.run(source, &thread_stop))
            .map_err(|e| {
                ListenerError::TransportFatal(format!("failed to spawn listener: {}", e))
            })?;

        Ok(ListenerHandle {
            stop,
            thread: Some(thread),
        })
    }

    /// Listens until `stop` is set or the connection is lost
    pub fn run<S: SignalSource>(
        &self,
        mut source: S,
        stop: &AtomicBool,
    ) -> Result<(), ListenerError> {
        if !self.settle(stop) {
            return Ok(());
        }

        source.subscribe().map_err(ListenerError::Subscribe)?;
        self.observer.emit(Level::INFO, || info!("Listening for notification signals"));

        let mut consecutive_errors = 0;
        while !stop.load(Ordering::Relaxed) {
            match source.recv(self.poll_interval) {
                Ok(Some(message)) => {
                    consecutive_errors = 0;
                    self.dispatch(&message);
                }
                Ok(None) => {}
                Err(RecvError::Disconnected(reason)) => {
                    self.observer
                        .emit(Level::ERROR, || error!(%reason, "Listener connection lost"));
                    return Err(ListenerError::TransportFatal(reason));
                }
                Err(RecvError::Transient(reason)) => {
                    consecutive_errors += 1;
                    self.observer.emit(Level::WARN, || {
                        warn!(%reason, attempt = consecutive_errors, "Failed to receive message")
                    });
                    if consecutive_errors >= MAX_CONSECUTIVE_RECV_ERRORS {
                        return Err(ListenerError::TransportFatal(reason));
                    }
                }
            }
        }

        self.observer.emit(Level::INFO, || info!("Listener stopped"));
        Ok(())
    }

    /// Waits out the settle delay; false if stopped meanwhile
    fn settle(&self, stop: &AtomicBool) -> bool {
        let deadline = Instant::now() + self.settle_delay;
        loop {
            if stop.load(Ordering::Relaxed) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(self.poll_interval));
        }
    }

    /// Handles one inbound message
    pub fn dispatch(&self, message: &InboundMessage) -> Dispatch {
        let signal = match codec::decode_signal(message) {
            Ok(signal) => signal,
            Err(e) => {
                self.observer.emit(Level::TRACE, || trace!(error = %e, "Ignoring message"));
                return Dispatch::Ignored;
            }
        };

        match signal {
            BusSignal::ActionInvoked { id, action_key } => {
                let Some(action) = self.actions.decode(&action_key) else {
                    self.observer.emit(Level::TRACE, || {
                        trace!(id, action = %action_key, "Ignoring action of another client")
                    });
                    return Dispatch::Ignored;
                };
                self.observer
                    .emit(Level::DEBUG, || debug!(id, action, "Notification button clicked"));

                let notification = {
                    let mut history = self.history.lock();
                    match history.get_mut(id) {
                        Some(record) => {
                            record.clicked_action = Some(action.to_string());
                            record.clone()
                        }
                        None => NotificationRecord {
                            clicked_action: Some(action.to_string()),
                            ..NotificationRecord::bare(id)
                        },
                    }
                };
                self.deliver(NotificationEvent {
                    kind: EventKind::Button,
                    notification,
                })
            }
            BusSignal::NotificationClosed { id, reason } => {
                let notification = self
                    .history
                    .lock()
                    .delete(id)
                    .unwrap_or_else(|| NotificationRecord::bare(id));
                let reason = CloseReason::from(reason);
                self.observer
                    .emit(Level::DEBUG, || debug!(id, ?reason, "Notification closed"));
                self.deliver(NotificationEvent {
                    kind: EventKind::Closed(reason),
                    notification,
                })
            }
        }
    }

    fn deliver(&self, event: NotificationEvent) -> Dispatch {
        let id = event.notification.id;
        match panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(&event))) {
            Ok(Ok(())) => Dispatch::Delivered(event.kind),
            Ok(Err(e)) => {
                self.observer
                    .emit(Level::ERROR, || error!(id, error = %e, "Notification callback failed"));
                Dispatch::CallbackFailed
            }
            Err(_) => {
                self.observer
                    .emit(Level::ERROR, || error!(id, "Notification callback panicked"));
                Dispatch::CallbackFailed
            }
        }
    }
}

/// Controls a running listener thread. Dropping it detaches the thread.
pub struct ListenerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<(), ListenerError>>>,
}

impl ListenerHandle {
    /// Asks the listener to stop after its current receive
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// True once the listener thread has exited, for any reason
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the listener thread and returns why it ended
    pub fn join(mut self) -> Result<(), ListenerError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| ListenerError::Panicked)?,
            None => Ok(()),
        }
    }

    /// Stops the listener and waits for it
    pub fn shutdown(self) -> Result<(), ListenerError> {
        self.stop();
        self.join()
    }
}
