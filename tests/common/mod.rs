//! In-memory stand-ins for the notification daemon

#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

use dbus_notify::notification::{
    InboundMessage, NotificationBus, NotifyArgs, NotifyError, RecvError, ServerInformation,
    SignalSource,
};

type CloseHook = Box<dyn FnOnce(u32) + Send>;

/// Hands out ids like a daemon: `replaces_id` is reused while it is live,
/// otherwise the next preset id (or a counter) is assigned
#[derive(Default)]
pub struct MockDaemon {
    preset_ids: Mutex<VecDeque<u32>>,
    counter: AtomicU32,
    live: Mutex<BTreeSet<u32>>,
    pub notified: Mutex<Vec<NotifyArgs>>,
    pub closed: Mutex<Vec<u32>>,
    on_close: Mutex<Option<CloseHook>>,
}

impl MockDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            preset_ids: Mutex::new(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Runs `hook` inside the next CloseNotification call
    pub fn on_next_close(&self, hook: impl FnOnce(u32) + Send + 'static) {
        *self.on_close.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn closed_ids(&self) -> Vec<u32> {
        self.closed.lock().unwrap().clone()
    }

    pub fn notify_count(&self) -> usize {
        self.notified.lock().unwrap().len()
    }

    pub fn last_notify(&self) -> Option<NotifyArgs> {
        self.notified.lock().unwrap().last().cloned()
    }
}

impl NotificationBus for MockDaemon {
    fn notify(&self, args: &NotifyArgs) -> Result<u32, NotifyError> {
        self.notified.lock().unwrap().push(args.clone());

        let mut live = self.live.lock().unwrap();
        if args.replaces_id != 0 && live.contains(&args.replaces_id) {
            return Ok(args.replaces_id);
        }

        let id = self
            .preset_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| 1000 + self.counter.fetch_add(1, Ordering::SeqCst));
        live.insert(id);
        Ok(id)
    }

    fn close_notification(&self, id: u32) -> Result<(), NotifyError> {
        self.closed.lock().unwrap().push(id);
        self.live.lock().unwrap().remove(&id);

        let hook = self.on_close.lock().unwrap().take();
        if let Some(hook) = hook {
            hook(id);
        }
        Ok(())
    }

    fn server_information(&self) -> Result<ServerInformation, NotifyError> {
        Ok(ServerInformation {
            name: "mock-daemon".to_string(),
            vendor: "tests".to_string(),
            version: "0.1".to_string(),
            spec_version: "1.2".to_string(),
        })
    }

    fn capabilities(&self) -> Result<Vec<String>, NotifyError> {
        Ok(vec!["actions".to_string()])
    }
}

/// Signal source fed from a channel; dropping the sender disconnects it
pub struct ChannelSource {
    rx: mpsc::Receiver<InboundMessage>,
}

impl ChannelSource {
    pub fn new() -> (mpsc::Sender<InboundMessage>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }
}

impl SignalSource for ChannelSource {
    fn subscribe(&mut self) -> Result<(), NotifyError> {
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, RecvError> {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(RecvError::Disconnected("sender dropped".to_string()))
            }
        }
    }
}
