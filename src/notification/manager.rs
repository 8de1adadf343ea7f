//! Notification manager - send, update, close and listen
//!
//! # Example
//! ```ignore
//! use dbus_notify::{ManagerConfig, NotificationManager, NotificationRequest};
//!
//! let config = ManagerConfig::default().with_app_name("mailer");
//! let manager = NotificationManager::connect(config)?;
//! let request = NotificationRequest::new("New mail", "3 unread").with_unique_id("inbox");
//! let id = manager.send(&request)?;
//! // same unique id: updates the notification above instead of posting a second one
//! manager.send(&NotificationRequest::new("New mail", "4 unread").with_unique_id("inbox"))?;
//! manager.close("inbox")?;
//! ```

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, warn, Level};

use crate::config::ManagerConfig;

use super::action::ActionCodec;
use super::bus::{DBusBus, DBusSignalSource, NotificationBus, ServerInformation, SignalSource};
use super::codec;
use super::error::{ListenerError, NotifyError};
use super::listener::{ListenerHandle, NotificationCallback, NotificationEvent, SignalListener};
use super::observer::Observer;
use super::request::NotificationRequest;
use super::store::{NotificationRecord, SharedHistory};

/// What `close` should close
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseTarget {
    Id(u32),
    UniqueId(String),
}

impl From<u32> for CloseTarget {
    fn from(id: u32) -> Self {
        CloseTarget::Id(id)
    }
}

impl From<&str> for CloseTarget {
    fn from(unique_id: &str) -> Self {
        CloseTarget::UniqueId(unique_id.to_string())
    }
}

impl From<String> for CloseTarget {
    fn from(unique_id: String) -> Self {
        CloseTarget::UniqueId(unique_id)
    }
}

impl FromStr for CloseTarget {
    type Err = std::convert::Infallible;

    /// Numbers are bus ids, anything else a unique id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<u32>() {
            Ok(id) => CloseTarget::Id(id),
            Err(_) => CloseTarget::UniqueId(s.to_string()),
        })
    }
}

pub struct NotificationManager {
    config: ManagerConfig,
    actions: ActionCodec,
    bus: Arc<dyn NotificationBus>,
    history: SharedHistory,
    observer: Observer,
}

impl NotificationManager {
    pub fn new(config: ManagerConfig, bus: Arc<dyn NotificationBus>) -> Self {
        let observer = Observer::new(&config.app_name, config.verbosity.into());
        Self {
            actions: ActionCodec::new(&config.app_name),
            bus,
            history: SharedHistory::new(),
            observer,
            config,
        }
    }

    /// Creates a manager talking to the session bus
    pub fn connect(config: ManagerConfig) -> Result<Self, NotifyError> {
        let bus = DBusBus::session(config.call_timeout())?;
        Ok(Self::new(config, Arc::new(bus)))
    }

    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    /// Posts a notification, or updates one when the unique id or `replaces_id` resolves.
    ///
    /// Returns the id assigned by the daemon.
    pub fn send(&self, request: &NotificationRequest) -> Result<u32, NotifyError> {
        let target = self.resolve_send_target(request);
        let actions = self.actions.encode(&request.actions);
        let args = codec::encode(&self.config.app_name, target, request, actions.clone());

        let id = self.bus.notify(&args)?;
        self.observer.emit(Level::DEBUG, || {
            debug!(id, replaces_id = target, unique_id = ?request.unique_id(), "Notification sent")
        });

        let mut record = NotificationRecord::from_request(id, request, actions);
        let mut history = self.history.lock();
        if target != 0 && target != id {
            // the daemon did not reuse the id, so the old notification is gone
            history.delete(target);
        }
        if record.unique_id.is_none() {
            record.unique_id = history.get(id).and_then(|previous| previous.unique_id.clone());
        }
        history.put(id, record);

        Ok(id)
    }

    fn resolve_send_target(&self, request: &NotificationRequest) -> u32 {
        let fallback = request.replaces_id.unwrap_or(0);
        let Some(unique_id) = request.unique_id() else {
            return fallback;
        };

        match self.history.lock().find_by_unique_id(unique_id) {
            Some(id) => id,
            None => {
                self.observer.emit(Level::DEBUG, || {
                    debug!(unique_id, "No live notification for unique id, creating a new one")
                });
                fallback
            }
        }
    }

    /// Closes a notification by bus id or unique id and forgets it.
    ///
    /// The close call is not acknowledged by the daemon; the record is dropped
    /// from history even when sending it fails. Returns the closed id.
    pub fn close(&self, target: impl Into<CloseTarget>) -> Result<u32, NotifyError> {
        let id = match target.into() {
            CloseTarget::Id(id) => id,
            CloseTarget::UniqueId(unique_id) => {
                let found = self.history.lock().find_by_unique_id(&unique_id);
                match found {
                    Some(id) => id,
                    None => {
                        self.observer.emit(Level::WARN, || {
                            warn!(unique_id = %unique_id, "Cannot close, unique id not found")
                        });
                        return Err(NotifyError::UnresolvedUniqueId(unique_id));
                    }
                }
            }
        };

        let result = self.bus.close_notification(id);

        if self.history.lock().delete(id).is_none() {
            self.observer
                .emit(Level::INFO, || info!(id, "Closed a notification not present in history"));
        }

        result.map(|()| {
            self.observer.emit(Level::DEBUG, || debug!(id, "Notification closed"));
            id
        })
    }

    /// Closes every notification known when the call starts.
    ///
    /// Notifications sent while this runs are left alone. All ids are attempted;
    /// the first failure is returned after the others were tried.
    pub fn close_all(&self) -> Result<Vec<u32>, NotifyError> {
        let snapshot = self.history.ids();
        let mut closed = Vec::with_capacity(snapshot.len());
        let mut first_error = None;

        for id in snapshot {
            match self.close(id) {
                Ok(id) => closed.push(id),
                Err(e) => {
                    self.observer.emit(Level::WARN, || {
                        warn!(id, error = %e, "Failed to close notification")
                    });
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(closed),
        }
    }

    pub fn server_information(&self) -> Result<ServerInformation, NotifyError> {
        self.bus.server_information()
    }

    pub fn capabilities(&self) -> Result<Vec<String>, NotifyError> {
        self.bus.capabilities()
    }

    /// Builds a listener bound to this manager's history and namespace
    pub fn listener<F>(&self, callback: F) -> SignalListener
    where
        F: Fn(&NotificationEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let callback: NotificationCallback = Arc::new(callback);
        SignalListener::new(
            self.actions.clone(),
            self.history.clone(),
            callback,
            self.observer.clone(),
        )
        .with_settle_delay(self.config.settle_delay())
        .with_poll_interval(self.config.poll_interval())
    }

    /// Starts listening for clicks and closes on the given signal source
    pub fn start_listening_on<S, F>(
        &self,
        source: S,
        callback: F,
    ) -> Result<ListenerHandle, ListenerError>
    where
        S: SignalSource + 'static,
        F: Fn(&NotificationEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.listener(callback).spawn(source)
    }

    /// Starts listening on a new session bus connection
    pub fn start_listening<F>(&self, callback: F) -> Result<ListenerHandle, ListenerError>
    where
        F: Fn(&NotificationEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let source = DBusSignalSource::session().map_err(ListenerError::Subscribe)?;
        self.start_listening_on(source, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::codec::{HintValue, NotifyArgs};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;

    /// In-memory daemon: reuses `replaces_id` when it is live, otherwise hands out new ids
    #[derive(Default)]
    struct MockBus {
        next_id: AtomicU32,
        notified: Mutex<Vec<NotifyArgs>>,
        closed: Mutex<Vec<u32>>,
        fail_notify: AtomicBool,
        fail_close: bool,
    }

    impl NotificationBus for MockBus {
        fn notify(&self, args: &NotifyArgs) -> Result<u32, NotifyError> {
            self.notified.lock().unwrap().push(args.clone());
            if self.fail_notify.load(Ordering::SeqCst) {
                return Err(NotifyError::Transport("no reply from daemon".to_string()));
            }
            if args.replaces_id != 0 {
                return Ok(args.replaces_id);
            }
            Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
        }

        fn close_notification(&self, id: u32) -> Result<(), NotifyError> {
            self.closed.lock().unwrap().push(id);
            if self.fail_close {
                return Err(NotifyError::Transport("bus gone".to_string()));
            }
            Ok(())
        }

        fn server_information(&self) -> Result<ServerInformation, NotifyError> {
            Ok(ServerInformation {
                name: "mock".to_string(),
                vendor: "test".to_string(),
                version: "1.0".to_string(),
                spec_version: "1.2".to_string(),
            })
        }

        fn capabilities(&self) -> Result<Vec<String>, NotifyError> {
            Ok(vec!["actions".to_string(), "body".to_string()])
        }
    }

    fn manager() -> (NotificationManager, Arc<MockBus>) {
        let bus = Arc::new(MockBus::default());
        let config = ManagerConfig::default().with_app_name("app");
        (NotificationManager::new(config, bus.clone()), bus)
    }

    #[test]
    fn test_send_without_unique_id_creates_new() {
        let (manager, _bus) = manager();
        let first = manager.send(&NotificationRequest::new("a", "b")).unwrap();
        let second = manager.send(&NotificationRequest::new("a", "b")).unwrap();

        assert_ne!(first, second);
        assert_eq!(manager.history().ids(), vec![first, second]);
    }

    #[test]
    fn test_send_encodes_actions_and_hints() {
        let (manager, bus) = manager();
        let request = NotificationRequest::new("a", "b")
            .with_action("open", "Open")
            .with_sound("bell");
        let id = manager.send(&request).unwrap();

        let notified = bus.notified.lock().unwrap();
        assert_eq!(notified[0].app_name, "app");
        assert_eq!(notified[0].actions, vec!["app_open", "Open"]);
        assert_eq!(notified[0].hints.get("sound-name"), Some(&HintValue::Str("bell".to_string())));

        let record = manager.history().get(id).unwrap();
        assert_eq!(record.actions, Some(vec!["app_open".to_string(), "Open".to_string()]));
        assert_eq!(record.sound.as_deref(), Some("bell"));
    }

    #[test]
    fn test_unique_id_updates_in_place() {
        let (manager, bus) = manager();
        let first = manager
            .send(&NotificationRequest::new("Build", "running").with_unique_id("build"))
            .unwrap();
        let second = manager
            .send(&NotificationRequest::new("Build", "done").with_unique_id("build"))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(bus.notified.lock().unwrap()[1].replaces_id, first);
        assert_eq!(manager.history().len(), 1);
        assert_eq!(manager.history().get(first).unwrap().message.as_deref(), Some("done"));
    }

    #[test]
    fn test_unknown_unique_id_falls_back_to_replaces_id() {
        let (manager, bus) = manager();
        let request = NotificationRequest::new("a", "b")
            .with_unique_id("fresh")
            .with_replaces_id(40);
        assert_eq!(manager.send(&request).unwrap(), 40);
        assert_eq!(bus.notified.lock().unwrap()[0].replaces_id, 40);
    }

    #[test]
    fn test_update_by_id_keeps_unique_id() {
        let (manager, _bus) = manager();
        let id = manager
            .send(&NotificationRequest::new("a", "b").with_unique_id("keep"))
            .unwrap();
        manager
            .send(&NotificationRequest::new("a", "c").with_replaces_id(id))
            .unwrap();

        assert_eq!(manager.history().lock().find_by_unique_id("keep"), Some(id));
    }

    #[test]
    fn test_failed_notify_leaves_history_untouched() {
        let (manager, bus) = manager();
        let id = manager
            .send(&NotificationRequest::new("Build", "running").with_unique_id("build"))
            .unwrap();
        bus.fail_notify.store(true, Ordering::SeqCst);

        let update = NotificationRequest::new("Build", "done").with_unique_id("build");
        assert!(matches!(manager.send(&update), Err(NotifyError::Transport(_))));
        assert!(matches!(
            manager.send(&NotificationRequest::new("other", "")),
            Err(NotifyError::Transport(_))
        ));

        assert_eq!(bus.notified.lock().unwrap()[1].replaces_id, id);
        assert_eq!(manager.history().ids(), vec![id]);
        let record = manager.history().get(id).unwrap();
        assert_eq!(record.message.as_deref(), Some("running"));
        assert_eq!(record.unique_id.as_deref(), Some("build"));
    }

    #[test]
    fn test_close_by_id_and_unique_id() {
        let (manager, bus) = manager();
        let a = manager.send(&NotificationRequest::new("a", "")).unwrap();
        let b = manager
            .send(&NotificationRequest::new("b", "").with_unique_id("b"))
            .unwrap();

        assert_eq!(manager.close(a).unwrap(), a);
        assert_eq!(manager.close("b").unwrap(), b);
        assert_eq!(*bus.closed.lock().unwrap(), vec![a, b]);
        assert!(manager.history().is_empty());
    }

    #[test]
    fn test_close_unknown_unique_id_makes_no_call() {
        let (manager, bus) = manager();
        let err = manager.close("nonexistent-unique-id").unwrap_err();

        assert!(matches!(
            err,
            NotifyError::UnresolvedUniqueId(ref uid) if uid == "nonexistent-unique-id"
        ));
        assert!(bus.closed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_close_unknown_id_still_calls_bus() {
        let (manager, bus) = manager();
        assert_eq!(manager.close(99).unwrap(), 99);
        assert_eq!(*bus.closed.lock().unwrap(), vec![99]);
    }

    #[test]
    fn test_close_failure_still_forgets_record() {
        let bus = Arc::new(MockBus {
            fail_close: true,
            ..MockBus::default()
        });
        let manager = NotificationManager::new(ManagerConfig::default(), bus.clone());
        let id = manager.send(&NotificationRequest::new("a", "b")).unwrap();

        assert!(matches!(manager.close(id), Err(NotifyError::Transport(_))));
        assert!(manager.history().is_empty());
    }

    #[test]
    fn test_close_all_closes_each_once() {
        let (manager, bus) = manager();
        let ids: Vec<u32> = (0..3)
            .map(|_| manager.send(&NotificationRequest::new("a", "b")).unwrap())
            .collect();
        manager.close(ids[1]).unwrap();

        let closed = manager.close_all().unwrap();
        assert_eq!(closed, vec![ids[0], ids[2]]);
        assert_eq!(*bus.closed.lock().unwrap(), vec![ids[1], ids[0], ids[2]]);
        assert!(manager.history().is_empty());
    }

    #[test]
    fn test_close_target_from_str() {
        assert_eq!("12".parse::<CloseTarget>().unwrap(), CloseTarget::Id(12));
        assert_eq!(
            "build-12".parse::<CloseTarget>().unwrap(),
            CloseTarget::UniqueId("build-12".to_string())
        );
    }

    #[test]
    fn test_server_queries_pass_through() {
        let (manager, _bus) = manager();
        assert_eq!(manager.server_information().unwrap().name, "mock");
        assert!(manager.capabilities().unwrap().contains(&"actions".to_string()));
    }
}
