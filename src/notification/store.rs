//! Notification history - live notifications sent by this manager
//!
//! Entries are kept in the order they were first sent. Lookup by unique id scans
//! from the newest entry backwards, so a later send with the same unique id wins
//! over an older notification the daemon may not have closed yet.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::{NotificationRequest, Timeout};
use super::urgency::Urgency;

/// What is remembered about a notification after it was sent
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Id assigned by the daemon
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    /// Actions as sent on the wire (namespaced ids and labels, flattened)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Timeout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    /// Set by the listener when a button of this notification is clicked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clicked_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// A record that only knows its id, for notifications missing from history
    pub fn bare(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn from_request(id: u32, request: &NotificationRequest, actions: Vec<String>) -> Self {
        Self {
            id,
            title: Some(request.title.clone()),
            message: Some(request.body.clone()),
            logo: Some(request.icon.clone()),
            image: request.image.clone(),
            sound: request.sound.clone(),
            actions: Some(actions),
            urgency: request.urgency,
            timeout: Some(request.timeout),
            unique_id: request.unique_id().map(str::to_string),
            clicked_action: None,
            sent_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: Vec<NotificationRecord>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for `id`; a replaced record keeps its position
    pub fn put(&mut self, id: u32, mut record: NotificationRecord) {
        record.id = id;
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => *entry = record,
            None => self.entries.push(record),
        }
    }

    pub fn get(&self, id: u32) -> Option<&NotificationRecord> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut NotificationRecord> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    pub fn delete(&mut self, id: u32) -> Option<NotificationRecord> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Id of the newest record whose unique id equals `unique_id`
    pub fn find_by_unique_id(&self, unique_id: &str) -> Option<u32> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.unique_id.as_deref() == Some(unique_id))
            .map(|entry| entry.id)
    }

    /// Ids in insertion order
    pub fn all_ids(&self) -> Vec<u32> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// History shared between the manager and its listener
#[derive(Debug, Clone, Default)]
pub struct SharedHistory {
    inner: Arc<Mutex<HistoryStore>>,
}

impl SharedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the store, ignoring poisoning: every store operation is a single Vec mutation.
    pub fn lock(&self) -> MutexGuard<'_, HistoryStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, id: u32) -> Option<NotificationRecord> {
        self.lock().get(id).cloned()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.lock().all_ids()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
