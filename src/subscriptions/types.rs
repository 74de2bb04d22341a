//! Subscription types for storage change notifications.

use serde::{Deserialize, Serialize};

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 256
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: SubscriptionFilter,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 256,
            filter: SubscriptionFilter::default(),
        }
    }
}

impl SubscriptionConfig {
    /// Subscribe to a single key with the default buffer.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            filter: SubscriptionFilter::keys(vec![key.into()]),
            ..Default::default()
        }
    }
}

/// Filter criteria for subscriptions.
///
/// `Cleared` events are delivered regardless of the key filter since they
/// affect every key.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionFilter {
    /// Keys of interest (None = all keys).
    pub keys: Option<Vec<String>>,
}

impl SubscriptionFilter {
    /// Subscribe to every key.
    pub fn all() -> Self {
        Self::default()
    }

    /// Subscribe to specific keys.
    pub fn keys(keys: Vec<String>) -> Self {
        Self { keys: Some(keys) }
    }

    pub(crate) fn matches_key(&self, key: &str) -> bool {
        match &self.keys {
            Some(keys) => keys.iter().any(|k| k == key),
            None => true,
        }
    }
}

/// Events emitted by subscriptions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageEvent {
    /// A value was written.
    Set {
        key: String,
        /// Raw JSON that was stored.
        raw: String,
    },

    /// A key was deleted.
    Removed { key: String },

    /// Every key was deleted.
    Cleared,

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

impl StorageEvent {
    /// Key this event concerns, if it concerns exactly one.
    pub fn key(&self) -> Option<&str> {
        match self {
            StorageEvent::Set { key, .. } | StorageEvent::Removed { key } => Some(key.as_str()),
            StorageEvent::Cleared | StorageEvent::Dropped { .. } => None,
        }
    }

    /// Whether this event may have changed the value under `key`.
    pub fn affects(&self, key: &str) -> bool {
        match self {
            StorageEvent::Cleared => true,
            StorageEvent::Dropped { .. } => false,
            _ => self.key() == Some(key),
        }
    }
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to manage a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<StorageEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StorageEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StorageEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StorageEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain every event currently buffered.
    pub fn drain(&self) -> Vec<StorageEvent> {
        self.receiver.try_iter().collect()
    }
}
