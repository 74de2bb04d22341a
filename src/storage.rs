//! Shared storage handle tying a backend to its change notifications.

use crate::backends::{FileBackend, MemoryBackend, StorageBackend, StorageConfig};
use crate::error::Result;
use crate::subscriptions::{
    StorageEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager,
};
use std::fmt;
use std::sync::Arc;

struct StorageInner {
    backend: Box<dyn StorageBackend>,
    subscriptions: SubscriptionManager,
}

/// Cheaply cloneable handle to a storage medium.
///
/// All clones share the same backend and subscribers. Cells hold a clone
/// and write through it; anything else holding a clone sees those writes.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
}

impl Storage {
    /// Wrap a backend.
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                backend: Box::new(backend),
                subscriptions: SubscriptionManager::new(),
            }),
        }
    }

    /// Fresh, empty in-memory storage.
    pub fn memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Open or create file storage.
    pub fn open_file(config: StorageConfig) -> Result<Self> {
        Ok(Self::new(FileBackend::open_or_create(config)?))
    }

    /// Raw value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.backend.get(key)
    }

    /// Store `raw` under `key` and notify subscribers.
    pub fn set(&self, key: &str, raw: &str) -> Result<()> {
        self.inner.backend.set(key, raw)?;
        self.inner.subscriptions.broadcast(StorageEvent::Set {
            key: key.to_string(),
            raw: raw.to_string(),
        });
        Ok(())
    }

    /// Delete `key`. Subscribers are notified only if a value was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let removed = self.inner.backend.remove(key)?;
        if removed {
            self.inner.subscriptions.broadcast(StorageEvent::Removed {
                key: key.to_string(),
            });
        }
        Ok(removed)
    }

    /// All stored keys.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.inner.backend.keys()
    }

    /// Delete every key and notify subscribers.
    pub fn clear(&self) -> Result<()> {
        self.inner.backend.clear()?;
        self.inner.subscriptions.broadcast(StorageEvent::Cleared);
        Ok(())
    }

    /// Subscribe to changes made through any clone of this handle.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        self.inner.subscriptions.subscribe(config)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.subscriptions.unsubscribe(id)
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.subscription_count()
    }

    /// Whether two handles share the same backend.
    pub fn same_backend(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}
