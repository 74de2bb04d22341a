//! Write-through persisted cells.
//!
//! A [`PersistedCell`] holds one value of `T` bound to a storage key. It is
//! loaded once when opened and every mutation is serialized to JSON and
//! written to storage before the call returns. Reads never touch storage.
//!
//! Stored values that fail to decode as `T` are treated like absent values:
//! the cell starts from its default and re-seeds storage. This is logged but
//! never reported to the caller. Backend I/O failures are reported.

use crate::error::{Result, StoreError};
use crate::storage::Storage;
use crate::subscriptions::{StorageEvent, SubscriptionConfig, SubscriptionHandle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Options controlling how a cell is loaded.
#[derive(Clone, Copy, Debug)]
pub struct CellOptions {
    /// Write the default to storage when no usable value is stored.
    /// Default: true
    pub write_defaults: bool,

    /// Complete stored JSON objects with fields from the default's JSON
    /// object before decoding. Default: false
    pub merge_defaults: bool,
}

impl Default for CellOptions {
    fn default() -> Self {
        Self {
            write_defaults: true,
            merge_defaults: false,
        }
    }
}

/// A value of `T` kept in sync with one storage key.
#[derive(Debug)]
pub struct PersistedCell<T> {
    storage: Storage,
    key: String,
    default: T,
    value: T,
    options: CellOptions,
}

impl<T> PersistedCell<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Open a cell with default options.
    pub fn open(storage: Storage, key: impl Into<String>, default: T) -> Result<Self> {
        Self::open_with(storage, key, default, CellOptions::default())
    }

    /// Open a cell, loading the stored value or falling back to `default`.
    pub fn open_with(
        storage: Storage,
        key: impl Into<String>,
        default: T,
        options: CellOptions,
    ) -> Result<Self> {
        let key = key.into();
        let value = load(&storage, &key, &default, &options)?;

        Ok(Self {
            storage,
            key,
            default,
            value,
            options,
        })
    }

    /// Current value. No I/O.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value and write it through.
    pub fn set(&mut self, value: T) -> Result<()> {
        persist(&self.storage, &self.key, &value)?;
        self.value = value;
        Ok(())
    }

    /// Mutate the value in place and write it through.
    ///
    /// The closure runs on a copy; if the write fails the cell keeps its
    /// previous value.
    pub fn update<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut next = self.value.clone();
        let out = f(&mut next);
        self.set(next)?;
        Ok(out)
    }

    /// Restore the default and write it through.
    pub fn reset(&mut self) -> Result<()> {
        self.set(self.default.clone())
    }

    /// Delete the key from storage and hold the default in memory.
    ///
    /// Storage is not re-seeded until the next write or open.
    pub fn remove(&mut self) -> Result<()> {
        self.storage.remove(&self.key)?;
        self.value = self.default.clone();
        Ok(())
    }

    /// Reload from storage, picking up writes made through other handles.
    pub fn refresh(&mut self) -> Result<()> {
        self.value = load(&self.storage, &self.key, &self.default, &self.options)?;
        Ok(())
    }

    /// Subscribe to changes of this cell's key.
    pub fn watch(&self) -> SubscriptionHandle {
        self.storage.subscribe(SubscriptionConfig::key(self.key.clone()))
    }

    /// Bring the cell up to date with a storage event.
    ///
    /// Returns whether the event concerned this cell. A removal or clear
    /// leaves the default in memory without re-seeding, like [`remove`].
    ///
    /// [`remove`]: PersistedCell::remove
    pub fn apply_event(&mut self, event: &StorageEvent) -> bool {
        if !event.affects(&self.key) {
            return false;
        }

        match event {
            StorageEvent::Set { raw, .. } => match decode(raw, &self.default, &self.options) {
                Ok(value) => self.value = value,
                Err(e) => {
                    warn!(key = %self.key, error = %e, "ignoring malformed value from storage event");
                    self.value = self.default.clone();
                }
            },
            _ => self.value = self.default.clone(),
        }

        true
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn options(&self) -> CellOptions {
        self.options
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

fn load<T>(storage: &Storage, key: &str, default: &T, options: &CellOptions) -> Result<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    match storage.get(key)? {
        Some(raw) => match decode(&raw, default, options) {
            Ok(value) => return Ok(value),
            Err(e) => warn!(key, error = %e, "stored value is malformed, falling back to default"),
        },
        None => debug!(key, "no stored value, using default"),
    }

    if options.write_defaults {
        persist(storage, key, default)?;
    }

    Ok(default.clone())
}

fn decode<T>(raw: &str, default: &T, options: &CellOptions) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let malformed = |e: serde_json::Error| StoreError::Deserialization(e.to_string());

    if !options.merge_defaults {
        return serde_json::from_str(raw).map_err(malformed);
    }

    let stored: Value = serde_json::from_str(raw).map_err(malformed)?;
    let merged = match (serde_json::to_value(default)?, stored) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            base.extend(overlay);
            Value::Object(base)
        }
        (_, stored) => stored,
    };

    serde_json::from_value(merged).map_err(malformed)
}

/// Serialize and store `value`, refusing JSON that would not decode back.
///
/// serde_json writes non-finite floats as `null`, which would turn a
/// successful write into a malformed value on the next open.
fn persist<T>(storage: &Storage, key: &str, value: &T) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let raw = serde_json::to_string(value)?;
    serde_json::from_str::<T>(&raw).map_err(|e| {
        StoreError::Serialization(format!("value does not round-trip as JSON: {}", e))
    })?;
    storage.set(key, &raw)
}
