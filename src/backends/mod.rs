//! Key-value storage media.
//!
//! A backend maps string keys to raw JSON strings. Two are provided:
//! an in-memory map for tests and ephemeral sessions, and a durable
//! directory-backed store with one checksummed file per key.

mod file;
mod memory;

pub use file::{FileBackend, StorageConfig};
pub use memory::MemoryBackend;

use crate::error::{Result, StoreError};

/// A synchronous string-keyed storage medium.
///
/// Implementations serialize writes to the same key internally. Writes from
/// different handles are not coordinated beyond that: the last write wins.
pub trait StorageBackend: Send + Sync {
    /// Raw value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `raw` under `key`, replacing any prior value.
    fn set(&self, key: &str, raw: &str) -> Result<()>;

    /// Delete `key`. Returns whether a value was present.
    fn remove(&self, key: &str) -> Result<bool>;

    /// All keys currently stored, in ascending order.
    fn keys(&self) -> Result<Vec<String>>;

    /// Delete every key.
    fn clear(&self) -> Result<()>;
}

/// Reject keys no backend can store.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
