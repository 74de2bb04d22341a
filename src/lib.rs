//! # Marker Store
//!
//! Persisted map marker state kept in a string-keyed JSON storage medium.
//!
//! ## Core Concepts
//!
//! - **Storage**: A shared handle to a key-value backend (in memory or on disk)
//! - **Cells**: A typed value bound to one key, written through on every change
//! - **Markers**: The user's own marker and an ordered list of nearby markers
//! - **Subscriptions**: In-process notifications of key changes
//!
//! ## Example
//!
//! ```ignore
//! use marker_store::{Marker, NearbyMarkersStore, Storage, StorageConfig, UserMarkerStore};
//!
//! let storage = Storage::open_file(StorageConfig {
//!     path: "./markers".into(),
//!     ..Default::default()
//! })?;
//!
//! // Seeded with the default marker on first open
//! let mut user = UserMarkerStore::open(storage.clone())?;
//! user.move_to(59.4370, 24.7536)?;
//!
//! let mut nearby = NearbyMarkersStore::open(storage)?;
//! nearby.push(Marker::new(59.4420, 24.7930, "Kadriorg"))?;
//! ```

pub mod backends;
pub mod cell;
pub mod error;
pub mod markers;
pub mod storage;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use backends::{FileBackend, MemoryBackend, StorageBackend, StorageConfig};
pub use cell::{CellOptions, PersistedCell};
pub use error::{Result, StoreError};
pub use markers::{NearbyMarkersStore, UserMarkerStore};
pub use storage::Storage;
pub use subscriptions::{
    DropReason, StorageEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId, SubscriptionManager,
};
pub use types::*;
