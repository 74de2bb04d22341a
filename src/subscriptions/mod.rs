//! Change notifications for storage keys.
//!
//! Every successful write, removal or clear made through a [`Storage`]
//! handle is broadcast to in-process subscribers:
//!
//! - Filtering by key
//! - Bounded buffers with slow-subscriber dropping
//!
//! Writes made by other processes to a shared file backend are not observed.
//!
//! # Example
//!
//! ```ignore
//! let storage = Storage::memory();
//! let handle = storage.subscribe(SubscriptionConfig::key("USER_MARKER"));
//!
//! storage.set("USER_MARKER", "{}")?;
//!
//! match handle.recv()? {
//!     StorageEvent::Set { key, raw } => println!("{key} = {raw}"),
//!     _ => {}
//! }
//! ```
//!
//! [`Storage`]: crate::Storage

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, StorageEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId,
};
