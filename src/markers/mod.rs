//! The two persisted marker stores.
//!
//! - [`UserMarkerStore`]: the user's own marker under `USER_MARKER`
//! - [`NearbyMarkersStore`]: an ordered list of nearby markers under
//!   `NEARBY_MARKERS`
//!
//! Each store is an explicit object opened against a [`Storage`] handle.
//! The two are independent and may share a handle or use separate ones.
//!
//! [`Storage`]: crate::Storage

mod nearby;
mod user;

pub use nearby::NearbyMarkersStore;
pub use user::UserMarkerStore;
