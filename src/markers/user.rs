//! The user's own marker.

use crate::cell::{CellOptions, PersistedCell};
use crate::error::Result;
use crate::storage::Storage;
use crate::subscriptions::StorageEvent;
use crate::types::{Marker, USER_MARKER_KEY};

/// Persisted user marker, seeded with [`Marker::default`].
#[derive(Debug)]
pub struct UserMarkerStore {
    cell: PersistedCell<Marker>,
}

impl UserMarkerStore {
    /// Open the store, seeding the default marker if nothing usable is stored.
    pub fn open(storage: Storage) -> Result<Self> {
        Self::open_with(storage, CellOptions::default())
    }

    pub fn open_with(storage: Storage, options: CellOptions) -> Result<Self> {
        Ok(Self {
            cell: PersistedCell::open_with(storage, USER_MARKER_KEY, Marker::default(), options)?,
        })
    }

    pub fn marker(&self) -> &Marker {
        self.cell.get()
    }

    /// Replace the marker.
    pub fn set_marker(&mut self, marker: Marker) -> Result<()> {
        self.cell.set(marker)
    }

    /// Move the marker, keeping its name.
    pub fn move_to(&mut self, latitude: f64, longitude: f64) -> Result<()> {
        self.cell.update(|marker| {
            marker.latitude = latitude;
            marker.longitude = longitude;
        })
    }

    /// Change the marker's label.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.cell.update(|marker| marker.name = name)
    }

    /// Restore the default marker.
    pub fn reset(&mut self) -> Result<()> {
        self.cell.reset()
    }

    /// Reload from storage.
    pub fn refresh(&mut self) -> Result<()> {
        self.cell.refresh()
    }

    pub fn apply_event(&mut self, event: &StorageEvent) -> bool {
        self.cell.apply_event(event)
    }

    pub fn cell(&self) -> &PersistedCell<Marker> {
        &self.cell
    }

    pub fn cell_mut(&mut self) -> &mut PersistedCell<Marker> {
        &mut self.cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_default_seeded() {
        let storage = Storage::memory();
        let store = UserMarkerStore::open(storage.clone()).unwrap();

        assert_eq!(store.marker(), &Marker::default());

        let raw = storage.get(USER_MARKER_KEY).unwrap().unwrap();
        let stored: Marker = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, Marker::default());
    }

    #[test]
    fn test_move_keeps_name() {
        let storage = Storage::memory();
        let mut store = UserMarkerStore::open(storage.clone()).unwrap();

        store.move_to(-12.5, 130.25).unwrap();

        assert_eq!(store.marker(), &Marker::new(-12.5, 130.25, "Milrem Robotics"));
        let reopened = UserMarkerStore::open(storage).unwrap();
        assert_eq!(reopened.marker(), store.marker());
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let storage = Storage::memory();
        let mut store = UserMarkerStore::open(storage.clone()).unwrap();
        store.rename("Kept").unwrap();

        let result = store.set_marker(Marker::new(f64::NAN, 10.0, "Lost"));
        assert!(matches!(result, Err(StoreError::Serialization(_))));
        assert!(store.move_to(0.0, f64::INFINITY).is_err());
        assert_eq!(store.marker().name, "Kept");

        let reopened = UserMarkerStore::open(storage).unwrap();
        assert_eq!(reopened.marker(), &Marker::new(59.429813, 24.849374, "Kept"));
    }

    #[test]
    fn test_rename_and_reset() {
        let storage = Storage::memory();
        let mut store = UserMarkerStore::open(storage).unwrap();

        store.rename("Base camp").unwrap();
        assert_eq!(store.marker().name, "Base camp");
        assert_eq!(store.marker().latitude, 59.429813);

        store.reset().unwrap();
        assert_eq!(store.marker(), &Marker::default());
    }
}
