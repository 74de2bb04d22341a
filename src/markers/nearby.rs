//! Markers near the user, in insertion order.

use crate::cell::{CellOptions, PersistedCell};
use crate::error::Result;
use crate::storage::Storage;
use crate::subscriptions::StorageEvent;
use crate::types::{Marker, NEARBY_MARKERS_KEY};

/// Persisted ordered list of markers, seeded empty.
///
/// The list is unbounded; every mutation rewrites the whole list.
#[derive(Debug)]
pub struct NearbyMarkersStore {
    cell: PersistedCell<Vec<Marker>>,
}

impl NearbyMarkersStore {
    pub fn open(storage: Storage) -> Result<Self> {
        Self::open_with(storage, CellOptions::default())
    }

    pub fn open_with(storage: Storage, options: CellOptions) -> Result<Self> {
        Ok(Self {
            cell: PersistedCell::open_with(storage, NEARBY_MARKERS_KEY, Vec::new(), options)?,
        })
    }

    pub fn markers(&self) -> &[Marker] {
        self.cell.get()
    }

    pub fn len(&self) -> usize {
        self.cell.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell.get().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.cell.get().get(index)
    }

    /// First marker with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&Marker> {
        self.cell.get().iter().find(|marker| marker.name == name)
    }

    /// Append a marker at the end.
    pub fn push(&mut self, marker: Marker) -> Result<()> {
        self.cell.update(|markers| markers.push(marker))
    }

    /// Append several markers with a single write.
    pub fn extend<I>(&mut self, markers: I) -> Result<()>
    where
        I: IntoIterator<Item = Marker>,
    {
        self.cell.update(|list| list.extend(markers))
    }

    /// Remove the marker at `index`, shifting later markers down.
    ///
    /// Out-of-range indices return `None` without writing.
    pub fn remove(&mut self, index: usize) -> Result<Option<Marker>> {
        if index >= self.len() {
            return Ok(None);
        }
        self.cell.update(|markers| Some(markers.remove(index)))
    }

    /// Keep only markers matching the predicate. Returns how many were removed.
    pub fn retain<F>(&mut self, f: F) -> Result<usize>
    where
        F: FnMut(&Marker) -> bool,
    {
        self.cell.update(|markers| {
            let before = markers.len();
            markers.retain(f);
            before - markers.len()
        })
    }

    /// Replace the whole list.
    pub fn replace(&mut self, markers: Vec<Marker>) -> Result<()> {
        self.cell.set(markers)
    }

    /// Empty the list. The empty list stays stored under the key.
    pub fn clear(&mut self) -> Result<()> {
        self.cell.set(Vec::new())
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.cell.refresh()
    }

    pub fn apply_event(&mut self, event: &StorageEvent) -> bool {
        self.cell.apply_event(event)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.cell.get().iter()
    }

    pub fn cell(&self) -> &PersistedCell<Vec<Marker>> {
        &self.cell
    }

    pub fn cell_mut(&mut self) -> &mut PersistedCell<Vec<Marker>> {
        &mut self.cell
    }
}

impl<'a> IntoIterator for &'a NearbyMarkersStore {
    type Item = &'a Marker;
    type IntoIter = std::slice::Iter<'a, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
