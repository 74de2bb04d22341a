//! Error handling and edge case tests.

use marker_store::{
    CellOptions, FileBackend, Marker, MemoryBackend, NearbyMarkersStore, Storage, StorageBackend,
    StorageConfig, StoreError, UserMarkerStore, NEARBY_MARKERS_KEY, USER_MARKER_KEY,
};
use std::fs;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn file_config(dir: &TempDir) -> StorageConfig {
    StorageConfig {
        path: dir.path().join("markers"),
        cache_size: 16,
        create_if_missing: true,
    }
}

fn storage_with(key: &str, raw: &str) -> Storage {
    Storage::new(MemoryBackend::with_entries([(key, raw)]))
}

// --- Malformed Values ---

#[test]
fn test_corrupt_user_marker_falls_back() {
    init_tracing();

    for raw in [
        "not json at all",
        "null",
        "42",
        r#"{"latitude": "north", "longitude": 1.0, "name": "x"}"#,
        r#"{"latitude": 1.0, "name": "missing longitude"}"#,
        r#"[{"latitude": 1.0, "longitude": 2.0, "name": "array"}]"#,
    ] {
        let storage = storage_with(USER_MARKER_KEY, raw);
        let store = UserMarkerStore::open(storage.clone()).unwrap();

        assert_eq!(store.marker(), &Marker::default(), "raw value: {}", raw);

        // Storage re-seeded with the default
        let reseeded: Marker =
            serde_json::from_str(&storage.get(USER_MARKER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(reseeded, Marker::default());
    }
}

#[test]
fn test_corrupt_nearby_markers_fall_back() {
    init_tracing();

    let storage = storage_with(NEARBY_MARKERS_KEY, r#"[{"latitude": 1.0}]"#);
    let store = NearbyMarkersStore::open(storage.clone()).unwrap();

    assert!(store.is_empty());
    assert_eq!(storage.get(NEARBY_MARKERS_KEY).unwrap().as_deref(), Some("[]"));
}

#[test]
fn test_corrupt_value_without_write_defaults_left_in_place() {
    let storage = storage_with(USER_MARKER_KEY, "{broken");
    let store = UserMarkerStore::open_with(
        storage.clone(),
        CellOptions {
            write_defaults: false,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(store.marker(), &Marker::default());
    assert_eq!(storage.get(USER_MARKER_KEY).unwrap().as_deref(), Some("{broken"));
}

#[test]
fn test_partial_marker_merged_with_default() {
    let storage = storage_with(USER_MARKER_KEY, r#"{"name": "Renamed only"}"#);
    let store = UserMarkerStore::open_with(
        storage,
        CellOptions {
            merge_defaults: true,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(
        store.marker(),
        &Marker::new(59.429813, 24.849374, "Renamed only")
    );
}

// --- File Storage Errors ---

#[test]
fn test_corrupt_entry_file_falls_back() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    {
        let storage = Storage::open_file(file_config(&dir)).unwrap();
        let mut store = UserMarkerStore::open(storage).unwrap();
        store.rename("Before corruption").unwrap();
    }

    let entry = dir
        .path()
        .join("markers")
        .join(format!("{}.entry", hex::encode(USER_MARKER_KEY)));
    let mut bytes = fs::read(&entry).unwrap();
    let last = bytes.len() - 5;
    bytes[last] ^= 0x20;
    fs::write(&entry, bytes).unwrap();

    let backend = FileBackend::open(file_config(&dir)).unwrap();
    assert!(matches!(
        backend.read_entry(USER_MARKER_KEY),
        Err(StoreError::ChecksumMismatch { .. })
    ));
    assert_eq!(backend.get(USER_MARKER_KEY).unwrap(), None);

    let storage = Storage::new(backend);
    let store = UserMarkerStore::open(storage).unwrap();
    assert_eq!(store.marker(), &Marker::default());
}

#[test]
fn test_storage_locked_by_other_handle() {
    let dir = TempDir::new().unwrap();
    let _storage = Storage::open_file(file_config(&dir)).unwrap();

    let result = Storage::open_file(file_config(&dir));
    assert!(matches!(result, Err(StoreError::Locked)));
}

#[test]
fn test_invalid_manifest() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("markers");
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("MANIFEST"), b"XXXX\x01").unwrap();

    let result = FileBackend::open(file_config(&dir));
    assert!(matches!(result, Err(StoreError::InvalidFormat(_))));
}

#[test]
fn test_missing_storage_without_create() {
    let dir = TempDir::new().unwrap();
    let result = Storage::open_file(StorageConfig {
        create_if_missing: false,
        ..file_config(&dir)
    });
    assert!(matches!(result, Err(StoreError::NotInitialized)));
}

// --- Edge Cases ---

#[test]
fn test_remove_out_of_range_does_not_write() {
    let storage = Storage::memory();
    let mut store = NearbyMarkersStore::open(storage.clone()).unwrap();
    let handle = store.cell().watch();

    assert_eq!(store.remove(0).unwrap(), None);
    assert!(handle.drain().is_empty());
}

#[test]
fn test_extreme_coordinates_accepted() {
    let storage = Storage::memory();
    let mut store = UserMarkerStore::open(storage.clone()).unwrap();

    store.move_to(-1000.5, 720.0).unwrap();

    let reopened = UserMarkerStore::open(storage).unwrap();
    assert_eq!(reopened.marker().latitude, -1000.5);
    assert_eq!(reopened.marker().longitude, 720.0);
}

#[test]
fn test_removed_key_reseeded_on_next_open() {
    let storage = Storage::memory();
    let mut store = UserMarkerStore::open(storage.clone()).unwrap();
    store.rename("Temp").unwrap();

    store.cell_mut().remove().unwrap();
    assert_eq!(storage.get(USER_MARKER_KEY).unwrap(), None);
    assert_eq!(store.marker(), &Marker::default());

    UserMarkerStore::open(storage.clone()).unwrap();
    assert!(storage.get(USER_MARKER_KEY).unwrap().is_some());
}
