//! Durable directory-backed backend.
//!
//! Every key is stored in its own file named after the hex-encoded key.
//! An entry file holds a small header, the JSON payload and a CRC32 of the
//! payload. Writes land in a temporary file which is then renamed over the
//! entry, so readers see either the old or the new value.

use super::{validate_key, StorageBackend};
use crate::error::{Result, StoreError};
use fs2::FileExt;
use lru::LruCache;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Magic bytes for the storage manifest.
const MANIFEST_MAGIC: &[u8; 4] = b"MKM\0";

/// Magic bytes for entry files.
const ENTRY_MAGIC: &[u8; 4] = b"MKE\0";

/// Current on-disk format version.
const FORMAT_VERSION: u8 = 1;

/// Magic + version + payload length.
const ENTRY_HEADER_LEN: usize = 4 + 1 + 8;

const ENTRY_EXTENSION: &str = "entry";

/// File backend configuration.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// Directory holding the entries.
    pub path: PathBuf,

    /// Read cache size (number of entries).
    pub cache_size: usize,

    /// Whether to create the directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./marker-store"),
            cache_size: 64,
            create_if_missing: true,
        }
    }
}

/// Key-value storage persisted in a directory.
///
/// The directory is locked exclusively for the lifetime of the backend.
pub struct FileBackend {
    /// Storage directory.
    path: PathBuf,

    /// Lock file for exclusive access.
    _lock_file: File,

    /// Recently read or written values.
    cache: Mutex<LruCache<String, String>>,

    /// Serializes writes and cache fills.
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Open an existing storage directory or create a new one.
    pub fn open_or_create(config: StorageConfig) -> Result<Self> {
        if config.path.join("MANIFEST").exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Create a new storage directory.
    pub fn create(config: StorageConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        Self::write_manifest(&config.path)?;
        debug!(path = %config.path.display(), "created file storage");
        Self::init(config)
    }

    /// Open an existing storage directory.
    pub fn open(config: StorageConfig) -> Result<Self> {
        Self::verify_manifest(&config.path)?;
        Self::init(config)
    }

    fn init(config: StorageConfig) -> Result<Self> {
        let lock_file = Self::acquire_lock(&config.path)?;
        let cache_size = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            path: config.path,
            _lock_file: lock_file,
            cache: Mutex::new(LruCache::new(cache_size)),
            write_lock: Mutex::new(()),
        })
    }

    /// Storage directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read an entry, reporting corruption as an error instead of absence.
    pub fn read_entry(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;

        if let Some(raw) = self.cache.lock().get(key).cloned() {
            return Ok(Some(raw));
        }

        // Fill the cache under the write lock so a concurrent set or remove
        // cannot be overwritten by the bytes read here.
        let _lock = self.write_lock.lock();
        if let Some(raw) = self.cache.lock().get(key).cloned() {
            return Ok(Some(raw));
        }

        let bytes = match fs::read(self.entry_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let raw = decode_entry(&bytes)?;
        self.cache.lock().put(key.to_string(), raw.clone());
        Ok(Some(raw))
    }

    /// Full path of the file backing `key`.
    fn entry_path(&self, key: &str) -> PathBuf {
        self.path
            .join(format!("{}.{}", hex::encode(key), ENTRY_EXTENSION))
    }

    fn write_manifest(path: &Path) -> Result<()> {
        let mut file = File::create(path.join("MANIFEST"))?;

        file.write_all(MANIFEST_MAGIC)?;
        file.write_all(&[FORMAT_VERSION])?;
        file.sync_all()?;

        Ok(())
    }

    fn verify_manifest(path: &Path) -> Result<()> {
        let mut file = File::open(path.join("MANIFEST"))?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != MANIFEST_MAGIC {
            return Err(StoreError::InvalidFormat("Invalid storage magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != FORMAT_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "Unsupported storage version: {}",
                version[0]
            )));
        }

        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join("LOCK"))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        Ok(lock_file)
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.read_entry(key) {
            Ok(raw) => Ok(raw),
            Err(e @ (StoreError::Io(_) | StoreError::InvalidKey(_))) => Err(e),
            Err(e) => {
                warn!(key, error = %e, "discarding corrupt storage entry");
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, raw: &str) -> Result<()> {
        validate_key(key)?;
        let _lock = self.write_lock.lock();

        let entry_path = self.entry_path(key);
        let tmp_path = entry_path.with_extension("tmp");

        let mut file = File::create(&tmp_path)?;
        file.write_all(&encode_entry(raw))?;
        file.sync_all()?;
        fs::rename(&tmp_path, &entry_path)?;

        self.cache.lock().put(key.to_string(), raw.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let _lock = self.write_lock.lock();

        self.cache.lock().pop(key);

        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if let Some(key) = hex::decode(stem)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
            {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn clear(&self) -> Result<()> {
        let keys = self.keys()?;
        let _lock = self.write_lock.lock();

        for key in keys {
            match fs::remove_file(self.entry_path(&key)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.cache.lock().clear();
        Ok(())
    }
}

fn encode_entry(raw: &str) -> Vec<u8> {
    let payload = raw.as_bytes();
    let mut buf = Vec::with_capacity(ENTRY_HEADER_LEN + payload.len() + 4);

    buf.extend_from_slice(ENTRY_MAGIC);
    buf.push(FORMAT_VERSION);
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());

    buf
}

fn decode_entry(bytes: &[u8]) -> Result<String> {
    if bytes.len() < ENTRY_HEADER_LEN {
        return Err(StoreError::Corruption("Truncated entry header".into()));
    }

    if &bytes[0..4] != ENTRY_MAGIC {
        return Err(StoreError::InvalidFormat("Invalid entry magic".into()));
    }

    if bytes[4] != FORMAT_VERSION {
        return Err(StoreError::InvalidFormat(format!(
            "Unsupported entry version: {}",
            bytes[4]
        )));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[5..ENTRY_HEADER_LEN]);
    let payload_end = usize::try_from(u64::from_le_bytes(len_bytes))
        .ok()
        .and_then(|len| ENTRY_HEADER_LEN.checked_add(len))
        .ok_or_else(|| StoreError::Corruption("Entry length overflow".into()))?;

    if bytes.len() != payload_end + 4 {
        return Err(StoreError::Corruption(format!(
            "Entry length mismatch: header says {} bytes, file has {}",
            payload_end + 4,
            bytes.len()
        )));
    }

    let payload = &bytes[ENTRY_HEADER_LEN..payload_end];

    let mut checksum_bytes = [0u8; 4];
    checksum_bytes.copy_from_slice(&bytes[payload_end..]);
    let stored_checksum = u32::from_le_bytes(checksum_bytes);
    let computed_checksum = crc32fast::hash(payload);

    if stored_checksum != computed_checksum {
        return Err(StoreError::ChecksumMismatch {
            expected: stored_checksum,
            got: computed_checksum,
        });
    }

    String::from_utf8(payload.to_vec())
        .map_err(|e| StoreError::Corruption(format!("Entry is not UTF-8: {}", e)))
}
