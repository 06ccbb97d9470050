use super::scan_map;
use crate::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, PrefixScan};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File-backed key-value store for single-node deployments without RocksDB.
///
/// The whole map is rewritten on every batch via temp file + fsync + rename,
/// so a crash leaves either the old or the new snapshot on disk.
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open (or create on first write) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::File::open(&path) {
            Ok(mut file) => {
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).map_err(KVStoreError::io)?;
                let data = Self::decode(&bytes)?;
                info!(
                    path = %path.display(),
                    keys = data.len(),
                    bytes = bytes.len(),
                    "Loaded storage file"
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No existing storage file, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(KVStoreError::io(e)),
        };

        Ok(Self { data, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Format: [key_len:u32][key][value_len:u32][value]...
    fn decode(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, KVStoreError> {
        let mut data = BTreeMap::new();
        let mut cursor = 0;

        let read_chunk = |cursor: &mut usize| -> Option<Vec<u8>> {
            let len_end = cursor.checked_add(4)?;
            let len = u32::from_le_bytes(bytes.get(*cursor..len_end)?.try_into().ok()?) as usize;
            let end = len_end.checked_add(len)?;
            let chunk = bytes.get(len_end..end)?.to_vec();
            *cursor = end;
            Some(chunk)
        };

        while cursor < bytes.len() {
            let entry_start = cursor;
            let (Some(key), Some(value)) = (read_chunk(&mut cursor), read_chunk(&mut cursor)) else {
                warn!(offset = entry_start, "Truncated entry in storage file");
                return Err(KVStoreError::CorruptionError {
                    message: format!("truncated entry at byte {}", entry_start),
                });
            };
            data.insert(key, value);
        }

        Ok(data)
    }

    fn save_to_file(&self) -> Result<(), KVStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(KVStoreError::io)?;
            }
        }

        let mut bytes = Vec::new();
        for (key, value) in &self.data {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(value);
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(KVStoreError::io)?;
        file.write_all(&bytes).map_err(KVStoreError::io)?;
        file.sync_all().map_err(KVStoreError::io)?;
        std::fs::rename(&temp_path, &self.path).map_err(KVStoreError::io)?;

        Ok(())
    }

    /// Apply `operations` to a copy, persist it, then swap it in.
    fn apply(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let previous = self.data.clone();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        if let Err(e) = self.save_to_file() {
            self.data = previous;
            return Err(e);
        }
        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.apply(vec![BatchOperation::put(key, value)])
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.apply(vec![BatchOperation::delete(key)])
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.apply(operations)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<PrefixScan, KVStoreError> {
        Ok(scan_map(&self.data, prefix))
    }
}
