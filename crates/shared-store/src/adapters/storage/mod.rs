//! Storage Adapters
//!
//! Implementations of the `KeyValueStore` trait.

mod file;
mod memory;

pub use file::FileBackedKVStore;
pub use memory::InMemoryKVStore;

use std::collections::BTreeMap;

/// Ordered scan over a `BTreeMap` shared by both adapters.
pub(crate) fn scan_map(
    data: &BTreeMap<Vec<u8>, Vec<u8>>,
    prefix: &[u8],
) -> Vec<(Vec<u8>, Vec<u8>)> {
    data.range(prefix.to_vec()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
