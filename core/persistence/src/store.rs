use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::StoreError;

/// Minimal KV abstraction over the underlying store, matching the
/// `db.Has` / `db.Put` / `db.Get` / `db.Delete` surface that
/// `accessor_shard.go` builds its block/committee/best-state accessors on.
pub trait KvStore: Send + Sync {
    fn has(&self, key: &[u8]) -> Result<bool, StoreError>;
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;
}

/// In-process store backing portal-chain tests and single-node
/// deployments that don't need a persistent on-disk database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.inner.read().unwrap().contains_key(key))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.read().unwrap().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.inner.write().unwrap().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.inner.write().unwrap().remove(key);
        Ok(())
    }
}

/// Stores `value` at `key` as JSON, refusing to overwrite an existing
/// entry — mirroring `StoreShardBlock`'s `db.Has` guard that returns
/// `BlockExisted` rather than silently clobbering a committed block.
pub fn store_new<S: KvStore + ?Sized, T: Serialize>(
    store: &S,
    key: &[u8],
    value: &T,
) -> Result<(), StoreError> {
    if store.has(key)? {
        return Err(StoreError::BlockExisted(key.to_vec()));
    }
    let bytes = serde_json::to_vec(value).map_err(StoreError::JsonMarshalError)?;
    store.put(key, &bytes)
}

pub fn load<S: KvStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &[u8],
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(bytes) => {
            let value = serde_json::from_slice(&bytes).map_err(StoreError::JsonUnmarshalError)?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}
