use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;

use crate::error::{StoreError, StoreResult};

/// Key → payload map shared by the in-memory stores.
///
/// Every operation holds the lock only for the map access itself.
pub(crate) struct Slots<K> {
    entries: RwLock<HashMap<K, Bytes>>,
}

impl<K: Eq + Hash + Display> Slots<K> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<K, Bytes>>> {
        self.entries.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<K, Bytes>>> {
        self.entries.write().map_err(|_| StoreError::Poisoned)
    }

    /// Insert unless `key` is taken. Check and insert happen under one write
    /// guard.
    pub(crate) fn insert_new(&self, key: K, data: Bytes) -> StoreResult<()> {
        let mut map = self.write()?;
        match map.entry(key) {
            Entry::Occupied(e) => Err(StoreError::AlreadyExists(e.key().to_string())),
            Entry::Vacant(v) => {
                v.insert(data);
                Ok(())
            }
        }
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> StoreResult<Bytes>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        let map = self.read()?;
        map.get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> StoreResult<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Ok(self.read()?.contains_key(key))
    }

    pub(crate) fn remove<Q>(&self, key: &Q) -> StoreResult<Bytes>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        let mut map = self.write()?;
        map.remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    pub(crate) fn keys(&self) -> StoreResult<BTreeSet<String>> {
        let map = self.read()?;
        Ok(map.keys().map(ToString::to_string).collect())
    }

    // Counts never mutate, so a poisoned guard is still safe to read.
    fn peek(&self) -> RwLockReadGuard<'_, HashMap<K, Bytes>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn len(&self) -> usize {
        self.peek().len()
    }

    pub(crate) fn total_bytes(&self) -> u64 {
        self.peek().values().map(|data| data.len() as u64).sum()
    }
}
