use std::collections::BTreeSet;

use bytes::Bytes;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{validate_identifier, StoreError, StoreResult};
use crate::slots::Slots;
use crate::traits::BlobStore;

/// In-memory blob store keyed strictly by UUID.
///
/// Generated identifiers are random v4 UUIDs. Every identifier handed in by
/// a caller must parse as a UUID; it is compared by value, so differently
/// formatted spellings of the same UUID address the same blob. [`list`]
/// returns the canonical hyphenated form.
///
/// [`list`]: BlobStore::list
pub struct UuidStore {
    slots: Slots<Uuid>,
}

impl UuidStore {
    /// Create an empty store.
    pub fn new() -> Self {
        debug!("created uuid store");
        Self {
            slots: Slots::new(),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total payload bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.slots.total_bytes()
    }

    fn insert(&self, uuid: Uuid, data: Bytes) -> StoreResult<()> {
        let len = data.len();
        self.slots.insert_new(uuid, data)?;
        trace!(identifier = %uuid, bytes = len, "stored blob");
        Ok(())
    }
}

impl Default for UuidStore {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_identifier(identifier: &str) -> StoreResult<Uuid> {
    validate_identifier(identifier)?;
    Uuid::parse_str(identifier)
        .map_err(|e| StoreError::InvalidArgument(format!("{identifier} is not a UUID: {e}")))
}

impl BlobStore for UuidStore {
    fn create_bytes(&self, data: Bytes) -> StoreResult<String> {
        let uuid = Uuid::new_v4();
        self.insert(uuid, data)?;
        Ok(uuid.to_string())
    }

    fn create_bytes_with_id(&self, data: Bytes, identifier: &str) -> StoreResult<()> {
        let uuid = parse_identifier(identifier)?;
        self.insert(uuid, data)
    }

    fn view(&self, identifier: &str) -> StoreResult<Bytes> {
        let uuid = parse_identifier(identifier)?;
        trace!(identifier = %uuid, "reading blob");
        self.slots.get(&uuid)
    }

    fn list(&self) -> StoreResult<BTreeSet<String>> {
        let ids = self.slots.keys()?;
        trace!(count = ids.len(), "listed blobs");
        Ok(ids)
    }

    fn delete(&self, identifier: &str) -> StoreResult<()> {
        let uuid = parse_identifier(identifier)?;
        trace!(identifier = %uuid, "removing blob");
        self.slots.remove(&uuid).map(|_| ())
    }

    fn exists(&self, identifier: &str) -> StoreResult<bool> {
        let uuid = parse_identifier(identifier)?;
        self.slots.contains(&uuid)
    }
}

impl std::fmt::Debug for UuidStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UuidStore")
            .field("blob_count", &self.slots.len())
            .finish()
    }
}
