use std::collections::BTreeSet;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{validate_identifier, StoreResult};
use crate::id::{IdGenerator, UuidGenerator};
use crate::slots::Slots;
use crate::traits::BlobStore;

/// In-memory blob store keyed by arbitrary non-empty strings.
///
/// Callers may choose identifiers themselves; otherwise one is taken from
/// the generator supplied at construction ([`UuidGenerator`] by default).
/// Data is lost when the store is dropped.
pub struct MemoryStore<G = UuidGenerator> {
    slots: Slots<String>,
    generator: G,
}

impl MemoryStore<UuidGenerator> {
    /// Create an empty store that generates random UUID identifiers.
    pub fn new() -> Self {
        Self::with_generator(UuidGenerator)
    }
}

impl Default for MemoryStore<UuidGenerator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: IdGenerator> MemoryStore<G> {
    /// Create an empty store that draws identifiers from `generator`.
    pub fn with_generator(generator: G) -> Self {
        debug!(generator = std::any::type_name::<G>(), "created memory store");
        Self {
            slots: Slots::new(),
            generator,
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
}

impl<G: IdGenerator> BlobStore for MemoryStore<G> {
    fn create_bytes(&self, data: Bytes) -> StoreResult<String> {
        let identifier = self.generator.generate();
        self.create_bytes_with_id(data, &identifier)?;
        Ok(identifier)
    }

    fn create_bytes_with_id(&self, data: Bytes, identifier: &str) -> StoreResult<()> {
        validate_identifier(identifier)?;
        let len = data.len();
        self.slots.insert_new(identifier.to_string(), data)?;
        trace!(%identifier, bytes = len, "stored blob");
        Ok(())
    }

    fn view(&self, identifier: &str) -> StoreResult<Bytes> {
        validate_identifier(identifier)?;
        trace!(%identifier, "reading blob");
        self.slots.get(identifier)
    }

    fn list(&self) -> StoreResult<BTreeSet<String>> {
        let ids = self.slots.keys()?;
        trace!(count = ids.len(), "listed blobs");
        Ok(ids)
    }

    fn delete(&self, identifier: &str) -> StoreResult<()> {
        validate_identifier(identifier)?;
        trace!(%identifier, "removing blob");
        self.slots.remove(identifier).map(|_| ())
    }

    fn exists(&self, identifier: &str) -> StoreResult<bool> {
        validate_identifier(identifier)?;
        self.slots.contains(identifier)
    }
}

impl<G> std::fmt::Debug for MemoryStore<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("blob_count", &self.slots.len())
            .finish()
    }
}
