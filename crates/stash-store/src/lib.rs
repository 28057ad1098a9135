//! Identifier-addressed blob storage.
//!
//! A blob store maps string identifiers to immutable byte payloads. Blobs
//! are created once, read any number of times, and deleted exactly once;
//! there is no update. Identifiers are either chosen by the caller or drawn
//! from an injected [`IdGenerator`].
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`MemoryStore`] -- keyed by any non-empty string, pluggable generator
//! - [`UuidStore`] -- keyed strictly by UUID, generates random v4 UUIDs
//!
//! [`StoreConfig`] selects one of them at construction time.
//!
//! # Read Shapes
//!
//! Payloads are held as [`bytes::Bytes`]. [`BlobStore::view`] returns a
//! random-access view of the stored bytes and [`BlobStore::read`] wraps the
//! same view in a sequential [`BlobReader`]. Neither copies the payload and
//! neither can mutate it.
//!
//! # Design Rules
//!
//! 1. At most one blob per identifier; creation never overwrites.
//! 2. Check-and-insert is atomic, so concurrent creates under one
//!    identifier have exactly one winner.
//! 3. Arguments are validated before store state is touched.
//! 4. Payload streams are consumed outside the store lock.
//! 5. Errors are returned, never logged and swallowed.

pub mod config;
pub mod error;
pub mod id;
pub mod memory;
mod slots;
pub mod traits;
pub mod uuid_store;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{ConfigError, GeneratorConfig, Keying, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use id::{IdGenerator, SequentialGenerator, TimeOrderedGenerator, UuidGenerator};
pub use memory::MemoryStore;
pub use traits::{BlobReader, BlobStore};
pub use uuid_store::UuidStore;
