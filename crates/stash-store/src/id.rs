//! Identifier generation.
//!
//! Stores consult an [`IdGenerator`] whenever a blob is created without a
//! caller-chosen identifier. The generator is injected at construction, so
//! tests can swap the random default for a deterministic sequence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Produces unique string identifiers.
///
/// Generation cannot fail. Uniqueness is probabilistic for the UUID-based
/// generators and per-instance for [`SequentialGenerator`].
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh identifier.
    fn generate(&self) -> String;
}

impl<G: IdGenerator + ?Sized> IdGenerator for Box<G> {
    fn generate(&self) -> String {
        (**self).generate()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Arc<G> {
    fn generate(&self) -> String {
        (**self).generate()
    }
}

/// Random 128-bit identifiers (UUID v4, hyphenated lowercase).
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Time-ordered identifiers (UUID v7).
///
/// Identifiers generated later sort after earlier ones (millisecond
/// resolution); the remaining bits are random.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeOrderedGenerator;

impl IdGenerator for TimeOrderedGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::now_v7().to_string()
    }
}

/// Deterministic `<prefix><n>` identifiers, starting at 1.
#[derive(Debug)]
pub struct SequentialGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialGenerator {
    /// Create a generator emitting `prefix1`, `prefix2`, ...
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }

    /// The prefix prepended to every identifier.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for SequentialGenerator {
    fn default() -> Self {
        Self::new("")
    }
}

impl IdGenerator for SequentialGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }
}
