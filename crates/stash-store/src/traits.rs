use std::collections::BTreeSet;
use std::io::Read;

use bytes::{Buf, Bytes};

use crate::error::{StoreError, StoreResult};

/// Sequential reader over a stored payload.
///
/// Implements [`std::io::Read`] and [`std::io::BufRead`]. It owns a shared,
/// immutable view of the payload, so it stays valid after the blob is
/// deleted from the store.
pub type BlobReader = bytes::buf::Reader<Bytes>;

/// Identifier-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - At most one blob per identifier. Creating under an identifier that is
///   already present fails with [`StoreError::AlreadyExists`] and never
///   overwrites.
/// - Payloads are immutable once stored. Readers receive shared views that
///   cannot mutate the stored bytes.
/// - Per-identifier operations are linearizable: once `create` returns, every
///   later call observes the blob; once `delete` returns, none does.
/// - Arguments are validated before store state is touched.
/// - Errors are returned to the caller, never logged and swallowed.
pub trait BlobStore: Send + Sync {
    /// Store `data` under a freshly generated identifier and return it.
    fn create_bytes(&self, data: Bytes) -> StoreResult<String>;

    /// Store `data` under the caller-chosen `identifier`.
    fn create_bytes_with_id(&self, data: Bytes, identifier: &str) -> StoreResult<()>;

    /// Random-access view of the payload stored under `identifier`.
    fn view(&self, identifier: &str) -> StoreResult<Bytes>;

    /// Point-in-time snapshot of all stored identifiers.
    fn list(&self) -> StoreResult<BTreeSet<String>>;

    /// Remove the blob stored under `identifier`.
    ///
    /// Fails with [`StoreError::NotFound`] if nothing is stored there, so a
    /// second delete of the same identifier is an error.
    fn delete(&self, identifier: &str) -> StoreResult<()>;

    /// Check whether a blob is stored under `identifier`.
    fn exists(&self, identifier: &str) -> StoreResult<bool>;

    /// Consume `reader` to the end and store it under a generated identifier.
    fn create(&self, reader: &mut dyn Read) -> StoreResult<String> {
        let data = read_payload(reader)?;
        self.create_bytes(data)
    }

    /// Consume `reader` to the end and store it under `identifier`.
    ///
    /// An identifier already in use is rejected before the stream is read.
    /// The authoritative uniqueness check still happens at insert time.
    fn create_with_id(&self, reader: &mut dyn Read, identifier: &str) -> StoreResult<()> {
        if self.exists(identifier)? {
            return Err(StoreError::AlreadyExists(identifier.to_string()));
        }
        let data = read_payload(reader)?;
        self.create_bytes_with_id(data, identifier)
    }

    /// Sequential reader over the payload stored under `identifier`.
    fn read(&self, identifier: &str) -> StoreResult<BlobReader> {
        Ok(self.view(identifier)?.reader())
    }
}

fn read_payload(reader: &mut dyn Read) -> StoreResult<Bytes> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "upstream closed"))
        }
    }

    #[test]
    fn read_payload_consumes_everything() {
        let mut src = io::Cursor::new(vec![7u8; 10_000]);
        let data = read_payload(&mut src).unwrap();
        assert_eq!(data.len(), 10_000);
        assert!(data.iter().all(|&b| b == 7));
    }

    #[test]
    fn read_payload_surfaces_stream_errors() {
        let err = read_payload(&mut FailingReader).unwrap_err();
        match err {
            StoreError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
