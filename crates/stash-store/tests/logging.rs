//! Log events emitted by the stores.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use stash_store::{BlobStore, MemoryStore, SequentialGenerator, UuidStore};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture(level: tracing::Level, f: impl FnOnce()) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    captured.text()
}

#[test]
fn construction_is_logged_at_debug() {
    let logs = capture(tracing::Level::DEBUG, || {
        let _ = MemoryStore::with_generator(SequentialGenerator::new("x"));
        let _ = UuidStore::new();
    });
    assert!(logs.contains("created memory store"), "{logs}");
    assert!(logs.contains("SequentialGenerator"), "{logs}");
    assert!(logs.contains("created uuid store"), "{logs}");
}

#[test]
fn operations_are_logged_at_trace_without_payload() {
    let logs = capture(tracing::Level::TRACE, || {
        let store = MemoryStore::new();
        store
            .create_bytes_with_id(Bytes::from_static(b"secret-payload"), "k")
            .unwrap();
        store.view("k").unwrap();
        store.delete("k").unwrap();
    });
    assert!(logs.contains("stored blob"), "{logs}");
    assert!(logs.contains("bytes=14"), "{logs}");
    assert!(logs.contains("reading blob"), "{logs}");
    assert!(logs.contains("removing blob"), "{logs}");
    assert!(!logs.contains("secret-payload"), "{logs}");
}
