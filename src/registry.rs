//! Process-wide table of open documents' byte sources.
//!
//! The engine's read callback identifies a document only by a small integer
//! id, so each document parks its source here for as long as it is open.
//! The id is an index into this table, not an ownership token.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::stream::ByteSource;

type SharedSource = Arc<Mutex<Box<dyn ByteSource>>>;

struct Registry {
    entries: HashMap<u32, SharedSource>,
    next_id: u32,
}

static SOURCES: OnceLock<Mutex<Registry>> = OnceLock::new();

fn table() -> MutexGuard<'static, Registry> {
    SOURCES
        .get_or_init(|| {
            Mutex::new(Registry {
                entries: HashMap::new(),
                next_id: 1,
            })
        })
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Park a source, returning a fresh id. Ids are unique among currently-open
/// documents and never reused while their document is still open.
pub(crate) fn register(source: Box<dyn ByteSource>) -> u32 {
    let mut registry = table();
    let id = loop {
        let id = registry.next_id;
        registry.next_id = registry.next_id.wrapping_add(1).max(1);
        if !registry.entries.contains_key(&id) {
            break id;
        }
    };
    registry.entries.insert(id, Arc::new(Mutex::new(source)));
    log::trace!("registered source {id}");
    id
}

/// Remove a source and drop it. Unknown ids are ignored so teardown paths
/// stay idempotent.
pub(crate) fn unregister(id: u32) {
    if table().entries.remove(&id).is_some() {
        log::trace!("unregistered source {id}");
    }
}

fn lookup(id: u32) -> Option<SharedSource> {
    table().entries.get(&id).cloned()
}

/// Engine-facing read: fill `buf` from `offset`. An unknown id or a short
/// read reports failure to the engine, which then fails the surrounding
/// load or render itself instead of aborting the process.
pub(crate) fn read_into(id: u32, offset: u64, buf: &mut [u8]) -> bool {
    let Some(entry) = lookup(id) else {
        log::warn!("engine read for unknown source id {id}");
        return false;
    };
    let mut source = entry.lock().unwrap_or_else(PoisonError::into_inner);
    match source.read_exact_at(offset, buf) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("source {id} read of {} bytes at {offset} failed: {e}", buf.len());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::stream::BufferedSource;

    fn boxed(data: Vec<u8>) -> Box<dyn ByteSource> {
        Box::new(BufferedSource::from_bytes(data))
    }

    #[test]
    #[serial]
    fn register_hands_out_distinct_ids() {
        let a = register(boxed(vec![1]));
        let b = register(boxed(vec![2]));
        assert_ne!(a, b);
        unregister(a);
        unregister(b);
    }

    #[test]
    #[serial]
    fn read_into_round_trips_registered_bytes() {
        let id = register(boxed(vec![10, 20, 30, 40]));
        let mut buf = [0u8; 2];
        assert!(read_into(id, 1, &mut buf));
        assert_eq!(buf, [20, 30]);
        unregister(id);
    }

    #[test]
    #[serial]
    fn read_after_unregister_reports_no_data() {
        let id = register(boxed(vec![1, 2, 3]));
        unregister(id);
        let mut buf = [0u8; 1];
        assert!(!read_into(id, 0, &mut buf));
        // A second unregister is a no-op.
        unregister(id);
    }

    #[test]
    #[serial]
    fn concurrent_registrations_never_collide() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| register(boxed(vec![0u8; 4]))))
            .collect();
        let mut ids: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before);
        for id in ids {
            unregister(id);
        }
    }

    #[test]
    #[serial]
    fn short_read_signals_failure() {
        let id = register(boxed(vec![1, 2]));
        let mut buf = [0u8; 8];
        assert!(!read_into(id, 0, &mut buf));
        unregister(id);
    }
}
