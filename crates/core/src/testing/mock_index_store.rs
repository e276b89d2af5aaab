//! In-memory index store for testing.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::index::{IndexError, IndexStore, TicketRecord};

/// IndexStore backed by a vector.
///
/// Counts writes and can fail the next one.
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    records: Mutex<Vec<TicketRecord>>,
    writes: AtomicUsize,
    fail_next_write: AtomicBool,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<TicketRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// Last persisted document.
    pub fn records(&self) -> Vec<TicketRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next write fail with an IO error.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }
}

impl IndexStore for MemoryIndexStore {
    fn read(&self) -> Result<Vec<TicketRecord>, IndexError> {
        Ok(self.records())
    }

    fn write(&self, records: &[TicketRecord]) -> Result<(), IndexError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(IndexError::Io(io::Error::new(
                io::ErrorKind::Other,
                "injected write failure",
            )));
        }
        *self.records.lock().unwrap_or_else(|e| e.into_inner()) = records.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
