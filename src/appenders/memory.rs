//! In-memory appender
//!
//! Keeps a copy of every delivered entry. Handles are cheap to clone and all
//! clones share one store, so a test can hand one clone to a logger and
//! inspect the other.

use crate::core::{Appender, LineLayout, LogEntry, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Store {
    entries: Vec<LogEntry>,
    flushes: usize,
    forced_flushes: usize,
}

#[derive(Default)]
struct Shared {
    store: Mutex<Store>,
    changed: Condvar,
}

#[derive(Clone)]
pub struct MemoryAppender {
    name: String,
    shared: Arc<Shared>,
}

impl MemoryAppender {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::default(),
        }
    }

    /// Copies of every entry delivered so far, in delivery order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.shared.store.lock().entries.clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.shared
            .store
            .lock()
            .entries
            .iter()
            .map(|entry| entry.message().to_string())
            .collect()
    }

    /// Entries rendered with `layout`
    pub fn lines(&self, layout: &LineLayout) -> Vec<String> {
        self.shared
            .store
            .lock()
            .entries
            .iter()
            .map(|entry| layout.render(entry))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shared.store.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.shared.store.lock().entries.clear();
    }

    /// Number of `flush` calls received, forced or not
    pub fn flush_count(&self) -> usize {
        self.shared.store.lock().flushes
    }

    pub fn forced_flush_count(&self) -> usize {
        self.shared.store.lock().forced_flushes
    }

    /// Block until at least `count` entries have arrived or `timeout` passes.
    /// Returns whether the count was reached.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut store = self.shared.store.lock();
        while store.entries.len() < count {
            if self.shared.changed.wait_until(&mut store, deadline).timed_out() {
                return store.entries.len() >= count;
            }
        }
        true
    }
}

impl Default for MemoryAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for MemoryAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        self.shared.store.lock().entries.push(entry.clone());
        self.shared.changed.notify_all();
        Ok(())
    }

    fn flush(&mut self, force: bool) -> Result<()> {
        let mut store = self.shared.store.lock();
        store.flushes += 1;
        if force {
            store.forced_flushes += 1;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MemoryAppender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAppender")
            .field("name", &self.name)
            .field("entries", &self.len())
            .finish()
    }
}
