//! Double-buffered entry queue
//!
//! Producers push into the active queue under a short-held lock. The drain
//! side swaps the active index under the same lock, which is the only moment
//! producers wait, and then walks the taken generation with the lock
//! released. Once delivered, the emptied vector is handed back so its
//! capacity is reused by a later generation.

use super::log_entry::LogEntry;
use super::pool::Pooled;
use parking_lot::Mutex;

pub type PooledEntry = Pooled<LogEntry>;

struct Queues {
    active: usize,
    slots: [Vec<PooledEntry>; 2],
}

/// Entries collected by one active period, detached from the buffer.
#[derive(Debug)]
pub struct Generation {
    index: usize,
    entries: Vec<PooledEntry>,
}

impl Generation {
    /// Which of the two queues this generation was collected in
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().map(|entry| &**entry)
    }

    /// Release every entry back to its pool, keeping the vector's capacity.
    pub fn release(&mut self) {
        self.entries.clear();
    }
}

pub struct DoubleBuffer {
    queues: Mutex<Queues>,
    high_water_mark: usize,
}

impl DoubleBuffer {
    pub fn new(high_water_mark: usize) -> Self {
        Self {
            queues: Mutex::new(Queues {
                active: 0,
                slots: [Vec::new(), Vec::new()],
            }),
            high_water_mark: high_water_mark.max(1),
        }
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// Append to the active queue. Returns `true` once the queue has reached
    /// the high-water mark.
    pub fn push(&self, entry: PooledEntry) -> bool {
        let mut queues = self.queues.lock();
        let active = queues.active;
        queues.slots[active].push(entry);
        queues.slots[active].len() >= self.high_water_mark
    }

    pub fn active_index(&self) -> usize {
        self.queues.lock().active
    }

    /// Entries waiting in either queue
    pub fn len(&self) -> usize {
        let queues = self.queues.lock();
        queues.slots[0].len() + queues.slots[1].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn over_high_water(&self) -> bool {
        let queues = self.queues.lock();
        queues.slots.iter().any(|slot| slot.len() >= self.high_water_mark)
    }

    /// Flip the active index and detach the generation collected so far.
    ///
    /// O(1) under the lock: the vector is moved out, not copied.
    pub fn swap(&self) -> Generation {
        let mut queues = self.queues.lock();
        let index = queues.active;
        queues.active = index ^ 1;
        Generation {
            index,
            entries: std::mem::take(&mut queues.slots[index]),
        }
    }

    /// Return a drained generation's storage to its (now inactive) slot.
    pub fn restore(&self, mut generation: Generation) {
        generation.release();
        let mut queues = self.queues.lock();
        if generation.index == queues.active {
            return;
        }
        let slot = &mut queues.slots[generation.index];
        if slot.is_empty() {
            *slot = generation.entries;
        }
    }

    /// Drop everything still buffered, releasing entries to their pool.
    pub fn clear(&self) -> usize {
        let mut queues = self.queues.lock();
        let dropped = queues.slots[0].len() + queues.slots[1].len();
        queues.slots[0].clear();
        queues.slots[1].clear();
        dropped
    }
}

impl std::fmt::Debug for DoubleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queues = self.queues.lock();
        f.debug_struct("DoubleBuffer")
            .field("active", &queues.active)
            .field("lens", &[queues.slots[0].len(), queues.slots[1].len()])
            .field("high_water_mark", &self.high_water_mark)
            .finish()
    }
}
