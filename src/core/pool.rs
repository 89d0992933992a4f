//! Thread-safe object pool for hot-path log records
//!
//! Producers acquire message buffers and log entries from the pool instead of
//! allocating them per call. The free list is a lock-free bounded MPMC queue,
//! so any number of threads can acquire and release concurrently without a
//! shared lock. When the free list is empty a fresh record is allocated; when
//! it is full a released record is simply dropped.
//!
//! Every acquired record is wrapped in a [`Pooled`] handle. Dropping the handle
//! is the release, which makes the acquire/release pairing hold on every code
//! path, including early error returns.

use super::error::{LoggerError, Result};
use super::log_entry::LogEntry;
use crossbeam_queue::ArrayQueue;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Records that can be reset and handed out again.
pub trait Recycle {
    /// Clear the record's contents while keeping its allocations.
    fn recycle(&mut self);
}

impl Recycle for String {
    fn recycle(&mut self) {
        self.clear();
    }
}

struct PoolShared<T> {
    name: &'static str,
    free: ArrayQueue<Box<T>>,
    max_outstanding: Option<usize>,
    outstanding: AtomicUsize,
    acquired: AtomicU64,
    released: AtomicU64,
    allocated: AtomicU64,
}

impl<T: Recycle> PoolShared<T> {
    fn release(&self, mut item: Box<T>) {
        item.recycle();
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
        self.released.fetch_add(1, Ordering::Relaxed);
        // Free list full: let the record drop
        let _ = self.free.push(item);
    }
}

/// A typed, thread-safe pool of reusable records.
///
/// Cloning the pool yields another handle to the same free list.
pub struct ObjectPool<T> {
    shared: Arc<PoolShared<T>>,
}

impl<T> Clone for ObjectPool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Recycle + Default> ObjectPool<T> {
    /// Create an unbounded pool keeping up to `capacity` idle records.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self::bounded(name, capacity, None)
    }

    /// Create a pool that refuses to hand out more than `max_outstanding`
    /// records at once.
    pub fn bounded(name: &'static str, capacity: usize, max_outstanding: Option<usize>) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                name,
                free: ArrayQueue::new(capacity.max(1)),
                max_outstanding,
                outstanding: AtomicUsize::new(0),
                acquired: AtomicU64::new(0),
                released: AtomicU64::new(0),
                allocated: AtomicU64::new(0),
            }),
        }
    }

    /// Pre-populate the free list with up to `count` records.
    #[must_use]
    pub fn prefilled(self, count: usize) -> Self {
        for _ in 0..count.min(self.shared.free.capacity()) {
            self.shared.allocated.fetch_add(1, Ordering::Relaxed);
            if self.shared.free.push(Box::default()).is_err() {
                break;
            }
        }
        self
    }

    /// Hand out a recycled record, or a freshly allocated one if none is idle.
    pub fn acquire(&self) -> Result<Pooled<T>> {
        let shared = &self.shared;
        match shared.max_outstanding {
            Some(limit) => {
                shared
                    .outstanding
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                        (current < limit).then_some(current + 1)
                    })
                    .map_err(|current| LoggerError::pool_exhausted(shared.name, current, limit))?;
            }
            None => {
                shared.outstanding.fetch_add(1, Ordering::AcqRel);
            }
        }

        let item = shared.free.pop().unwrap_or_else(|| {
            shared.allocated.fetch_add(1, Ordering::Relaxed);
            Box::default()
        });
        shared.acquired.fetch_add(1, Ordering::Relaxed);

        Ok(Pooled {
            item: Some(item),
            pool: Arc::clone(shared),
        })
    }
}

impl<T> ObjectPool<T> {
    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    /// Total number of successful acquires
    #[inline]
    pub fn acquired(&self) -> u64 {
        self.shared.acquired.load(Ordering::Relaxed)
    }

    /// Total number of releases
    #[inline]
    pub fn released(&self) -> u64 {
        self.shared.released.load(Ordering::Relaxed)
    }

    /// Records created because the free list was empty (or by prefill)
    #[inline]
    pub fn allocated(&self) -> u64 {
        self.shared.allocated.load(Ordering::Relaxed)
    }

    /// Records currently handed out
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire)
    }

    /// Records waiting on the free list
    #[inline]
    pub fn idle(&self) -> usize {
        self.shared.free.len()
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("name", &self.shared.name)
            .field("idle", &self.idle())
            .field("outstanding", &self.outstanding())
            .field("acquired", &self.acquired())
            .field("released", &self.released())
            .finish()
    }
}

/// An acquired record. Returned to its pool on drop.
pub struct Pooled<T: Recycle> {
    item: Option<Box<T>>,
    pool: Arc<PoolShared<T>>,
}

impl<T: Recycle> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `drop` takes the item
        self.item.as_deref().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Recycle> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_deref_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Recycle> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}

impl<T: Recycle + fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// The two record kinds the logger recycles.
#[derive(Debug, Clone)]
pub struct LogPools {
    pub messages: ObjectPool<String>,
    pub entries: ObjectPool<LogEntry>,
}

impl LogPools {
    pub fn new(capacity: usize, max_outstanding: Option<usize>) -> Self {
        Self {
            messages: ObjectPool::new("messages", capacity),
            entries: ObjectPool::bounded("entries", capacity, max_outstanding),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_acquire_recycles_released_records() {
        let pool: ObjectPool<String> = ObjectPool::new("test", 4);
        {
            let mut buf = pool.acquire().unwrap();
            buf.push_str("hello");
            assert_eq!(pool.outstanding(), 1);
        }
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire().unwrap();
        assert!(buf.is_empty(), "recycled buffer must be cleared");
        assert!(buf.capacity() >= 5, "recycled buffer keeps its allocation");
        assert_eq!(pool.allocated(), 1);
        assert_eq!(pool.acquired(), 2);
    }

    #[test]
    fn test_full_free_list_drops_extra_records() {
        let pool: ObjectPool<String> = ObjectPool::new("test", 1);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.released(), 2);
    }

    #[test]
    fn test_bounded_pool_reports_exhaustion() {
        let pool: ObjectPool<String> = ObjectPool::bounded("bounded", 2, Some(2));
        let a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();

        match pool.acquire() {
            Err(LoggerError::PoolExhausted {
                pool: "bounded",
                outstanding: 2,
                limit: 2,
            }) => {}
            other => panic!("expected PoolExhausted, got {:?}", other.map(|_| ())),
        }

        drop(a);
        assert!(pool.acquire().is_ok());
    }

    #[test]
    fn test_prefilled_pool_does_not_allocate_on_acquire() {
        let pool: ObjectPool<String> = ObjectPool::new("test", 8).prefilled(8);
        assert_eq!(pool.idle(), 8);
        let _held: Vec<_> = (0..8).map(|_| pool.acquire().unwrap()).collect();
        assert_eq!(pool.allocated(), 8);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_concurrent_acquire_release_balances() {
        let pool: ObjectPool<String> = ObjectPool::new("test", 16);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let pool = pool.clone();
                thread::spawn(move || {
                    for i in 0..500 {
                        let mut buf = pool.acquire().unwrap();
                        buf.push_str(&format!("{}-{}", t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.acquired(), 4000);
        assert_eq!(pool.released(), 4000);
        assert_eq!(pool.outstanding(), 0);
        assert!(pool.idle() <= 16);
    }
}
