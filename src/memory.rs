//! accounts for memory used by materialized query results.
//!
//! The `MemoryManager` is shared by every query running against a session. It hands out `RowsCache`s,
//! which hold rows in rust native data structures and charge each appended row against one common budget.
//!
//! # Ownership
//! A `RowsCache` has exactly one owner at a time. Disposing it (`dispose()`, or dropping it) releases all
//! the bytes it charged, and this happens exactly once, because disposal consumes the cache.
//! Callers move a cache from one holder to another instead of sharing it.
//!
//! The manager never looks inside rows beyond asking them for their `estimated_size()`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::typed_row::Row;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Rows cache budget exceeded: requested {requested} bytes with {used} of {limit} bytes in use.")]
    BudgetExceeded {
        requested: usize,
        used: usize,
        limit: usize,
    },
}

/// tracks the bytes held by all live `RowsCache`s against a fixed limit.
#[derive(Debug)]
pub struct MemoryManager {
    limit_bytes: usize,
    used_bytes: AtomicUsize,
    live_caches: AtomicUsize,
    disposed_caches: AtomicUsize,
}

impl MemoryManager {
    pub fn new(limit_bytes: usize) -> Arc<MemoryManager> {
        Arc::new(MemoryManager {
            limit_bytes,
            used_bytes: AtomicUsize::new(0),
            live_caches: AtomicUsize::new(0),
            disposed_caches: AtomicUsize::new(0),
        })
    }

    /// returns a new, empty cache whose rows are charged against this manager.
    pub fn new_rows_cache(self: &Arc<Self>) -> RowsCache {
        self.live_caches.fetch_add(1, Ordering::SeqCst);
        RowsCache {
            manager: Arc::clone(self),
            rows: vec![],
            charged_bytes: 0,
        }
    }

    pub fn limit_bytes(&self) -> usize {
        self.limit_bytes
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(Ordering::SeqCst)
    }

    /// number of caches handed out and not yet disposed.
    pub fn live_caches(&self) -> usize {
        self.live_caches.load(Ordering::SeqCst)
    }

    /// number of caches disposed over the lifetime of the manager.
    pub fn disposed_caches(&self) -> usize {
        self.disposed_caches.load(Ordering::SeqCst)
    }

    fn reserve(&self, requested: usize) -> Result<(), Error> {
        let limit = self.limit_bytes;
        self.used_bytes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(requested).filter(|total| *total <= limit)
            })
            .map(|_| ())
            .map_err(|used| Error::BudgetExceeded {
                requested,
                used,
                limit,
            })
    }

    fn release(&self, bytes: usize) {
        self.used_bytes.fetch_sub(bytes, Ordering::SeqCst);
        self.live_caches.fetch_sub(1, Ordering::SeqCst);
        self.disposed_caches.fetch_add(1, Ordering::SeqCst);
    }
}

/// an ordered, append-only collection of rows, bounded by its `MemoryManager`'s budget.
#[derive(Debug)]
pub struct RowsCache {
    manager: Arc<MemoryManager>,
    rows: Vec<Row>,
    charged_bytes: usize,
}

impl RowsCache {
    /// appends a row, or returns `Error::BudgetExceeded` and leaves the cache unchanged.
    pub fn add(&mut self, row: Row) -> Result<(), Error> {
        let size = row.estimated_size();
        self.manager.reserve(size)?;
        self.charged_bytes += size;
        self.rows.push(row);
        Ok(())
    }

    /// all rows added so far, in the order they were added.
    pub fn get(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn charged_bytes(&self) -> usize {
        self.charged_bytes
    }

    /// releases the cache's memory.
    pub fn dispose(self) {
        drop(self)
    }
}

impl Drop for RowsCache {
    fn drop(&mut self) {
        self.manager.release(self.charged_bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn test_add_and_get_preserve_order() {
        let mm = MemoryManager::new(1 << 20);
        let mut cache = mm.new_rows_cache();
        for i in 0..3 {
            cache.add(row![i]).unwrap();
        }
        assert_eq!(cache.get(), &[row![0], row![1], row![2]]);
        assert_eq!(mm.used_bytes(), 3 * row![0].estimated_size());
        assert_eq!(mm.live_caches(), 1);
    }

    #[test]
    fn test_budget_exceeded_leaves_cache_unchanged() {
        let one_row = row![1].estimated_size();
        let mm = MemoryManager::new(one_row);
        let mut cache = mm.new_rows_cache();
        cache.add(row![1]).unwrap();
        let err = cache.add(row![2]).unwrap_err();
        assert_eq!(
            err,
            Error::BudgetExceeded {
                requested: one_row,
                used: one_row,
                limit: one_row
            }
        );
        assert_eq!(cache.get(), &[row![1]]);
        assert_eq!(mm.used_bytes(), one_row);
    }

    #[test]
    fn test_budget_is_shared_between_caches() {
        let one_row = row![1].estimated_size();
        let mm = MemoryManager::new(one_row);
        let mut a = mm.new_rows_cache();
        let mut b = mm.new_rows_cache();
        a.add(row![1]).unwrap();
        assert!(b.add(row![1]).is_err());
        a.dispose();
        assert!(b.add(row![1]).is_ok());
    }

    #[test]
    fn test_dispose_releases_exactly_once() {
        let mm = MemoryManager::new(1 << 20);
        let mut cache = mm.new_rows_cache();
        cache.add(row!["abc", 1]).unwrap();
        assert!(mm.used_bytes() > 0);
        cache.dispose();
        assert_eq!(mm.used_bytes(), 0);
        assert_eq!(mm.live_caches(), 0);
        assert_eq!(mm.disposed_caches(), 1);

        {
            let _dropped = mm.new_rows_cache();
        }
        assert_eq!(mm.live_caches(), 0);
        assert_eq!(mm.disposed_caches(), 2);
    }
}
