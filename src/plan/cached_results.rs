//! Caches the rows of a subtree the first time they are produced and replays them afterwards.
//!
//! `CachedResults` is only correct over a child that is deterministic and does not depend on the outer row
//! passed to `row_iter`.
//!
//! The node moves through three states:
//! ```text
//!            full pass, first to finish
//!   Empty ────────────────────────────────▶ Cached
//!     │
//!     │ cache budget exceeded
//!     ▼
//!  Disabled
//! ```
//! A pass that fails with an error from the child leaves the node `Empty`, so a later pass tries again.
//!
//! While caching, rows go into a `RowsCache` owned by the iterator. The cache is moved into the node only
//! when the child is fully drained; if another pass finished first, the late cache is disposed instead.
//! The node's lock is only taken to read or change the state, never while the child is producing rows.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::{take_one_child_exact, Error, NodeRef, PlanNode, PrivilegedOperationChecker};
use crate::context::Context;
use crate::formatting::TreePrinter;
use crate::memory::{self, RowsCache};
use crate::row_iter::RowIter;
use crate::typed_row::Row;

#[derive(Debug)]
enum CacheState {
    Empty,
    // Shared with in-flight replays; the cache is disposed when the last holder drops it.
    Cached(Arc<RowsCache>),
    Disabled,
}

#[derive(Debug)]
pub struct CachedResults {
    children: [NodeRef; 1],
    // Shared with the iterators of in-flight passes, which may outlive the node.
    state: Arc<Mutex<CacheState>>,
}

impl CachedResults {
    pub fn new(child: NodeRef) -> Self {
        CachedResults {
            children: [child],
            state: Arc::new(Mutex::new(CacheState::Empty)),
        }
    }

    pub fn child(&self) -> &NodeRef {
        &self.children[0]
    }

    /// copy of the cached rows, or `None` if no pass has completed.
    pub fn cached_rows(&self) -> Option<Vec<Row>> {
        self.cached().map(|cache| cache.get().to_vec())
    }

    fn cached(&self) -> Option<Arc<RowsCache>> {
        match &*self.state.lock() {
            CacheState::Cached(cache) => Some(Arc::clone(cache)),
            _ => None,
        }
    }

    /// whether caching was abandoned for good after the cache ran out of budget.
    pub fn is_disabled(&self) -> bool {
        matches!(*self.state.lock(), CacheState::Disabled)
    }

    fn render(&self, child: String) -> String {
        let mut pr = TreePrinter::new();
        pr.write_node("CachedResults");
        pr.write_children(&[child]);
        pr.finish()
    }
}

impl std::fmt::Display for CachedResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(self.child().to_string()))
    }
}

impl PlanNode for CachedResults {
    fn name(&self) -> &'static str {
        "CachedResults"
    }

    fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// The new node starts with an empty cache of its own.
    fn with_children(&self, children: Vec<NodeRef>) -> Result<NodeRef, Error> {
        let child = take_one_child_exact(self.name(), children)?;
        Ok(Arc::new(CachedResults::new(child)))
    }

    fn row_iter(&self, ctx: &Context, row: &Row) -> Result<Box<dyn RowIter>> {
        let disabled = {
            let state = self.state.lock();
            match &*state {
                CacheState::Cached(cache) => {
                    trace!(query_id = ctx.query_id(), rows = cache.len(), "replaying cached results");
                    return Ok(Box::new(ReplayIter {
                        cache: Arc::clone(cache),
                        pos: 0,
                    }));
                }
                CacheState::Disabled => true,
                CacheState::Empty => false,
            }
        };
        let iter = self.child().row_iter(ctx, row)?;
        if disabled {
            return Ok(iter);
        }
        Ok(Box::new(CachedResultsIter {
            state: Arc::clone(&self.state),
            iter,
            cache: Some(ctx.memory().new_rows_cache()),
            closed: false,
        }))
    }

    fn check_privileges(&self, ctx: &Context, checker: &dyn PrivilegedOperationChecker) -> bool {
        self.child().check_privileges(ctx, checker)
    }

    fn debug_string(&self) -> String {
        self.render(self.child().debug_string())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Reads the rows of an installed cache without copying the cache.
#[derive(Debug)]
struct ReplayIter {
    cache: Arc<RowsCache>,
    pos: usize,
}

impl RowIter for ReplayIter {
    fn next(&mut self, ctx: &Context) -> Result<Option<Row>> {
        ctx.check_cancelled()?;
        let row = self.cache.get().get(self.pos).cloned();
        if row.is_some() {
            self.pos += 1;
        }
        Ok(row)
    }

    fn close(&mut self, _ctx: &Context) -> Result<()> {
        Ok(())
    }
}

/// Passes the child's rows through while copying them into a cache of its own.
#[derive(Debug)]
struct CachedResultsIter {
    state: Arc<Mutex<CacheState>>,
    iter: Box<dyn RowIter>,
    // None once the cache was handed to the node or disposed.
    cache: Option<RowsCache>,
    closed: bool,
}

impl CachedResultsIter {
    /// moves the local cache into the node, unless another pass got there first.
    fn promote(&mut self, ctx: &Context) {
        let Some(cache) = self.cache.take() else {
            return;
        };
        let mut state = self.state.lock();
        if matches!(*state, CacheState::Empty) {
            debug!(
                query_id = ctx.query_id(),
                rows = cache.len(),
                bytes = cache.charged_bytes(),
                "installing cached results"
            );
            *state = CacheState::Cached(Arc::new(cache));
        } else {
            drop(state);
            debug!(query_id = ctx.query_id(), "results cached or caching disabled by another pass, discarding");
            cache.dispose();
        }
    }

    fn disable(&mut self, ctx: &Context, err: &memory::Error) {
        if let Some(cache) = self.cache.take() {
            cache.dispose();
        }
        warn!(query_id = ctx.query_id(), %err, "results cache out of memory, disabling caching");
        let mut state = self.state.lock();
        if matches!(*state, CacheState::Empty) {
            *state = CacheState::Disabled;
        }
    }

    fn clean_up(&mut self) {
        if let Some(cache) = self.cache.take() {
            cache.dispose();
        }
    }
}

impl RowIter for CachedResultsIter {
    fn next(&mut self, ctx: &Context) -> Result<Option<Row>> {
        match self.iter.next(ctx) {
            Ok(Some(row)) => {
                if let Some(cache) = self.cache.as_mut() {
                    if let Err(err) = cache.add(row.clone()) {
                        self.disable(ctx, &err);
                    }
                }
                Ok(Some(row))
            }
            Ok(None) => {
                self.promote(ctx);
                Ok(None)
            }
            Err(e) => {
                if self.cache.is_some() {
                    debug!(query_id = ctx.query_id(), err = %e, "child failed, discarding partial results");
                    self.clean_up();
                }
                Err(e)
            }
        }
    }

    fn close(&mut self, ctx: &Context) -> Result<()> {
        self.clean_up();
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.iter.close(ctx)
    }
}
