//! Per-query context threaded through analysis and row iteration.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::memory::MemoryManager;

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Query {0} was cancelled.")]
pub struct Cancelled(pub u64);

/// Session state a query runs under.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Session { config }
    }

    pub fn current_database(&self) -> &str {
        &self.config.current_database
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// `Context` is cheap to clone; clones share the memory manager and the cancellation flag.
#[derive(Debug, Clone)]
pub struct Context {
    query_id: u64,
    session: Arc<Session>,
    memory: Arc<MemoryManager>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    pub fn new(config: SessionConfig) -> Self {
        let memory = MemoryManager::new(config.rows_cache_limit_bytes);
        Self::with_memory(Session::new(config), memory)
    }

    /// builds a context that charges caches against an existing manager, e.g. one shared by a server.
    pub fn with_memory(session: Session, memory: Arc<MemoryManager>) -> Self {
        Context {
            query_id: NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed),
            session: Arc::new(session),
            memory,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn query_id(&self) -> u64 {
        self.query_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn memory(&self) -> &Arc<MemoryManager> {
        &self.memory
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled(self.query_id));
        }
        Ok(())
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(SessionConfig::default())
    }
}

#[test]
fn test_cancel_is_shared_by_clones() {
    let ctx = Context::default();
    let clone = ctx.clone();
    assert!(ctx.check_cancelled().is_ok());
    clone.cancel();
    assert_eq!(ctx.check_cancelled(), Err(Cancelled(ctx.query_id())));
}

#[test]
fn test_current_database_comes_from_config() {
    let ctx = Context::new(SessionConfig {
        current_database: "db1".to_string(),
        ..SessionConfig::default()
    });
    assert_eq!(ctx.session().current_database(), "db1");
    assert_eq!(ctx.memory().limit_bytes(), crate::config::DEFAULT_ROWS_CACHE_LIMIT_BYTES);
}
