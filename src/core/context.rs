// ============================================================================
// objekt - Reflection Context
// Thread-local state for dependency capture and container identity
// ============================================================================

use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::Key;
use crate::collections::ReactiveContainer;
use crate::primitives::event::DependencyRecord;

// =============================================================================
// COLLECTOR
// =============================================================================

/// Dependencies gathered by one reflection session.
///
/// Records keep first-read order and are deduplicated by `"containerId:key"`.
#[derive(Default)]
pub struct Collector {
    seen: HashSet<String>,
    records: Vec<DependencyRecord>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read. Returns false if the pair was already recorded.
    pub fn record(&mut self, container: &ReactiveContainer, key: &Key) -> bool {
        let tag = format!("{}:{}", container.id(), key);
        if !self.seen.insert(tag) {
            return false;
        }
        self.records
            .push(DependencyRecord::new(container.clone(), key.clone()));
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<DependencyRecord> {
        self.records
    }
}

// =============================================================================
// REFLECTION CONTEXT
// =============================================================================

/// Thread-local reflection state.
///
/// Sessions nest: each `reflect` pushes a collector and reads land in the
/// innermost one only, so an inner session never disturbs an outer one.
pub struct ReflectionContext {
    /// Open sessions, innermost last
    pub collectors: RefCell<Vec<Collector>>,
}

impl ReflectionContext {
    pub fn new() -> Self {
        Self {
            collectors: RefCell::new(Vec::new()),
        }
    }

    /// Open a session, returning its depth (1 for the outermost).
    pub fn push_collector(&self) -> usize {
        let mut collectors = self.collectors.borrow_mut();
        collectors.push(Collector::new());
        collectors.len()
    }

    /// Close the innermost session.
    pub fn pop_collector(&self) -> Option<Collector> {
        self.collectors.borrow_mut().pop()
    }

    /// Take the records of the session opened at `depth`, leaving it empty.
    pub fn take_session(&self, depth: usize) -> Collector {
        let mut collectors = self.collectors.borrow_mut();
        match depth.checked_sub(1).and_then(|i| collectors.get_mut(i)) {
            Some(collector) => std::mem::take(collector),
            None => Collector::new(),
        }
    }

    /// Close every session deeper than `depth`.
    pub fn truncate(&self, depth: usize) {
        self.collectors.borrow_mut().truncate(depth);
    }

    pub fn depth(&self) -> usize {
        self.collectors.borrow().len()
    }

    pub fn is_reflecting(&self) -> bool {
        self.depth() > 0
    }

    /// Record a read into the innermost session.
    ///
    /// Returns false when no session is open or the pair was already seen.
    pub fn record(&self, container: &ReactiveContainer, key: &Key) -> bool {
        let mut collectors = self.collectors.borrow_mut();
        let Some(collector) = collectors.last_mut() else {
            return false;
        };
        collector.record(container, key)
    }
}

impl Default for ReflectionContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    static CONTEXT: ReflectionContext = ReflectionContext::new();
}

/// Access the thread-local reflection context.
pub fn with_context<R>(f: impl FnOnce(&ReflectionContext) -> R) -> R {
    CONTEXT.with(f)
}

/// Check if a reflection session is open on this thread.
pub fn is_reflecting() -> bool {
    with_context(|ctx| ctx.is_reflecting())
}

/// How many reflection sessions are currently nested on this thread.
pub fn reflection_depth() -> usize {
    with_context(|ctx| ctx.depth())
}

// =============================================================================
// CONTAINER IDENTITY
// =============================================================================

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate the next container id. Ids are unique and strictly increasing.
pub fn next_container_id() -> u64 {
    NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed)
}

// =============================================================================
// TESTS
// =============================================================================
