// ============================================================================
// objekt - Events
// Change notifications and dependency records
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collections::ReactiveContainer;
use crate::core::constants::{EVENT_ADD, EVENT_CHANGE, EVENT_DELETE};
use crate::core::types::{Key, Value};

// =============================================================================
// CHANGE EVENTS
// =============================================================================

/// Classification of a container mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A key with no previous value was written
    Add,
    /// A key's value was replaced by a structurally different one
    Change,
    /// A present key was removed
    Delete,
}

impl ChangeKind {
    /// The event name this kind is emitted under.
    pub fn event_name(self) -> &'static str {
        match self {
            ChangeKind::Add => EVENT_ADD,
            ChangeKind::Change => EVENT_CHANGE,
            ChangeKind::Delete => EVENT_DELETE,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Emitted synchronously after a mutation.
///
/// For `Delete`, both `value` and `previous` carry the removed value.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub key: Key,
    pub value: Value,
    pub previous: Option<Value>,
    pub container: ReactiveContainer,
}

// =============================================================================
// DEPENDENCY RECORDS
// =============================================================================

/// A `(container, key)` pair read during reflection.
#[derive(Clone, Debug)]
pub struct DependencyRecord {
    container: ReactiveContainer,
    key: Key,
}

impl DependencyRecord {
    pub fn new(container: ReactiveContainer, key: Key) -> Self {
        Self { container, key }
    }

    pub fn container(&self) -> &ReactiveContainer {
        &self.container
    }

    pub fn container_id(&self) -> u64 {
        self.container.id()
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// `"containerId:key"`, the deduplication tag.
    pub fn tag(&self) -> String {
        format!("{}:{}", self.container.id(), self.key)
    }
}

impl PartialEq for DependencyRecord {
    fn eq(&self, other: &Self) -> bool {
        self.tag() == other.tag()
    }
}

impl Eq for DependencyRecord {}

// =============================================================================
// TESTS
// =============================================================================
