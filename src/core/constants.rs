// ============================================================================
// objekt - Constants
// Event names, seed tags, and the container's control surface
// ============================================================================

// =============================================================================
// EVENT NAMES
// =============================================================================

/// Emitted when a key with no previous value is written.
pub const EVENT_ADD: &str = "add";

/// Emitted when a key's value is replaced by a structurally different one.
pub const EVENT_CHANGE: &str = "change";

/// Emitted when a present key is removed.
pub const EVENT_DELETE: &str = "delete";

/// Every change event is also emitted under this name.
pub const EVENT_ANY: &str = "*";

// =============================================================================
// SEEDS
// =============================================================================

/// Seed tag that starts a container as an empty sequence.
pub const SEQUENCE_TAG: &str = "array";

// =============================================================================
// SEQUENCE LIMITS
// =============================================================================

/// Largest index a sequence can be written at (2^32 - 2).
///
/// Writes past it are ignored the same way non-numeric names are, instead of
/// padding the sequence with billions of holes.
pub const MAX_SEQUENCE_INDEX: usize = 4_294_967_294;

// =============================================================================
// CONTROL SURFACE
// =============================================================================

/// Member names owned by the container itself rather than its backing store.
///
/// `has` reports these, but they never show up in key enumeration.
pub const CONTROL_SURFACE: &[&str] = &[
    "on", "off", "once", "emit", "silence", "resume", "keys", "entries", "reflect",
];

/// Returns true if `name` is one of the container's own members.
pub fn is_control_member(name: &str) -> bool {
    CONTROL_SURFACE.contains(&name)
}

// =============================================================================
// TESTS
// =============================================================================
