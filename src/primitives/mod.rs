// ============================================================================
// objekt - Primitives Module
// Event types and the multicast emitter containers publish through
// ============================================================================

pub mod emitter;
pub mod event;

// Re-export for convenience
pub use emitter::{Emitter, Handler};
pub use event::{ChangeEvent, ChangeKind, DependencyRecord};
