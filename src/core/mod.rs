// ============================================================================
// objekt - Core Module
// Value model, constants, errors, and the thread-local reflection context
// ============================================================================

pub mod constants;
pub mod context;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use context::{
    is_reflecting, next_container_id, reflection_depth, with_context, Collector,
    ReflectionContext,
};
pub use error::{ObjektError, ReflectError};
pub use types::{Class, Key, Object, ObjectRef, Shape, Value};
