// ============================================================================
// objekt - Reactive Objects for Rust
// ============================================================================
//
// Observable containers whose writes emit add/change/delete events only when
// a value structurally changes, plus dependency reflection over container
// reads, built on cycle-safe structural equality and cloning.
// ============================================================================

#[macro_use]
mod macros;

pub mod collections;
pub mod core;
pub mod primitives;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use crate::core::constants;
pub use crate::core::context::{is_reflecting, reflection_depth};
pub use crate::core::error::{ObjektError, ReflectError};
pub use crate::core::types::{Class, Key, Object, ObjectRef, Shape, Value};

// Re-export the container surface
pub use collections::{
    ChangeHandler, ContainerKind, ContainerOptions, Entries, ReactiveContainer, Seed,
    WeakContainer,
};
pub use primitives::{ChangeEvent, ChangeKind, DependencyRecord, Emitter, Handler};

// Re-export the engines
pub use reactivity::clone::structural_clone;
pub use reactivity::equality::{
    structural_equals, structural_equals_with, EqualityOptions, NumberSemantics,
};
pub use reactivity::reflection::{reflect, reflect_report, try_reflect, Reflection};

// =============================================================================
// TESTS
// =============================================================================
