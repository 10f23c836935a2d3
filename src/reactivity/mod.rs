// ============================================================================
// objekt - Reactivity Module
// Structural equality, structural clone, and dependency reflection
// ============================================================================

pub mod clone;
pub mod equality;
pub mod reflection;

pub use clone::structural_clone;
pub use equality::{structural_equals, structural_equals_with, EqualityOptions, NumberSemantics};
pub use reflection::{is_reflecting, reflect, reflect_report, try_reflect, Reflection};
