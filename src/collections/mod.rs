// ============================================================================
// objekt - Reactive Collections
// The observable container and its iteration surface
// ============================================================================
//
// A container wraps either a sequence or a mapping. It reacts to its own
// top-level keys only; nested objects are plain values and are compared
// structurally when a key is rewritten.
// ============================================================================

mod container;

pub use container::{
    ChangeHandler, ContainerKind, ContainerOptions, Entries, ReactiveContainer, Seed,
    WeakContainer,
};
