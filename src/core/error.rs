// ============================================================================
// objekt - Errors
// ============================================================================
//
// The container surface never fails. These errors cover the edges: exporting
// a value graph to JSON, and reporting why a reflection callback gave up.
// ============================================================================

use thiserror::Error;

/// Errors raised when converting values out of the object model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjektError {
    /// The value graph refers back to itself and has no tree form.
    #[error("value graph contains a cycle")]
    Cycle,

    /// JSON has no representation for NaN or the infinities.
    #[error("number {0} has no JSON representation")]
    NonFiniteNumber(f64),
}

/// Why a reflection callback stopped early.
///
/// Reflection swallows these after logging them; `reflect_report` hands them
/// back alongside whatever dependencies were collected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReflectError {
    /// The callback returned an error.
    #[error("reflection callback failed: {0}")]
    Failed(String),

    /// The callback panicked.
    #[error("reflection callback panicked: {0}")]
    Panicked(String),
}

impl ReflectError {
    /// Build a `Panicked` error from a caught unwind payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        ReflectError::Panicked(message)
    }
}
