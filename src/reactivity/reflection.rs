// ============================================================================
// objekt - Reflection
// Discover which container keys a callback reads
// ============================================================================

use std::convert::Infallible;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::core::context::with_context;
use crate::core::error::ReflectError;
use crate::primitives::event::DependencyRecord;

// =============================================================================
// REFLECTION RESULT
// =============================================================================

/// Outcome of a reflection session.
#[derive(Debug)]
pub struct Reflection {
    /// Reads recorded before the callback returned or failed, in first-read order
    pub dependencies: Vec<DependencyRecord>,

    /// Set when the callback failed; dependencies are then partial
    pub error: Option<ReflectError>,
}

impl Reflection {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

// =============================================================================
// REFLECT
// =============================================================================

/// Run `f` in a reflection session and return the container reads it made.
///
/// While the session is open, `ReactiveContainer::get` records
/// `(container, key)` instead of returning the stored value, so `f` sees
/// `Value::Null` for every read. Each pair is recorded once.
///
/// A panic inside `f` is caught and logged; whatever was recorded before it
/// is still returned.
///
/// Sessions nest. A `reflect` inside `f` collects into its own session and
/// leaves this one untouched.
///
/// # Example
///
/// ```
/// use objekt::{mapping, reflect, ReactiveContainer};
///
/// let state = ReactiveContainer::new(mapping! { "x" => 1, "y" => 2 });
///
/// let deps = reflect(|| {
///     state.get("x");
///     state.get("x");
/// });
///
/// assert_eq!(deps.len(), 1);
/// assert_eq!(deps[0].container_id(), state.id());
/// assert_eq!(deps[0].key().to_string(), "x");
/// ```
pub fn reflect<R>(f: impl FnOnce() -> R) -> Vec<DependencyRecord> {
    reflect_report(|| {
        f();
        Ok::<(), Infallible>(())
    })
    .dependencies
}

/// Like [`reflect`], for callbacks that can fail.
///
/// A returned error is logged and swallowed just like a panic.
pub fn try_reflect<T, E: Display>(f: impl FnOnce() -> Result<T, E>) -> Vec<DependencyRecord> {
    reflect_report(f).dependencies
}

/// Run a reflection session and report both the dependencies and the
/// failure, if any.
pub fn reflect_report<T, E: Display>(f: impl FnOnce() -> Result<T, E>) -> Reflection {
    let depth = with_context(|ctx| ctx.push_collector());

    // Close the session even if something below unwinds past us
    struct SessionGuard {
        depth: usize,
    }

    impl Drop for SessionGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.truncate(self.depth - 1));
        }
    }

    let guard = SessionGuard { depth };

    let error = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(ReflectError::Failed(e.to_string())),
        Err(payload) => Some(ReflectError::from_panic(payload)),
    };

    let dependencies = with_context(|ctx| ctx.take_session(guard.depth)).into_records();
    drop(guard);

    if let Some(error) = &error {
        warn!(
            %error,
            collected = dependencies.len(),
            "reflection callback failed; returning partial dependencies"
        );
    }

    Reflection {
        dependencies,
        error,
    }
}

/// Check if a reflection session is open on this thread.
pub fn is_reflecting() -> bool {
    crate::core::context::is_reflecting()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::ReactiveContainer;
    use crate::core::types::{Key, Value};

    fn container() -> ReactiveContainer {
        ReactiveContainer::new(Value::mapping([("x", 1), ("y", 2)]))
    }

    #[test]
    fn captures_single_read() {
        let c = container();
        let deps = reflect(|| c.get("x"));

        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].container_id(), c.id());
        assert_eq!(deps[0].key(), &Key::from("x"));
        assert!(deps[0].container().ptr_eq(&c));
    }

    #[test]
    fn reads_return_null_while_reflecting() {
        let c = container();
        let mut seen = None;
        reflect(|| seen = Some(c.get("x")));
        assert!(seen.unwrap().is_null());

        // Back to normal afterwards
        assert_eq!(c.get("x").as_f64(), Some(1.0));
        assert!(!is_reflecting());
    }

    #[test]
    fn duplicate_reads_are_recorded_once() {
        let c = container();
        let deps = reflect(|| {
            c.get("x");
            c.get("y");
            c.get("x");
        });
        let keys: Vec<String> = deps.iter().map(|d| d.key().to_string()).collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn same_key_on_two_containers_is_two_records() {
        let (a, b) = (container(), container());
        let deps = reflect(|| {
            a.get("x");
            b.get("x");
        });
        assert_eq!(deps.len(), 2);
        assert_ne!(deps[0].container_id(), deps[1].container_id());
    }

    #[test]
    fn sessions_start_empty() {
        let c = container();
        assert_eq!(reflect(|| c.get("x")).len(), 1);
        assert_eq!(reflect(|| c.get("y")).len(), 1);
        assert!(reflect(|| ()).is_empty());
    }

    #[test]
    fn panic_is_swallowed_and_partial_result_returned() {
        let c = container();
        let report = reflect_report(|| {
            c.get("x");
            if c.get("y").is_null() {
                panic!("boom");
            }
            Ok::<(), Infallible>(())
        });

        assert_eq!(report.dependencies.len(), 2);
        assert_eq!(report.error, Some(ReflectError::Panicked("boom".into())));
        assert!(!report.is_complete());
        assert!(!is_reflecting());
    }

    #[test]
    fn returned_error_is_swallowed() {
        let c = container();
        let deps = try_reflect(|| {
            c.get("x");
            Err::<(), _>("not today")
        });
        assert_eq!(deps.len(), 1);

        let report = reflect_report(|| Err::<(), _>("nope"));
        assert_eq!(report.error, Some(ReflectError::Failed("nope".into())));
    }

    #[test]
    fn nested_sessions_are_isolated() {
        let c = container();
        let mut inner = Vec::new();
        let outer = reflect(|| {
            c.get("x");
            inner = reflect(|| c.get("y"));
            c.get("x");
        });

        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].key(), &Key::from("x"));
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].key(), &Key::from("y"));
    }

    #[test]
    fn nested_failure_does_not_close_outer_session() {
        let c = container();
        let outer = reflect(|| {
            let inner = reflect_report(|| -> Result<(), String> { panic!("inner") });
            assert!(inner.error.is_some());
            assert!(is_reflecting());
            c.get("x");
        });
        assert_eq!(outer.len(), 1);
    }
}
