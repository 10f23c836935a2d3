// ============================================================================
// objekt - Structural Equality
// Deep, cycle-safe comparison of value graphs
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{ObjectRef, Shape, Value};

// =============================================================================
// OPTIONS
// =============================================================================

/// How numbers compare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberSemantics {
    /// IEEE comparison: NaN is never equal to anything, itself included.
    #[default]
    Strict,
    /// NaN equals NaN; +0 and -0 are equal.
    SameValueZero,
}

/// Tuning for [`structural_equals_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualityOptions {
    pub numbers: NumberSemantics,
}

impl EqualityOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn numbers(mut self, numbers: NumberSemantics) -> Self {
        self.numbers = numbers;
        self
    }
}

// =============================================================================
// STRUCTURAL EQUALITY
// =============================================================================

/// Deep equality with strict number semantics.
///
/// # Example
/// ```
/// use objekt::{mapping, sequence, structural_equals};
///
/// let a = mapping! { "x" => 1, "tags" => sequence!["a", "b"] };
/// let b = mapping! { "x" => 1, "tags" => sequence!["a", "b"] };
/// assert!(structural_equals(&a, &b));
///
/// let c = mapping! { "x" => 1, "tags" => sequence!["a"] };
/// assert!(!structural_equals(&a, &c));
/// ```
pub fn structural_equals(a: &Value, b: &Value) -> bool {
    structural_equals_with(a, b, EqualityOptions::default())
}

/// Deep equality.
///
/// Walks both graphs with an explicit work list, so depth is bounded by heap
/// rather than stack. Each left-hand object is paired with the first
/// right-hand object it meets; meeting it again with a different partner is
/// a mismatch, and meeting it with the same partner ends that branch. That
/// is what makes cyclic and aliased graphs terminate.
///
/// Objects only match objects of the same [`Class`](crate::Class).
pub fn structural_equals_with(a: &Value, b: &Value, options: EqualityOptions) -> bool {
    let mut work: Vec<(Value, Value)> = vec![(a.clone(), b.clone())];
    let mut aliases: HashMap<usize, ObjectRef> = HashMap::new();

    while let Some((a, b)) = work.pop() {
        match (&a, &b) {
            (Value::Object(left), Value::Object(right)) => {
                if let Some(paired) = aliases.get(&left.addr()) {
                    if !paired.ptr_eq(right) {
                        return false;
                    }
                    continue;
                }
                aliases.insert(left.addr(), right.clone());

                let (l, r) = (left.borrow(), right.borrow());
                if l.class() != r.class() {
                    return false;
                }
                match (l.shape(), r.shape()) {
                    (Shape::Sequence(l), Shape::Sequence(r)) => {
                        if l.len() != r.len() {
                            return false;
                        }
                        work.extend(l.iter().cloned().zip(r.iter().cloned()));
                    }
                    (Shape::Mapping(l), Shape::Mapping(r)) => {
                        if l.len() != r.len() {
                            return false;
                        }
                        for (key, lv) in l {
                            match r.get(key) {
                                Some(rv) => work.push((lv.clone(), rv.clone())),
                                None => return false,
                            }
                        }
                    }
                    _ => return false,
                }
            }
            (Value::Object(_), _) | (_, Value::Object(_)) => return false,
            _ => {
                if !scalar_equals(&a, &b, options.numbers) {
                    return false;
                }
            }
        }
    }

    true
}

fn scalar_equals(a: &Value, b: &Value, numbers: NumberSemantics) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => match numbers {
            NumberSemantics::Strict => x == y,
            NumberSemantics::SameValueZero => safe_equals_f64(x, y),
        },
        (Value::Text(x), Value::Text(y)) => x == y,
        _ => false,
    }
}

// =============================================================================
// NUMBER HELPERS
// =============================================================================

/// Safe not-equal check for f64: NaN is considered equal to NaN.
///
/// # Example
/// ```
/// use objekt::reactivity::equality::safe_not_equal_f64;
///
/// assert!(safe_not_equal_f64(&1.0, &2.0));
/// assert!(!safe_not_equal_f64(&f64::NAN, &f64::NAN));
/// assert!(safe_not_equal_f64(&f64::NAN, &1.0));
/// ```
pub fn safe_not_equal_f64(a: &f64, b: &f64) -> bool {
    if a.is_nan() {
        return !b.is_nan();
    }
    a != b
}

/// Safe equality for f64 values. NaN == NaN returns true.
pub fn safe_equals_f64(a: &f64, b: &f64) -> bool {
    !safe_not_equal_f64(a, b)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Class;

    fn same_value_zero() -> EqualityOptions {
        EqualityOptions::new().numbers(NumberSemantics::SameValueZero)
    }

    #[test]
    fn scalars() {
        assert!(structural_equals(&Value::Null, &Value::Null));
        assert!(structural_equals(&Value::from(1), &Value::from(1.0)));
        assert!(structural_equals(&Value::from("a"), &Value::from("a")));
        assert!(!structural_equals(&Value::from("a"), &Value::from("b")));
        assert!(!structural_equals(&Value::from(true), &Value::from(1)));
        assert!(!structural_equals(&Value::Null, &Value::from(false)));
    }

    #[test]
    fn nan_is_unequal_under_strict_semantics() {
        let nan = Value::Number(f64::NAN);
        assert!(!structural_equals(&nan, &nan));
        assert!(structural_equals_with(&nan, &nan, same_value_zero()));
        assert!(!structural_equals_with(&nan, &Value::from(1), same_value_zero()));
    }

    #[test]
    fn signed_zero_is_equal_either_way() {
        let (pos, neg) = (Value::Number(0.0), Value::Number(-0.0));
        assert!(structural_equals(&pos, &neg));
        assert!(structural_equals_with(&pos, &neg, same_value_zero()));
    }

    #[test]
    fn object_versus_scalar() {
        let seq = Value::sequence([1]);
        assert!(!structural_equals(&seq, &Value::from(1)));
        assert!(!structural_equals(&Value::Null, &seq));
    }

    #[test]
    fn sequences() {
        assert!(structural_equals(
            &Value::sequence([1, 2, 3]),
            &Value::sequence([1, 2, 3])
        ));
        assert!(!structural_equals(
            &Value::sequence([1, 2, 3]),
            &Value::sequence([1, 2, 4])
        ));
        assert!(!structural_equals(
            &Value::sequence([1, 2]),
            &Value::sequence([1, 2, 3])
        ));
    }

    #[test]
    fn mappings_ignore_key_order() {
        let a = Value::mapping([("x", 1), ("y", 2)]);
        let b = Value::mapping([("y", 2), ("x", 1)]);
        assert!(structural_equals(&a, &b));
    }

    #[test]
    fn mappings_with_missing_key() {
        let a = Value::mapping([("x", 1), ("y", 2)]);
        let b = Value::mapping([("x", 1), ("z", 2)]);
        assert!(!structural_equals(&a, &b));
    }

    #[test]
    fn sequence_and_mapping_never_match() {
        let seq = Value::sequence(Vec::<Value>::new());
        let map = Value::mapping(Vec::<(String, Value)>::new());
        assert!(!structural_equals(&seq, &map));
    }

    #[test]
    fn different_classes_never_match() {
        let point = Value::Object(ObjectRef::instance(
            Class::named("Point"),
            [("x", 1), ("y", 2)],
        ));
        let vector = Value::Object(ObjectRef::instance(
            Class::named("Vector"),
            [("x", 1), ("y", 2)],
        ));
        let plain = Value::mapping([("x", 1), ("y", 2)]);

        assert!(!structural_equals(&point, &vector));
        assert!(!structural_equals(&point, &plain));
        assert!(structural_equals(&point, &point));
    }

    #[test]
    fn self_referential_graph_equals_itself() {
        let node = ObjectRef::mapping([("name", "loop")]);
        node.set("self", node.clone());
        let value = Value::Object(node);
        assert!(structural_equals(&value, &value));
    }

    #[test]
    fn parallel_cycles_are_equal() {
        let a = ObjectRef::mapping([("n", 1)]);
        a.set("next", a.clone());
        let b = ObjectRef::mapping([("n", 1)]);
        b.set("next", b.clone());
        assert!(structural_equals(&Value::Object(a), &Value::Object(b)));
    }

    #[test]
    fn aliasing_must_line_up() {
        // Left reuses one object twice; right has two distinct (but equal)
        // objects. The second visit of the shared object meets a different
        // partner, which is a mismatch.
        let shared = ObjectRef::sequence([1]);
        let left = Value::sequence([shared.clone(), shared]);
        let right = Value::sequence([ObjectRef::sequence([1]), ObjectRef::sequence([1])]);
        assert!(!structural_equals(&left, &right));
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let mut value = Value::from(0);
        for _ in 0..200_000 {
            value = Value::sequence([value]);
        }
        let copy = crate::reactivity::clone::structural_clone(&value);
        assert!(structural_equals(&value, &copy));
        assert!(structural_equals(&copy, &value));
        drop(copy);
        drop(value);
    }

    #[test]
    fn safe_number_helpers() {
        assert!(safe_equals_f64(&1.0, &1.0));
        assert!(safe_equals_f64(&f64::NAN, &f64::NAN));
        assert!(!safe_equals_f64(&f64::NAN, &1.0));
        assert!(safe_equals_f64(&f64::INFINITY, &f64::INFINITY));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: EqualityOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.numbers, NumberSemantics::Strict);

        let options: EqualityOptions =
            serde_json::from_str(r#"{"numbers":"same_value_zero"}"#).unwrap();
        assert_eq!(options, same_value_zero());
    }
}
