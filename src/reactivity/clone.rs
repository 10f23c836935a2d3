// ============================================================================
// objekt - Structural Clone
// Deep, cycle-safe copies of value graphs
// ============================================================================

use std::collections::HashMap;

use crate::core::types::{Key, ObjectRef, Value};

/// Produce a deep, independent copy of `value`.
///
/// Scalars are returned as-is. Objects are copied with an explicit work list
/// and an identity map from each source object to its copy, so:
///
/// - cycles terminate and are reproduced (`copy.self` is `copy`),
/// - an object reachable along several paths is copied once and stays shared,
/// - classes carry over, and mapping key order is kept.
///
/// # Example
/// ```
/// use objekt::{structural_clone, structural_equals, ObjectRef, Value};
///
/// let node = ObjectRef::mapping([("name", "root")]);
/// node.set("self", node.clone());
///
/// let copy = structural_clone(&Value::Object(node.clone()));
/// let copy = copy.as_object().unwrap();
///
/// assert!(!copy.ptr_eq(&node));
/// assert!(copy.get("self").unwrap().as_object().unwrap().ptr_eq(copy));
/// ```
pub fn structural_clone(value: &Value) -> Value {
    let Value::Object(root) = value else {
        return value.clone();
    };

    let mut copies: HashMap<usize, ObjectRef> = HashMap::new();
    let mut work: Vec<(ObjectRef, Key, Value)> = Vec::new();

    let copy = allocate(root, &mut copies, &mut work);

    while let Some((destination, key, source)) = work.pop() {
        let cloned = match &source {
            Value::Object(object) => match copies.get(&object.addr()) {
                Some(existing) => Value::Object(existing.clone()),
                None => Value::Object(allocate(object, &mut copies, &mut work)),
            },
            scalar => scalar.clone(),
        };
        destination.fill(&key, cloned);
    }

    Value::Object(copy)
}

/// Allocate the copy of `source` with placeholder slots, link it in the
/// identity map, and queue its children.
fn allocate(
    source: &ObjectRef,
    copies: &mut HashMap<usize, ObjectRef>,
    work: &mut Vec<(ObjectRef, Key, Value)>,
) -> ObjectRef {
    let copy = {
        let object = source.borrow();
        ObjectRef::new(object.class().clone(), object.shape().placeholder())
    };
    copies.insert(source.addr(), copy.clone());

    for (key, child) in source.children() {
        work.push((copy.clone(), key, child));
    }
    copy
}

// =============================================================================
// TESTS
// =============================================================================
