// ============================================================================
// objekt - Type Definitions
// The dynamic value model shared by containers and the equality/clone engines
// ============================================================================

use std::borrow::Cow;
use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::constants::MAX_SEQUENCE_INDEX;
use super::error::ObjektError;

// =============================================================================
// CLASS - constructor lineage tag
// =============================================================================

/// The concrete type of an object.
///
/// Structural equality only compares objects of the same class, so a `Point`
/// and a plain mapping with the same fields are never equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Class(Cow<'static, str>);

impl Class {
    /// Class of every sequence.
    pub const ARRAY: Class = Class(Cow::Borrowed("Array"));

    /// Class of plain mappings.
    pub const OBJECT: Class = Class(Cow::Borrowed("Object"));

    /// A user-defined class.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Class(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// KEY
// =============================================================================

/// A property key: a sequence index or a mapping name.
///
/// Indices and their decimal names address the same slot, and both render
/// identically through `Display`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    /// The index this key addresses, if it is one or spells one.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(name) => name.parse().ok(),
        }
    }

    /// The key as a mapping name.
    pub fn to_name(&self) -> String {
        match self {
            Key::Index(i) => i.to_string(),
            Key::Name(name) => name.clone(),
        }
    }

    /// The name, if this is a non-numeric key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{i}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        match usize::try_from(i) {
            Ok(i) => Key::Index(i),
            Err(_) => Key::Name(i.to_string()),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

// =============================================================================
// OBJECT
// =============================================================================

/// The body of an object.
#[derive(Clone, Debug)]
pub enum Shape {
    Sequence(Vec<Value>),
    Mapping(IndexMap<String, Value>),
}

impl Shape {
    pub fn len(&self) -> usize {
        match self {
            Shape::Sequence(items) => items.len(),
            Shape::Mapping(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move every child out, leaving the shape empty.
    fn drain(&mut self) -> Vec<Value> {
        match self {
            Shape::Sequence(items) => std::mem::take(items),
            Shape::Mapping(entries) => std::mem::take(entries).into_values().collect(),
        }
    }

    /// An empty shape of the same kind, with mapping keys pre-seeded to null
    /// and sequences pre-sized so that slots can be filled in any order.
    pub(crate) fn placeholder(&self) -> Shape {
        match self {
            Shape::Sequence(items) => Shape::Sequence(vec![Value::Null; items.len()]),
            Shape::Mapping(entries) => Shape::Mapping(
                entries.keys().map(|k| (k.clone(), Value::Null)).collect(),
            ),
        }
    }
}

/// A non-scalar value: a class tag plus its body.
#[derive(Debug)]
pub struct Object {
    class: Class,
    shape: Shape,
}

impl Object {
    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

// Dropping a deep chain of uniquely owned objects would otherwise recurse
// once per level. Children we hold the last handle to are unwrapped onto a
// heap stack and emptied there; shared children only lose a reference.
impl Drop for Object {
    fn drop(&mut self) {
        let mut stack = self.shape.drain();
        while let Some(value) = stack.pop() {
            if let Value::Object(ObjectRef(rc)) = value {
                if let Ok(cell) = Rc::try_unwrap(rc) {
                    let mut object = cell.into_inner();
                    stack.append(&mut object.shape.drain());
                }
            }
        }
    }
}

/// Shared handle to an [`Object`].
///
/// Cloning the handle aliases the object. Identity is pointer identity, which
/// is what lets a value graph contain shared substructure and cycles.
///
/// Reference counting does not reclaim cycles; a graph that points back at
/// itself lives until the process ends unless a link is broken by hand.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(class: Class, shape: Shape) -> Self {
        ObjectRef(Rc::new(RefCell::new(Object { class, shape })))
    }

    /// A new sequence object.
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(
            Class::ARRAY,
            Shape::Sequence(items.into_iter().map(Into::into).collect()),
        )
    }

    /// A new plain mapping object.
    pub fn mapping<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::instance(Class::OBJECT, entries)
    }

    /// A new mapping object of the given class.
    pub fn instance<I, K, V>(class: Class, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new(
            class,
            Shape::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        )
    }

    pub fn class(&self) -> Class {
        self.0.borrow().class.clone()
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.0.borrow().shape, Shape::Sequence(_))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().shape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the object for inspection.
    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    /// Read a slot. Plain objects are not reactive; this is a direct read.
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        match &self.0.borrow().shape {
            Shape::Sequence(items) => key.as_index().and_then(|i| items.get(i).cloned()),
            Shape::Mapping(entries) => entries.get(&key.to_name()).cloned(),
        }
    }

    /// Write a slot, returning the previous value.
    ///
    /// Writing past the end of a sequence pads it with nulls. Non-numeric
    /// names and indices past [`MAX_SEQUENCE_INDEX`] are ignored on a
    /// sequence.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match &mut self.0.borrow_mut().shape {
            Shape::Sequence(items) => {
                let i = key.as_index().filter(|&i| i <= MAX_SEQUENCE_INDEX)?;
                if i >= items.len() {
                    items.try_reserve(i + 1 - items.len()).ok()?;
                    items.resize(i + 1, Value::Null);
                    items[i] = value;
                    None
                } else {
                    Some(std::mem::replace(&mut items[i], value))
                }
            }
            Shape::Mapping(entries) => entries.insert(key.to_name(), value),
        }
    }

    /// Append to a sequence. No-op on mappings.
    pub fn push(&self, value: impl Into<Value>) {
        if let Shape::Sequence(items) = &mut self.0.borrow_mut().shape {
            items.push(value.into());
        }
    }

    /// Remove a mapping entry, keeping the order of the rest.
    /// Sequences are left untouched; use `set` to overwrite a slot.
    pub fn remove(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        match &mut self.0.borrow_mut().shape {
            Shape::Sequence(_) => None,
            Shape::Mapping(entries) => entries.shift_remove(&key.to_name()),
        }
    }

    pub fn keys(&self) -> Vec<Key> {
        match &self.0.borrow().shape {
            Shape::Sequence(items) => (0..items.len()).map(Key::Index).collect(),
            Shape::Mapping(entries) => entries.keys().cloned().map(Key::Name).collect(),
        }
    }

    /// Snapshot of the direct children, in order.
    pub fn children(&self) -> Vec<(Key, Value)> {
        match &self.0.borrow().shape {
            Shape::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Key::Index(i), v.clone()))
                .collect(),
            Shape::Mapping(entries) => entries
                .iter()
                .map(|(k, v)| (Key::Name(k.clone()), v.clone()))
                .collect(),
        }
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the underlying allocation, stable while any handle lives.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Replace a slot that is known to exist. Used by the clone engine to fill
    /// placeholders without reordering mappings.
    pub(crate) fn fill(&self, key: &Key, value: Value) {
        match &mut self.0.borrow_mut().shape {
            Shape::Sequence(items) => {
                if let Some(slot) = key.as_index().and_then(|i| items.get_mut(i)) {
                    *slot = value;
                }
            }
            Shape::Mapping(entries) => {
                if let Some(slot) = entries.get_mut(&key.to_name()) {
                    *slot = value;
                }
            }
        }
    }
}

// Shallow on purpose: a derived Debug would recurse forever on cycles.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => f
                .debug_struct("ObjectRef")
                .field("class", &object.class.name())
                .field("len", &object.shape.len())
                .finish(),
            Err(_) => f.write_str("ObjectRef(<borrowed>)"),
        }
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// Any value a container can hold.
///
/// `Null`, `Bool`, `Number` and `Text` are scalars and compare by value.
/// `Object` is a shared reference and compares structurally.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Object(ObjectRef),
}

impl Value {
    /// A new sequence value.
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Object(ObjectRef::sequence(items))
    }

    /// A new plain mapping value.
    pub fn mapping<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(ObjectRef::mapping(entries))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Object(_))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Export as JSON.
    ///
    /// Shared substructure is written out once per reference. Cycles and
    /// non-finite numbers have no JSON form and are rejected.
    pub fn to_json(&self) -> Result<serde_json::Value, ObjektError> {
        let Value::Object(root) = self else {
            return scalar_to_json(self);
        };

        // Objects currently being written, so a back edge is a cycle
        let mut on_path = HashSet::new();
        let mut stack = vec![JsonFrame::enter(root, String::new(), &mut on_path)?];
        let mut result = serde_json::Value::Null;

        while let Some(frame) = stack.last_mut() {
            match frame.children.next() {
                Some((key, Value::Object(child))) => {
                    let frame = JsonFrame::enter(&child, key.to_name(), &mut on_path)?;
                    stack.push(frame);
                }
                Some((key, scalar)) => frame.insert(key.to_name(), scalar_to_json(&scalar)?),
                None => {
                    let Some(done) = stack.pop() else { break };
                    on_path.remove(&done.addr);
                    match stack.last_mut() {
                        Some(parent) => parent.insert(done.slot, done.json),
                        None => result = done.json,
                    }
                }
            }
        }
        Ok(result)
    }
}

// Largest integer an f64 holds exactly; integral numbers up to it export as
// JSON integers.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn scalar_to_json(value: &Value) -> Result<serde_json::Value, ObjektError> {
    use serde_json::Value as Json;

    Ok(match value {
        Value::Null | Value::Object(_) => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
            Json::from(*n as i64)
        }
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(Json::Number)
            .ok_or(ObjektError::NonFiniteNumber(*n))?,
        Value::Text(s) => Json::String(s.clone()),
    })
}

/// One object being exported: its remaining children and the JSON built so far.
struct JsonFrame {
    addr: usize,
    /// Name under which the finished JSON lands in the parent
    slot: String,
    children: std::vec::IntoIter<(Key, Value)>,
    json: serde_json::Value,
}

impl JsonFrame {
    fn enter(
        object: &ObjectRef,
        slot: String,
        on_path: &mut HashSet<usize>,
    ) -> Result<Self, ObjektError> {
        if !on_path.insert(object.addr()) {
            return Err(ObjektError::Cycle);
        }
        let json = if object.is_sequence() {
            serde_json::Value::Array(Vec::with_capacity(object.len()))
        } else {
            serde_json::Value::Object(serde_json::Map::new())
        };
        Ok(Self {
            addr: object.addr(),
            slot,
            children: object.children().into_iter(),
            json,
        })
    }

    fn insert(&mut self, name: String, value: serde_json::Value) {
        match &mut self.json {
            serde_json::Value::Array(items) => items.push(value),
            serde_json::Value::Object(entries) => {
                entries.insert(name, value);
            }
            _ => {}
        }
    }
}

// Structural, with strict number semantics (NaN is never equal to itself).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        crate::reactivity::equality::structural_equals(self, other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::Text(s),
            Json::Array(items) => Value::sequence(items.into_iter().map(Value::from)),
            Json::Object(entries) => {
                Value::mapping(entries.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
