// ============================================================================
// objekt - ReactiveContainer
// A key/value or sequence store whose writes emit classified change events
// ============================================================================
//
// Every operation goes through the handle. Reads consult the reflection
// context, writes diff against the previous value with structural equality,
// and events go out synchronously once the store borrow is released, so a
// handler may read or write the same container again.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::constants::{is_control_member, MAX_SEQUENCE_INDEX, SEQUENCE_TAG};
use crate::core::context::{next_container_id, with_context};
use crate::core::types::{Class, Key, ObjectRef, Shape, Value};
use crate::primitives::emitter::{Emitter, Handler};
use crate::primitives::event::{ChangeEvent, ChangeKind};
use crate::reactivity::clone::structural_clone;
use crate::reactivity::equality::{structural_equals_with, EqualityOptions, NumberSemantics};

/// Callback type for container events.
pub type ChangeHandler = Handler<ChangeEvent>;

// =============================================================================
// SEED
// =============================================================================

/// What a container starts from.
#[derive(Clone, Debug)]
pub enum Seed {
    /// A sequence or mapping to copy from. Anything else starts an empty mapping.
    Value(Value),
    /// An empty sequence.
    EmptySequence,
}

impl From<Value> for Seed {
    fn from(value: Value) -> Self {
        Seed::Value(value)
    }
}

impl From<ObjectRef> for Seed {
    fn from(object: ObjectRef) -> Self {
        Seed::Value(Value::Object(object))
    }
}

/// `"array"` starts an empty sequence; any other string an empty mapping.
impl From<&str> for Seed {
    fn from(tag: &str) -> Self {
        Seed::Value(Value::from(tag))
    }
}

impl From<serde_json::Value> for Seed {
    fn from(json: serde_json::Value) -> Self {
        Seed::Value(Value::from(json))
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Container configuration.
///
/// # Example
/// ```
/// use objekt::{ContainerOptions, NumberSemantics};
///
/// let options = ContainerOptions::new()
///     .silent(true)
///     .numbers(NumberSemantics::SameValueZero);
/// assert!(options.silent);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// Start with event emission suppressed
    pub silent: bool,

    /// How writes decide whether a value changed
    pub equality: EqualityOptions,
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn equality(mut self, equality: EqualityOptions) -> Self {
        self.equality = equality;
        self
    }

    pub fn numbers(mut self, numbers: NumberSemantics) -> Self {
        self.equality.numbers = numbers;
        self
    }
}

// =============================================================================
// BACKING STORE
// =============================================================================

/// Whether a container holds a sequence or a mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Sequence,
    Mapping,
}

enum Store {
    /// `None` marks a hole: a slot that was never written or was deleted
    Sequence {
        class: Class,
        items: Vec<Option<Value>>,
    },
    Mapping {
        class: Class,
        entries: IndexMap<String, Value>,
    },
}

impl Store {
    fn from_seed(seed: Seed) -> Self {
        match seed {
            Seed::EmptySequence => Store::empty_sequence(),
            Seed::Value(Value::Object(object)) => {
                let object = object.borrow();
                match object.shape() {
                    Shape::Sequence(items) => Store::Sequence {
                        class: object.class().clone(),
                        items: items.iter().cloned().map(Some).collect(),
                    },
                    Shape::Mapping(entries) => Store::Mapping {
                        class: object.class().clone(),
                        entries: entries.clone(),
                    },
                }
            }
            Seed::Value(Value::Text(tag)) if tag == SEQUENCE_TAG => Store::empty_sequence(),
            Seed::Value(other) => {
                debug!(seed = ?other, "container seed is not a sequence or mapping; starting empty");
                Store::Mapping {
                    class: Class::OBJECT,
                    entries: IndexMap::new(),
                }
            }
        }
    }

    fn empty_sequence() -> Self {
        Store::Sequence {
            class: Class::ARRAY,
            items: Vec::new(),
        }
    }

    fn kind(&self) -> ContainerKind {
        match self {
            Store::Sequence { .. } => ContainerKind::Sequence,
            Store::Mapping { .. } => ContainerKind::Mapping,
        }
    }

    fn read(&self, key: &Key) -> Option<Value> {
        match self {
            Store::Sequence { items, .. } => key
                .as_index()
                .and_then(|i| items.get(i))
                .and_then(Clone::clone),
            Store::Mapping { entries, .. } => entries.get(&key.to_name()).cloned(),
        }
    }

    fn contains(&self, key: &Key) -> bool {
        match self {
            Store::Sequence { items, .. } => key
                .as_index()
                .is_some_and(|i| matches!(items.get(i), Some(Some(_)))),
            Store::Mapping { entries, .. } => entries.contains_key(&key.to_name()),
        }
    }

    /// Store `value`, returning `None` if the key cannot address this store,
    /// or `Some(previous)` otherwise.
    ///
    /// Sequences only accept indices up to `MAX_SEQUENCE_INDEX`, and only if
    /// the padding holes can be allocated.
    fn write(&mut self, key: &Key, value: Value) -> Option<Option<Value>> {
        match self {
            Store::Sequence { items, .. } => {
                let i = key.as_index().filter(|&i| i <= MAX_SEQUENCE_INDEX)?;
                if i >= items.len() {
                    items.try_reserve(i + 1 - items.len()).ok()?;
                    items.resize(i + 1, None);
                }
                Some(items[i].replace(value))
            }
            Store::Mapping { entries, .. } => Some(entries.insert(key.to_name(), value)),
        }
    }

    fn remove(&mut self, key: &Key) -> Option<Value> {
        match self {
            Store::Sequence { items, .. } => key
                .as_index()
                .and_then(|i| items.get_mut(i))
                .and_then(Option::take),
            Store::Mapping { entries, .. } => entries.shift_remove(&key.to_name()),
        }
    }

    fn keys(&self) -> Vec<Key> {
        match self {
            Store::Sequence { items, .. } => items
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.is_some())
                .map(|(i, _)| Key::Index(i))
                .collect(),
            Store::Mapping { entries, .. } => entries.keys().cloned().map(Key::Name).collect(),
        }
    }

    fn entries(&self) -> Vec<(Key, Value)> {
        match self {
            Store::Sequence { items, .. } => items
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| slot.clone().map(|v| (Key::Index(i), v)))
                .collect(),
            Store::Mapping { entries, .. } => entries
                .iter()
                .map(|(k, v)| (Key::Name(k.clone()), v.clone()))
                .collect(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Store::Sequence { items, .. } => items.iter().filter(|slot| slot.is_some()).count(),
            Store::Mapping { entries, .. } => entries.len(),
        }
    }

    /// The store as a plain object. Holes become nulls. Children are shared.
    fn to_object(&self) -> ObjectRef {
        match self {
            Store::Sequence { class, items } => ObjectRef::new(
                class.clone(),
                Shape::Sequence(
                    items
                        .iter()
                        .map(|slot| slot.clone().unwrap_or_default())
                        .collect(),
                ),
            ),
            Store::Mapping { class, entries } => ObjectRef::new(
                class.clone(),
                Shape::Mapping(entries.clone()),
            ),
        }
    }
}

// =============================================================================
// REACTIVE CONTAINER
// =============================================================================

struct ContainerInner {
    id: u64,
    store: RefCell<Store>,
    emitter: Emitter<ChangeEvent>,
    silent: Cell<bool>,
    equality: EqualityOptions,
}

/// A reactive sequence or mapping.
///
/// Writes that change a key's structural value emit `add`, `change` or
/// `delete` events; writes of an equal value emit nothing. Every event is
/// also emitted under `"*"`.
///
/// Cloning the handle shares the container. A handler that captures a
/// strong handle keeps the container alive; capture a [`WeakContainer`]
/// from [`downgrade`](Self::downgrade) instead when that matters.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use objekt::{mapping, ChangeEvent, ChangeKind, ReactiveContainer};
///
/// let state = ReactiveContainer::new(mapping! { "x" => 1 });
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = log.clone();
/// state.on("*", move |e: &ChangeEvent| sink.borrow_mut().push(e.kind));
///
/// state.set("x", 1); // same value, no event
/// state.set("x", 2);
/// state.set("y", 3);
/// state.delete("y");
///
/// assert_eq!(
///     *log.borrow(),
///     vec![ChangeKind::Change, ChangeKind::Add, ChangeKind::Delete]
/// );
/// ```
#[derive(Clone)]
pub struct ReactiveContainer {
    inner: Rc<ContainerInner>,
}

impl ReactiveContainer {
    /// Create a container from a seed.
    ///
    /// Sequences and mappings are copied one level deep: the container owns
    /// its top-level slots, nested objects stay shared with the seed.
    pub fn new(seed: impl Into<Seed>) -> Self {
        Self::with_options(seed, ContainerOptions::default())
    }

    /// An empty sequence container.
    pub fn sequence() -> Self {
        Self::new(Seed::EmptySequence)
    }

    /// An empty mapping container.
    pub fn mapping() -> Self {
        Self::new(Value::Null)
    }

    pub fn with_options(seed: impl Into<Seed>, options: ContainerOptions) -> Self {
        let store = Store::from_seed(seed.into());
        Self {
            inner: Rc::new(ContainerInner {
                id: next_container_id(),
                store: RefCell::new(store),
                emitter: Emitter::new(),
                silent: Cell::new(options.silent),
                equality: options.equality,
            }),
        }
    }

    /// Unique id, assigned in creation order.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn kind(&self) -> ContainerKind {
        self.inner.store.borrow().kind()
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Read a key.
    ///
    /// Inside [`reflect`](crate::reflect) this records the read and returns
    /// `Value::Null`. Otherwise it returns the stored value, or `Value::Null`
    /// if the key is absent.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let key = key.into();

        let reflecting = with_context(|ctx| {
            if !ctx.is_reflecting() {
                return false;
            }
            ctx.record(self, &key);
            true
        });
        if reflecting {
            return Value::Null;
        }

        self.inner.store.borrow().read(&key).unwrap_or_default()
    }

    /// True if the key is stored, or names one of the container's own members.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        self.inner.store.borrow().contains(&key) || key.as_name().is_some_and(is_control_member)
    }

    /// Stored keys: indices in order for sequences, insertion order for
    /// mappings. Never includes the container's own members.
    #[doc(alias = "own_keys")]
    pub fn keys(&self) -> Vec<Key> {
        self.inner.store.borrow().keys()
    }

    /// Key/value pairs over the current contents. Each call starts over.
    pub fn entries(&self) -> Entries {
        Entries {
            inner: self.inner.store.borrow().entries().into_iter(),
        }
    }

    /// Number of stored keys (holes in a sequence are not counted).
    pub fn len(&self) -> usize {
        self.inner.store.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A deep, independent copy of the contents as a plain value.
    pub fn snapshot(&self) -> Value {
        let shallow = self.inner.store.borrow().to_object();
        structural_clone(&Value::Object(shallow))
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Write a key.
    ///
    /// Emits `add` if the key was absent, `change` if the old value is
    /// structurally different, nothing otherwise. Always returns true; a
    /// non-numeric name on a sequence, or an index past
    /// [`MAX_SEQUENCE_INDEX`], is ignored.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();

        let written = self.inner.store.borrow_mut().write(&key, value.clone());
        let Some(previous) = written else {
            debug!(
                container = self.id(),
                key = %key,
                "ignoring non-index or out-of-range key on sequence"
            );
            return true;
        };

        match previous {
            None => self.emit(ChangeKind::Add, key, value, None),
            Some(previous) => {
                if !structural_equals_with(&previous, &value, self.inner.equality) {
                    self.emit(ChangeKind::Change, key, value, Some(previous));
                }
            }
        }
        true
    }

    /// Remove a key, emitting `delete` if it was present.
    ///
    /// Returns whether anything was removed. Deleting a sequence index
    /// leaves a hole rather than shifting later elements.
    pub fn delete(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        let removed = self.inner.store.borrow_mut().remove(&key);
        match removed {
            Some(previous) => {
                self.emit(ChangeKind::Delete, key, previous.clone(), Some(previous));
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    pub fn on(&self, name: &str, handler: impl Into<ChangeHandler>) -> &Self {
        self.inner.emitter.on(name, handler);
        self
    }

    pub fn once(&self, name: &str, handler: impl Into<ChangeHandler>) -> &Self {
        self.inner.emitter.once(name, handler);
        self
    }

    pub fn off(&self, name: &str, handler: &ChangeHandler) -> &Self {
        self.inner.emitter.off(name, handler);
        self
    }

    /// Suppress events. Mutations still apply.
    pub fn silence(&self) -> &Self {
        self.inner.silent.set(true);
        self
    }

    /// Resume emitting events.
    pub fn resume(&self) -> &Self {
        self.inner.silent.set(false);
        self
    }

    pub fn is_silent(&self) -> bool {
        self.inner.silent.get()
    }

    fn emit(&self, kind: ChangeKind, key: Key, value: Value, previous: Option<Value>) {
        if self.is_silent() {
            trace!(container = self.id(), %kind, %key, "silenced");
            return;
        }
        let event = ChangeEvent {
            kind,
            key,
            value,
            previous,
            container: self.clone(),
        };
        self.inner.emitter.emit(kind.event_name(), &event);
    }

    // =========================================================================
    // IDENTITY
    // =========================================================================

    pub fn ptr_eq(&self, other: &ReactiveContainer) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for ReactiveContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ReactiveContainer");
        s.field("id", &self.inner.id);
        match self.inner.store.try_borrow() {
            Ok(store) => s.field("kind", &store.kind()).field("len", &store.len()),
            Err(_) => s.field("store", &"<borrowed>"),
        };
        s.field("silent", &self.inner.silent.get()).finish()
    }
}

impl<'a> IntoIterator for &'a ReactiveContainer {
    type Item = (Key, Value);
    type IntoIter = Entries;

    fn into_iter(self) -> Entries {
        self.entries()
    }
}

// =============================================================================
// WEAK HANDLE
// =============================================================================

/// A handle that does not keep the container alive.
#[derive(Clone)]
pub struct WeakContainer {
    inner: Weak<ContainerInner>,
}

impl WeakContainer {
    pub fn upgrade(&self) -> Option<ReactiveContainer> {
        self.inner.upgrade().map(|inner| ReactiveContainer { inner })
    }
}

impl fmt::Debug for WeakContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakContainer")
    }
}

// =============================================================================
// ITERATION
// =============================================================================

/// Snapshot iterator over a container's key/value pairs.
pub struct Entries {
    inner: std::vec::IntoIter<(Key, Value)>,
}

impl Iterator for Entries {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Entries {}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{EVENT_ADD, EVENT_ANY, EVENT_CHANGE, EVENT_DELETE};
    use crate::reactivity::equality::structural_equals;

    fn events(container: &ReactiveContainer) -> Rc<RefCell<Vec<ChangeEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        container.on(EVENT_ANY, move |e: &ChangeEvent| sink.borrow_mut().push(e.clone()));
        log
    }

    #[test]
    fn seed_normalization() {
        assert_eq!(ReactiveContainer::new(Value::Null).kind(), ContainerKind::Mapping);
        assert_eq!(ReactiveContainer::new(Value::from(5)).kind(), ContainerKind::Mapping);
        assert_eq!(ReactiveContainer::new("nonsense").kind(), ContainerKind::Mapping);
        assert_eq!(ReactiveContainer::new(SEQUENCE_TAG).kind(), ContainerKind::Sequence);
        assert_eq!(ReactiveContainer::sequence().kind(), ContainerKind::Sequence);
        assert_eq!(
            ReactiveContainer::new(Value::sequence([1, 2])).kind(),
            ContainerKind::Sequence
        );
        assert!(ReactiveContainer::new(Value::from(5)).is_empty());
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = ReactiveContainer::mapping();
        let b = ReactiveContainer::mapping();
        assert!(b.id() > a.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn get_missing_is_null() {
        let c = ReactiveContainer::new(Value::mapping([("x", 1)]));
        assert_eq!(c.get("x").as_f64(), Some(1.0));
        assert!(c.get("nope").is_null());
        assert!(c.get(3).is_null());
    }

    #[test]
    fn equal_write_is_silent() {
        let c = ReactiveContainer::new(Value::mapping([("x", 1)]));
        let log = events(&c);
        assert!(c.set("x", 1));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn changed_write_emits_change() {
        let c = ReactiveContainer::new(Value::mapping([("x", 1)]));
        let log = events(&c);
        c.set("x", 2);

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, ChangeKind::Change);
        assert_eq!(log[0].key, Key::from("x"));
        assert_eq!(log[0].value, Value::from(2));
        assert_eq!(log[0].previous, Some(Value::from(1)));
        assert!(log[0].container.ptr_eq(&c));
    }

    #[test]
    fn structurally_equal_object_write_is_silent() {
        let c = ReactiveContainer::new(Value::mapping([("list", Value::sequence([1, 2]))]));
        let log = events(&c);
        c.set("list", Value::sequence([1, 2]));
        assert!(log.borrow().is_empty());

        c.set("list", Value::sequence([1, 2, 3]));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn add_then_delete() {
        let c = ReactiveContainer::mapping();
        let log = events(&c);

        c.set("y", 5);
        assert!(c.delete("y"));
        assert!(!c.delete("y"));

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, ChangeKind::Add);
        assert_eq!(log[0].value, Value::from(5));
        assert_eq!(log[0].previous, None);
        assert_eq!(log[1].kind, ChangeKind::Delete);
        assert_eq!(log[1].previous, Some(Value::from(5)));
    }

    #[test]
    fn writing_null_to_new_key_is_an_add() {
        let c = ReactiveContainer::mapping();
        let log = events(&c);
        c.set("k", Value::Null);
        c.set("k", Value::Null);
        assert_eq!(log.borrow().len(), 1);
        assert!(c.has("k"));
    }

    #[test]
    fn kind_specific_subscriptions() {
        let c = ReactiveContainer::mapping();
        let adds = Rc::new(Cell::new(0));
        let changes = Rc::new(Cell::new(0));
        let deletes = Rc::new(Cell::new(0));

        let (a, ch, d) = (adds.clone(), changes.clone(), deletes.clone());
        c.on(EVENT_ADD, move |_: &ChangeEvent| a.set(a.get() + 1))
            .on(EVENT_CHANGE, move |_: &ChangeEvent| ch.set(ch.get() + 1))
            .on(EVENT_DELETE, move |_: &ChangeEvent| d.set(d.get() + 1));

        c.set("a", 1);
        c.set("a", 2);
        c.set("b", 1);
        c.delete("a");

        assert_eq!((adds.get(), changes.get(), deletes.get()), (2, 1, 1));
    }

    #[test]
    fn once_and_off() {
        let c = ReactiveContainer::mapping();
        let count = Rc::new(Cell::new(0));

        let k = count.clone();
        c.once(EVENT_ANY, move |_: &ChangeEvent| k.set(k.get() + 1));
        c.set("a", 1);
        c.set("b", 1);
        assert_eq!(count.get(), 1);

        let k = count.clone();
        let handler = ChangeHandler::new(move |_| k.set(k.get() + 1));
        c.on(EVENT_ANY, handler.clone());
        c.set("c", 1);
        c.off(EVENT_ANY, &handler);
        c.set("d", 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn has_reports_store_and_control_surface() {
        let c = ReactiveContainer::new(Value::mapping([("x", 1)]));
        assert!(c.has("x"));
        assert!(c.has("on"));
        assert!(c.has("silence"));
        assert!(!c.has("y"));
        assert!(c.get("on").is_null());
    }

    #[test]
    fn keys_exclude_control_surface() {
        let c = ReactiveContainer::new(Value::mapping([("b", 1), ("a", 2)]));
        c.set("c", 3);
        assert_eq!(c.keys(), vec![Key::from("b"), Key::from("a"), Key::from("c")]);
        assert!(!c.keys().iter().any(|k| k.as_name().is_some_and(is_control_member)));
    }

    #[test]
    fn delete_keeps_mapping_order() {
        let c = ReactiveContainer::new(Value::mapping([("a", 1), ("b", 2), ("c", 3)]));
        c.delete("b");
        assert_eq!(c.keys(), vec![Key::from("a"), Key::from("c")]);
    }

    #[test]
    fn sequence_holes() {
        let c = ReactiveContainer::new(Value::sequence(["a", "b", "c"]));
        let log = events(&c);

        assert!(c.delete(1));
        assert_eq!(c.keys(), vec![Key::Index(0), Key::Index(2)]);
        assert_eq!(c.len(), 2);
        assert!(!c.has(1));

        // Writing into a hole is an add
        c.set(1, "B");
        c.set(5, "f");
        assert_eq!(c.keys().len(), 4);
        assert!(c.get(4).is_null());

        let kinds: Vec<ChangeKind> = log.borrow().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Delete, ChangeKind::Add, ChangeKind::Add]);
    }

    #[test]
    fn sequence_accepts_numeric_names_and_ignores_others() {
        let c = ReactiveContainer::sequence();
        let log = events(&c);

        assert!(c.set("0", "zero"));
        assert_eq!(c.get(0).as_str(), Some("zero"));

        assert!(c.set("label", "ignored"));
        assert!(!c.has("label"));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn out_of_range_sequence_index_is_ignored() {
        let c = ReactiveContainer::new(Value::sequence([1]));
        let log = events(&c);

        assert!(c.set(usize::MAX, "x"));
        assert!(c.set("18446744073709551615", "x"));
        assert!(c.set(MAX_SEQUENCE_INDEX + 1, "x"));
        assert!(c.set(10_000_000_000usize, "x"));

        assert_eq!(c.keys(), vec![Key::Index(0)]);
        assert!(!c.has(usize::MAX));
        assert!(log.borrow().is_empty());

        // The container is still usable afterwards
        c.set(1, 2);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn silence_suppresses_events_but_applies_writes() {
        let c = ReactiveContainer::mapping();
        let log = events(&c);

        c.silence().set("a", 1);
        assert!(c.is_silent());
        assert_eq!(c.get("a").as_f64(), Some(1.0));
        assert!(log.borrow().is_empty());

        c.resume().set("a", 2);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn silent_option_starts_silenced() {
        let c = ReactiveContainer::with_options(Value::Null, ContainerOptions::new().silent(true));
        let log = events(&c);
        c.set("a", 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn nan_policy_follows_options() {
        let strict = ReactiveContainer::new(Value::mapping([("n", f64::NAN)]));
        let strict_log = events(&strict);
        strict.set("n", f64::NAN);
        assert_eq!(strict_log.borrow().len(), 1);

        let lenient = ReactiveContainer::with_options(
            Value::mapping([("n", f64::NAN)]),
            ContainerOptions::new().numbers(NumberSemantics::SameValueZero),
        );
        let lenient_log = events(&lenient);
        lenient.set("n", f64::NAN);
        assert!(lenient_log.borrow().is_empty());
    }

    #[test]
    fn handlers_may_write_back() {
        let c = ReactiveContainer::mapping();
        let weak = c.downgrade();
        c.on(EVENT_ADD, move |e: &ChangeEvent| {
            if e.key == Key::from("a") {
                if let Some(c) = weak.upgrade() {
                    c.set("b", e.value.clone());
                }
            }
        });

        c.set("a", 1);
        assert_eq!(c.get("b").as_f64(), Some(1.0));
    }

    #[test]
    fn entries_restart() {
        let c = ReactiveContainer::new(Value::mapping([("a", 1), ("b", 2)]));
        let first: Vec<_> = c.entries().map(|(k, _)| k).collect();
        let second: Vec<_> = (&c).into_iter().map(|(k, _)| k).collect();
        assert_eq!(first, second);
        assert_eq!(c.entries().len(), 2);
    }

    #[test]
    fn snapshot_is_independent() {
        let nested = ObjectRef::sequence([1]);
        let c = ReactiveContainer::new(Value::mapping([("n", nested.clone())]));
        let snap = c.snapshot();

        nested.push(2);
        assert!(!structural_equals(&snap, &Value::mapping([("n", nested)])));
        assert!(structural_equals(
            &snap,
            &Value::mapping([("n", Value::sequence([1]))])
        ));
    }

    #[test]
    fn snapshot_keeps_class() {
        let point = ObjectRef::instance(Class::named("Point"), [("x", 1)]);
        let c = ReactiveContainer::new(point);
        let snap = c.snapshot();
        assert_eq!(snap.as_object().unwrap().class(), Class::named("Point"));
    }

    #[test]
    fn snapshot_keeps_sequence_class() {
        let tuple = ObjectRef::new(
            Class::named("Tuple"),
            Shape::Sequence(vec![Value::from(1), Value::from("a")]),
        );
        let c = ReactiveContainer::new(tuple.clone());
        assert_eq!(c.kind(), ContainerKind::Sequence);

        let snap = c.snapshot();
        assert_eq!(snap.as_object().unwrap().class(), Class::named("Tuple"));
        assert!(structural_equals(&snap, &Value::Object(tuple)));
    }

    #[test]
    fn weak_handle() {
        let c = ReactiveContainer::mapping();
        let weak = c.downgrade();
        assert!(weak.upgrade().is_some_and(|u| u.ptr_eq(&c)));
        drop(c);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn json_seed() {
        let c = ReactiveContainer::new(serde_json::json!({"a": [1, 2], "b": "s"}));
        assert_eq!(c.get("b").as_str(), Some("s"));
        assert_eq!(c.len(), 2);
    }
}
