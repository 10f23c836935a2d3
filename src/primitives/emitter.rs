// ============================================================================
// objekt - Emitter
// Synchronous multicast subscriptions
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::core::constants::EVENT_ANY;

// =============================================================================
// HANDLER
// =============================================================================

/// A shared event callback.
///
/// Handlers are compared by identity, so keep a clone of the one passed to
/// `on` in order to `off` it later.
pub struct Handler<E>(Rc<dyn Fn(&E)>);

impl<E> Handler<E> {
    pub fn new(f: impl Fn(&E) + 'static) -> Self {
        Handler(Rc::new(f))
    }

    pub fn call(&self, event: &E) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Handler<E>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<E> Clone for Handler<E> {
    fn clone(&self) -> Self {
        Handler(self.0.clone())
    }
}

impl<E, F> From<F> for Handler<E>
where
    F: Fn(&E) + 'static,
{
    fn from(f: F) -> Self {
        Handler::new(f)
    }
}

impl<E> fmt::Debug for Handler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

// =============================================================================
// EMITTER
// =============================================================================

struct Listener<E> {
    name: String,
    handler: Handler<E>,
    once: bool,
}

/// Named multicast subscriptions.
///
/// `emit(name, event)` calls, in subscription order, every handler registered
/// under `name` or under the wildcard `"*"`. Handlers may subscribe,
/// unsubscribe, or emit again while being called; those changes take effect
/// from the next `emit`.
pub struct Emitter<E> {
    listeners: RefCell<Vec<Listener<E>>>,
}

impl<E> Emitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe `handler` to `name`.
    pub fn on(&self, name: &str, handler: impl Into<Handler<E>>) -> &Self {
        self.subscribe(name, handler.into(), false);
        self
    }

    /// Subscribe `handler` to the next `name` event only.
    pub fn once(&self, name: &str, handler: impl Into<Handler<E>>) -> &Self {
        self.subscribe(name, handler.into(), true);
        self
    }

    /// Remove every subscription of `handler` under `name`.
    pub fn off(&self, name: &str, handler: &Handler<E>) -> &Self {
        self.listeners
            .borrow_mut()
            .retain(|l| !(l.name == name && l.handler.ptr_eq(handler)));
        self
    }

    /// Deliver `event` to every matching handler. Returns how many ran.
    pub fn emit(&self, name: &str, event: &E) -> usize {
        // Snapshot first so handlers can touch the listener list; one-shot
        // listeners are dropped before anyone runs.
        let handlers: Vec<Handler<E>> = {
            let mut listeners = self.listeners.borrow_mut();
            let matched: Vec<Handler<E>> = listeners
                .iter()
                .filter(|l| l.name == name || l.name == EVENT_ANY)
                .map(|l| l.handler.clone())
                .collect();
            listeners.retain(|l| !(l.once && (l.name == name || l.name == EVENT_ANY)));
            matched
        };

        trace!(event = name, handlers = handlers.len(), "emit");

        for handler in &handlers {
            handler.call(event);
        }
        handlers.len()
    }

    /// Number of subscriptions registered under exactly `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.name == name)
            .count()
    }

    fn subscribe(&self, name: &str, handler: Handler<E>, once: bool) {
        self.listeners.borrow_mut().push(Listener {
            name: name.to_string(),
            handler,
            once,
        });
    }
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
