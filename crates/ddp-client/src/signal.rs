//! Observer registries.
//!
//! [`Signal`] is the notification primitive every component in this crate
//! hangs its events on: an ordered registry of handlers, each identified by
//! the [`HandlerId`] returned at registration. Emission runs against a
//! snapshot of the registry taken up front, so a handler may disconnect
//! itself (or any other handler) from within its own invocation; the
//! removal takes effect on the next emit.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Identifies one registered handler within one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registry<E> {
    next_id: u64,
    handlers: Vec<(HandlerId, Arc<dyn Fn(&E) + Send + Sync>)>,
}

/// An ordered registry of `Fn(&E)` handlers.
///
/// Cloning a signal clones a handle to the same registry.
pub struct Signal<E> {
    inner: Arc<Mutex<Registry<E>>>,
}

impl<E> Clone for Signal<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Signal<E> {
    /// Creates an empty signal.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Registers a handler; it stays connected until disconnected.
    pub fn connect(&self, handler: impl Fn(&E) + Send + Sync + 'static) -> HandlerId {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = HandlerId(registry.next_id);
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(handler)));
        id
    }

    /// Registers a handler that detaches itself after its first delivery.
    pub fn connect_once(&self, handler: impl FnOnce(&E) + Send + 'static) -> HandlerId
    where
        E: 'static,
    {
        let slot: Mutex<Option<Box<dyn FnOnce(&E) + Send>>> = Mutex::new(Some(Box::new(handler)));
        let own_id: Arc<OnceLock<HandlerId>> = Arc::new(OnceLock::new());
        let signal = self.clone();
        let id_cell = Arc::clone(&own_id);
        let id = self.connect(move |event| {
            let taken = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(handler) = taken {
                handler(event);
            }
            if let Some(id) = id_cell.get() {
                signal.disconnect(*id);
            }
        });
        let _ = own_id.set(id);
        id
    }

    /// Removes a handler. Returns whether it was still connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.handlers.len();
        registry.handlers.retain(|(handler_id, _)| *handler_id != id);
        registry.handlers.len() != before
    }

    /// Delivers `event` to every handler connected at the time of the call.
    ///
    /// The registry lock is not held while handlers run, so handlers are
    /// free to connect or disconnect.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Arc<dyn Fn(&E) + Send + Sync>> = {
            let registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .handlers
                .iter()
                .map(|(_, handler)| Arc::clone(handler))
                .collect()
        };
        for handler in snapshot {
            (*handler)(event);
        }
    }

    /// Number of currently connected handlers.
    pub fn handler_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .len()
    }
}
