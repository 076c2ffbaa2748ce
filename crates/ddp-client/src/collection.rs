//! The collection diff router.
//!
//! One [`CollectionSubscriber`] exists per collection name, shared by
//! every consumer of that collection. It watches the transport's message
//! signal, ignores frames for other collections, decodes the matching
//! diff events into the consumer's document type and fans each event out:
//! first on the primary signal, then to every attached secondary listener
//! in registration order.
//!
//! The router is a pure relay. It keeps no ordered local list; consumers
//! wanting a materialized ordered collection apply the `before` hints of
//! `addedBefore`/`movedBefore` themselves.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use ddp_protocol::{
    AddedBeforeEvent, AddedEvent, ChangedEvent, DdpDocument, DdpMessage, MovedBeforeEvent,
    RemovedEvent,
};

use crate::signal::Signal;
use crate::transport::TransportEvents;

/// A secondary event sink attached to a collection router.
///
/// All callbacks default to no-ops so a sink only implements the events it
/// cares about.
#[allow(unused_variables)]
pub trait CollectionListener<T: DdpDocument>: Send + Sync {
    /// A document entered the collection.
    fn added(&self, event: &AddedEvent<T>) {}

    /// Some of a document's fields changed.
    fn changed(&self, event: &ChangedEvent<T>) {}

    /// A document left the collection.
    fn removed(&self, event: &RemovedEvent) {}

    /// A document entered the collection at a specific position.
    fn added_before(&self, event: &AddedBeforeEvent<T>) {}

    /// A document moved to a specific position.
    fn moved_before(&self, event: &MovedBeforeEvent) {}
}

/// Identifies one attached listener within one router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The primary notification channels of a collection router.
pub struct CollectionEvents<T> {
    added: Signal<AddedEvent<T>>,
    changed: Signal<ChangedEvent<T>>,
    removed: Signal<RemovedEvent>,
    added_before: Signal<AddedBeforeEvent<T>>,
    moved_before: Signal<MovedBeforeEvent>,
}

impl<T> Default for CollectionEvents<T> {
    fn default() -> Self {
        Self {
            added: Signal::new(),
            changed: Signal::new(),
            removed: Signal::new(),
            added_before: Signal::new(),
            moved_before: Signal::new(),
        }
    }
}

impl<T> CollectionEvents<T> {
    /// Added events.
    pub fn added(&self) -> &Signal<AddedEvent<T>> {
        &self.added
    }

    /// Changed events.
    pub fn changed(&self) -> &Signal<ChangedEvent<T>> {
        &self.changed
    }

    /// Removed events.
    pub fn removed(&self) -> &Signal<RemovedEvent> {
        &self.removed
    }

    /// Ordered-insert events.
    pub fn added_before(&self) -> &Signal<AddedBeforeEvent<T>> {
        &self.added_before
    }

    /// Ordered-move events.
    pub fn moved_before(&self) -> &Signal<MovedBeforeEvent> {
        &self.moved_before
    }
}

struct ListenerSet<T: DdpDocument> {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<dyn CollectionListener<T>>)>,
}

/// The shared diff router for one collection.
pub struct CollectionSubscriber<T: DdpDocument> {
    collection: String,
    events: CollectionEvents<T>,
    listeners: Mutex<ListenerSet<T>>,
}

impl<T: DdpDocument> CollectionSubscriber<T> {
    /// Creates the router and hooks it onto the transport's message signal.
    pub(crate) fn attach(collection: &str, transport_events: &TransportEvents) -> Arc<Self> {
        let subscriber = Arc::new(Self {
            collection: collection.to_string(),
            events: CollectionEvents::default(),
            listeners: Mutex::new(ListenerSet {
                next_id: 0,
                entries: Vec::new(),
            }),
        });

        let weak = Arc::downgrade(&subscriber);
        transport_events.message().connect(move |message| {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.dispatch(message);
            }
        });

        subscriber
    }

    /// The collection this router serves.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The router's primary notification channels.
    pub fn events(&self) -> &CollectionEvents<T> {
        &self.events
    }

    /// Attaches a secondary listener; listeners are invoked in attach order.
    pub fn attach_listener(&self, listener: Arc<dyn CollectionListener<T>>) -> ListenerId {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, listener));
        id
    }

    /// Detaches one listener. Returns whether it was still attached.
    pub fn detach_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.entries.len();
        listeners.entries.retain(|(listener_id, _)| *listener_id != id);
        listeners.entries.len() != before
    }

    fn listener_snapshot(&self) -> Vec<Arc<dyn CollectionListener<T>>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    fn dispatch(&self, message: &DdpMessage) {
        if message.collection() != Some(self.collection.as_str()) {
            return;
        }

        match message.msg.as_str() {
            "added" => match message.decode::<AddedEvent<T>>() {
                Ok(mut event) => {
                    // The envelope id is authoritative over whatever the
                    // fields object carried.
                    event.fields.set_id(event.id.clone());
                    self.events.added.emit(&event);
                    for listener in self.listener_snapshot() {
                        listener.added(&event);
                    }
                }
                Err(error) => self.drop_frame("added", &error),
            },
            "changed" => match message.decode::<ChangedEvent<T>>() {
                Ok(event) => {
                    self.events.changed.emit(&event);
                    for listener in self.listener_snapshot() {
                        listener.changed(&event);
                    }
                }
                Err(error) => self.drop_frame("changed", &error),
            },
            "removed" => match message.decode::<RemovedEvent>() {
                Ok(event) => {
                    self.events.removed.emit(&event);
                    for listener in self.listener_snapshot() {
                        listener.removed(&event);
                    }
                }
                Err(error) => self.drop_frame("removed", &error),
            },
            "addedBefore" => match message.decode::<AddedBeforeEvent<T>>() {
                Ok(mut event) => {
                    event.fields.set_id(event.id.clone());
                    self.events.added_before.emit(&event);
                    for listener in self.listener_snapshot() {
                        listener.added_before(&event);
                    }
                }
                Err(error) => self.drop_frame("addedBefore", &error),
            },
            "movedBefore" => match message.decode::<MovedBeforeEvent>() {
                Ok(event) => {
                    self.events.moved_before.emit(&event);
                    for listener in self.listener_snapshot() {
                        listener.moved_before(&event);
                    }
                }
                Err(error) => self.drop_frame("movedBefore", &error),
            },
            _ => {}
        }
    }

    fn drop_frame(&self, msg: &str, error: &ddp_protocol::ProtocolError) {
        warn!(
            collection = %self.collection,
            msg,
            error = %error,
            "dropping undecodable collection frame"
        );
    }
}
