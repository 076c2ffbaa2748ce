//! Named subscription handles.
//!
//! A [`SubHandle`] owns one subscription's lifecycle: its id, name and
//! parameters, plus the ready/error notifications the server routes back
//! by id. Dropping the handle only unregisters its message listener;
//! server-side teardown is a separate, explicit [`SubHandle::unsub`] call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::warn;

use ddp_core::random_id;
use ddp_protocol::{ClientFrame, DdpMessage, NosubPayload, ReadyPayload, RemoteError};

use crate::error::{ClientError, ClientResult};
use crate::signal::{HandlerId, Signal};
use crate::transport::Transport;

/// Notification channels of one subscription.
#[derive(Default)]
pub struct SubEvents {
    ready: Signal<()>,
    nosub: Signal<Option<RemoteError>>,
}

impl SubEvents {
    /// Fired when the server marks this subscription ready.
    pub fn ready(&self) -> &Signal<()> {
        &self.ready
    }

    /// Fired when the server stops or rejects this subscription; the
    /// payload is the server's error, if it reported one.
    pub fn nosub(&self) -> &Signal<Option<RemoteError>> {
        &self.nosub
    }
}

struct SubInner {
    transport: Arc<dyn Transport>,
    id: String,
    name: String,
    params: Vec<Value>,
    ready: AtomicBool,
    events: SubEvents,
}

impl SubInner {
    fn dispatch(&self, message: &DdpMessage) {
        match message.msg.as_str() {
            "nosub" => match message.decode::<NosubPayload>() {
                Ok(payload) if payload.id == self.id => {
                    self.events.nosub.emit(&payload.error);
                }
                Ok(_) => {}
                Err(error) => warn!(error = %error, "dropping undecodable nosub frame"),
            },
            "ready" => match message.decode::<ReadyPayload>() {
                Ok(payload) if payload.subs.iter().any(|sub| *sub == self.id) => {
                    self.ready.store(true, Ordering::SeqCst);
                    self.events.ready.emit(&());
                }
                Ok(_) => {}
                Err(error) => warn!(error = %error, "dropping undecodable ready frame"),
            },
            _ => {}
        }
    }
}

/// Handle to one named, parameterized subscription.
pub struct SubHandle {
    inner: Arc<SubInner>,
    handler: HandlerId,
}

impl SubHandle {
    pub(crate) fn attach(transport: Arc<dyn Transport>, name: &str, params: Vec<Value>) -> Self {
        let inner = Arc::new(SubInner {
            transport: Arc::clone(&transport),
            id: random_id(),
            name: name.to_string(),
            params,
            ready: AtomicBool::new(false),
            events: SubEvents::default(),
        });

        let weak: Weak<SubInner> = Arc::downgrade(&inner);
        let handler = transport.events().message().connect(move |message| {
            if let Some(inner) = weak.upgrade() {
                inner.dispatch(message);
            }
        });

        Self { inner, handler }
    }

    /// This subscription's connection-unique id.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The publication name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The subscription parameters.
    pub fn params(&self) -> &[Value] {
        &self.inner.params
    }

    /// Whether the server has marked this subscription ready.
    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    /// This subscription's notification channels.
    pub fn events(&self) -> &SubEvents {
        &self.inner.events
    }

    /// Sends the `sub` frame.
    ///
    /// # Errors
    ///
    /// Fails synchronously with [`ClientError::NotAlive`] when the
    /// transport reports itself dead; the request is not queued.
    pub fn sub(&self) -> ClientResult<()> {
        if !self.inner.transport.is_alive() {
            return Err(ClientError::NotAlive);
        }
        self.inner.transport.send_json(&ClientFrame::sub(
            self.inner.id.clone(),
            self.inner.name.clone(),
            self.inner.params.clone(),
        ))
    }

    /// Sends the `unsub` frame. Same liveness precondition as [`SubHandle::sub`].
    pub fn unsub(&self) -> ClientResult<()> {
        if !self.inner.transport.is_alive() {
            return Err(ClientError::NotAlive);
        }
        self.inner
            .transport
            .send_json(&ClientFrame::unsub(self.inner.id.clone()))
    }
}

impl Drop for SubHandle {
    fn drop(&mut self) {
        self.inner.transport.events().message().disconnect(self.handler);
    }
}
