//! The connection engine.
//!
//! [`DdpConnection`] is the composition root: it owns the handshake state
//! machine, the method correlation table, the heartbeat responder and the
//! login sugar, and it is the factory for subscription handles and
//! collection routers. All inbound traffic arrives through the
//! transport's single message signal and is dispatched by frame type from
//! one place.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use ddp_core::random_id;
use ddp_protocol::{
    ClientFrame, ConnectedPayload, DdpDocument, DdpMessage, FailedPayload, PingPayload,
    PongPayload, ProtocolError, ResultPayload,
};

use crate::calls::{MethodError, MethodResult, PendingCalls, decode_result};
use crate::collection::CollectionSubscriber;
use crate::error::{ClientError, ClientResult};
use crate::login::{LOGIN_METHOD, LoginResponse, PasswordLogin, ResumeLogin};
use crate::signal::{HandlerId, Signal};
use crate::subscription::SubHandle;
use crate::transport::Transport;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No handshake in progress.
    Disconnected,
    /// Handshake sent or about to be sent; awaiting `connected`/`failed`.
    Connecting,
    /// Handshake accepted; a session is established.
    Connected,
    /// The server rejected the requested protocol version.
    Failed,
}

/// Resolution of the version handshake.
///
/// Exactly one of a session id or the server's version counter-offer, by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub enum HandshakeOutcome {
    /// The server accepted; traffic may flow.
    Connected {
        /// Server-assigned session identifier.
        session: String,
    },
    /// The server rejected the requested version.
    Failed {
        /// The version the server offers instead.
        version: String,
    },
}

impl HandshakeOutcome {
    /// The session id, when the handshake succeeded.
    pub fn session(&self) -> Option<&str> {
        match self {
            Self::Connected { session } => Some(session),
            Self::Failed { .. } => None,
        }
    }

    /// The server's counter-offered version, when the handshake failed.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Connected { .. } => None,
            Self::Failed { version } => Some(version),
        }
    }
}

/// Payload of the login notification.
pub type LoginEvent = MethodResult<LoginResponse>;

/// The engine's notification channels.
#[derive(Default)]
pub struct ConnectionEvents {
    opened: Signal<()>,
    connected: Signal<HandshakeOutcome>,
    ping: Signal<PingPayload>,
    pong: Signal<PongPayload>,
    login: Signal<LoginEvent>,
}

impl ConnectionEvents {
    /// Fired after the handshake frame has been handed to the transport.
    pub fn opened(&self) -> &Signal<()> {
        &self.opened
    }

    /// Fired once the handshake resolves, either way.
    pub fn connected(&self) -> &Signal<HandshakeOutcome> {
        &self.connected
    }

    /// Fired for every inbound ping, after the pong echo.
    pub fn ping(&self) -> &Signal<PingPayload> {
        &self.ping
    }

    /// Fired for every inbound pong; the engine takes no protocol action.
    pub fn pong(&self) -> &Signal<PongPayload> {
        &self.pong
    }

    /// Fired when a login call resolves.
    pub fn login(&self) -> &Signal<LoginEvent> {
        &self.login
    }
}

type IdGenerator = Box<dyn Fn() -> String + Send>;

struct ConnectionInner {
    transport: Arc<dyn Transport>,
    state: Mutex<ConnectionState>,
    pending: PendingCalls,
    routers: Mutex<HashMap<String, Box<dyn Any + Send + Sync>>>,
    id_generator: Mutex<IdGenerator>,
    events: ConnectionEvents,
}

/// A DDP client connection over an abstract transport.
pub struct DdpConnection {
    inner: Arc<ConnectionInner>,
    message_handler: HandlerId,
    closed_handler: HandlerId,
}

impl DdpConnection {
    /// Wires the engine onto a transport's notification channels.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let inner = Arc::new(ConnectionInner {
            transport: Arc::clone(&transport),
            state: Mutex::new(ConnectionState::Disconnected),
            pending: PendingCalls::new(),
            routers: Mutex::new(HashMap::new()),
            id_generator: Mutex::new(Box::new(random_id) as IdGenerator),
            events: ConnectionEvents::default(),
        });

        let weak: Weak<ConnectionInner> = Arc::downgrade(&inner);
        let message_handler = transport.events().message().connect(move |message| {
            if let Some(inner) = weak.upgrade() {
                inner.dispatch(message);
            }
        });

        let weak: Weak<ConnectionInner> = Arc::downgrade(&inner);
        let closed_handler = transport.events().closed().connect(move |()| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_closed();
            }
        });

        Self {
            inner,
            message_handler,
            closed_handler,
        }
    }

    /// The engine's notification channels.
    pub fn events(&self) -> &ConnectionEvents {
        &self.inner.events
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.lock_state()
    }

    /// Replaces the correlation-id generator.
    ///
    /// The seam for deterministic tests; the default generator produces
    /// random connection-unique ids.
    pub fn set_id_generator(&self, generator: impl Fn() -> String + Send + 'static) {
        *self
            .inner
            .id_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Box::new(generator);
    }

    /// Instructs the transport to open `url` and schedules the handshake.
    ///
    /// No DDP traffic is sent until the transport signals `opened`; at
    /// that point the engine sends exactly one handshake frame and raises
    /// the local `opened` notification.
    pub fn connect(&self, url: &str) -> ClientResult<()> {
        *self.inner.lock_state() = ConnectionState::Connecting;

        let weak = Arc::downgrade(&self.inner);
        self.inner.transport.events().opened().connect_once(move |()| {
            if let Some(inner) = weak.upgrade() {
                inner.send_handshake();
            }
        });

        self.inner.transport.connect(url)
    }

    /// Closes the transport.
    pub fn close(&self) {
        self.inner.transport.close();
    }

    /// Fire-and-forget method invocation; returns the correlation id.
    ///
    /// No completion is tracked; any eventual `result` frame for this id
    /// is dropped.
    pub fn call_method(&self, method: &str, params: Vec<Value>) -> ClientResult<String> {
        let id = self.inner.next_id();
        debug!(id = %id, method, "sending method call");
        self.inner
            .transport
            .send_json(&ClientFrame::method(id.clone(), method, params))?;
        Ok(id)
    }

    /// Tracked method invocation; returns the correlation id.
    ///
    /// The completion receives exactly one of a decoded result or an
    /// error, once the matching `result` frame arrives or the connection
    /// is torn down. An absent result decodes to `T::default()`.
    pub fn call<T, F>(&self, method: &str, params: Vec<Value>, completion: F) -> ClientResult<String>
    where
        T: DeserializeOwned + Default,
        F: FnOnce(MethodResult<T>) + Send + 'static,
    {
        let id = self.inner.next_id();
        // Registration must happen before the frame reaches the transport,
        // so a synchronous same-thread echo still finds the entry.
        self.inner.pending.register(
            &id,
            Box::new(move |outcome| completion(outcome.and_then(decode_result::<T>))),
        );

        debug!(id = %id, method, "sending tracked method call");
        let frame = ClientFrame::method(id.clone(), method, params);
        if let Err(error) = self.inner.transport.send_json(&frame) {
            self.inner.pending.discard(&id);
            return Err(error);
        }
        Ok(id)
    }

    /// Sends a ping, with or without an id. Purely outbound.
    pub fn ping_server(&self, id: Option<&str>) -> ClientResult<()> {
        self.inner
            .transport
            .send_json(&ClientFrame::ping(id.map(str::to_string)))
    }

    /// Logs in with an email address and password.
    ///
    /// The password is hashed before transmission; the resolution arrives
    /// on the `login` notification. Returns the method's correlation id.
    pub fn login_with_email(&self, email: &str, password: &str) -> ClientResult<String> {
        self.login(&PasswordLogin::email(email, password))
    }

    /// Logs in with a username and password.
    pub fn login_with_username(&self, username: &str, password: &str) -> ClientResult<String> {
        self.login(&PasswordLogin::username(username, password))
    }

    /// Resumes a session with a previously issued token.
    pub fn login_with_token(&self, token: &str) -> ClientResult<String> {
        self.login(&ResumeLogin::new(token))
    }

    fn login(&self, credentials: &impl Serialize) -> ClientResult<String> {
        let payload = serde_json::to_value(credentials).map_err(ProtocolError::Serialization)?;
        let weak = Arc::downgrade(&self.inner);
        self.call(
            LOGIN_METHOD,
            vec![payload],
            move |outcome: MethodResult<LoginResponse>| {
                if let Some(inner) = weak.upgrade() {
                    inner.events.login.emit(&outcome);
                }
            },
        )
    }

    /// Returns the shared diff router for `collection`, creating it on
    /// first request.
    ///
    /// # Errors
    ///
    /// Fails when the collection already has a router bound to a different
    /// document type.
    pub fn get_subscriber<T: DdpDocument>(
        &self,
        collection: &str,
    ) -> ClientResult<Arc<CollectionSubscriber<T>>> {
        let mut routers = self
            .inner
            .routers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = routers.get(collection) {
            return existing
                .downcast_ref::<Arc<CollectionSubscriber<T>>>()
                .cloned()
                .ok_or_else(|| ClientError::SubscriberTypeMismatch {
                    collection: collection.to_string(),
                });
        }

        let subscriber = CollectionSubscriber::<T>::attach(collection, self.inner.transport.events());
        routers.insert(collection.to_string(), Box::new(Arc::clone(&subscriber)));
        Ok(subscriber)
    }

    /// Creates a handle for a named, parameterized subscription.
    ///
    /// The handle only listens; sending the `sub` frame is its caller's
    /// explicit [`SubHandle::sub`] call.
    pub fn subscribe(&self, name: &str, params: Vec<Value>) -> SubHandle {
        SubHandle::attach(Arc::clone(&self.inner.transport), name, params)
    }
}

impl Drop for DdpConnection {
    fn drop(&mut self) {
        let events = self.inner.transport.events();
        events.message().disconnect(self.message_handler);
        events.closed().disconnect(self.closed_handler);
    }
}

impl ConnectionInner {
    fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> String {
        let generator = self
            .id_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        (*generator)()
    }

    fn send_handshake(&self) {
        if let Err(error) = self.transport.send_json(&ClientFrame::connect()) {
            warn!(error = %error, "failed to send handshake frame");
            return;
        }
        self.events.opened.emit(&());
    }

    fn dispatch(&self, message: &DdpMessage) {
        match message.msg.as_str() {
            "connected" | "failed" => self.handle_handshake(message),
            "result" => self.handle_result(message),
            "ping" => self.handle_ping(message),
            "pong" => self.handle_pong(message),
            // sub/collection frames are handled by their own listeners.
            _ => {}
        }
    }

    fn handle_handshake(&self, message: &DdpMessage) {
        let outcome = if message.msg == "connected" {
            match message.decode::<ConnectedPayload>() {
                Ok(payload) => HandshakeOutcome::Connected {
                    session: payload.session,
                },
                Err(error) => {
                    warn!(error = %error, "dropping undecodable connected frame");
                    return;
                }
            }
        } else {
            match message.decode::<FailedPayload>() {
                Ok(payload) => HandshakeOutcome::Failed {
                    version: payload.version,
                },
                Err(error) => {
                    warn!(error = %error, "dropping undecodable failed frame");
                    return;
                }
            }
        };

        {
            let mut state = self.lock_state();
            if *state != ConnectionState::Connecting {
                trace!(msg = %message.msg, "ignoring handshake frame outside a handshake");
                return;
            }
            *state = match outcome {
                HandshakeOutcome::Connected { .. } => ConnectionState::Connected,
                HandshakeOutcome::Failed { .. } => ConnectionState::Failed,
            };
        }

        self.events.connected.emit(&outcome);
    }

    fn handle_result(&self, message: &DdpMessage) {
        let payload: ResultPayload = match message.decode() {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, "dropping undecodable result frame");
                return;
            }
        };

        // No match means a stale or duplicate response; dropping it is the
        // contract, not an error.
        let Some(completion) = self.pending.take(&payload.id) else {
            debug!(id = %payload.id, "dropping result with no matching pending call");
            return;
        };

        let outcome = match payload.error {
            Some(error) => Err(MethodError::Remote(error)),
            None => Ok(payload.result.unwrap_or(Value::Null)),
        };
        completion(outcome);
    }

    fn handle_ping(&self, message: &DdpMessage) {
        let payload: PingPayload = match message.decode() {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, "dropping undecodable ping frame");
                return;
            }
        };

        if let Err(error) = self.transport.send_json(&ClientFrame::pong(payload.id.clone())) {
            warn!(error = %error, "failed to answer ping");
        }
        self.events.ping.emit(&payload);
    }

    fn handle_pong(&self, message: &DdpMessage) {
        match message.decode::<PongPayload>() {
            Ok(payload) => self.events.pong.emit(&payload),
            Err(error) => warn!(error = %error, "dropping undecodable pong frame"),
        }
    }

    fn handle_closed(&self) {
        *self.lock_state() = ConnectionState::Disconnected;
        self.pending.fail_all(|| MethodError::ConnectionLost);
    }
}
