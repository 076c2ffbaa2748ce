//! The DDP protocol engine.
//!
//! This crate drives the DDP wire protocol over an abstract [`Transport`]:
//! the connection handshake, correlated method calls, named subscriptions
//! and per-collection diff fan-out. It performs no socket I/O of its own;
//! a transport implementation surfaces its traffic through
//! [`TransportEvents`] and the engine reacts.
//!
//! # Overview
//!
//! - [`DdpConnection`]: the engine. Handshake state machine, method
//!   correlation, heartbeat responder, login sugar, and the factory for
//!   subscription handles and collection routers.
//! - [`SubHandle`]: one named, parameterized subscription and its
//!   ready/nosub notifications.
//! - [`CollectionSubscriber`]: the shared per-collection diff router,
//!   fanning added/changed/removed/ordering events out to a primary
//!   [`Signal`] and attached [`CollectionListener`]s.
//!
//! All notifications are delivered synchronously on the dispatch path, in
//! arrival order; no operation blocks on network I/O.

mod calls;
mod collection;
mod connection;
mod error;
mod login;
mod signal;
mod subscription;
mod transport;

#[cfg(test)]
mod testing;

pub use calls::{MethodError, MethodResult};
pub use collection::{
    CollectionEvents, CollectionListener, CollectionSubscriber, ListenerId,
};
pub use connection::{
    ConnectionEvents, ConnectionState, DdpConnection, HandshakeOutcome, LoginEvent,
};
pub use error::{ClientError, ClientResult};
pub use login::{LoginResponse, PasswordDigest, PasswordLogin, ResumeLogin, UserSelector};
pub use signal::{HandlerId, Signal};
pub use subscription::{SubEvents, SubHandle};
pub use transport::{Transport, TransportError, TransportEvents};
