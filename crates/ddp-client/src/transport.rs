//! The transport contract.
//!
//! The engine never touches a socket itself: it talks to a [`Transport`],
//! which owns the physical connection (framing, TLS, reconnection policy)
//! and surfaces four observable notifications through [`TransportEvents`].
//! A transport implementation feeds every raw inbound payload to
//! [`TransportEvents::dispatch_raw`], which synthesizes the `message`
//! notification by extracting the `msg` discriminator and skipping any
//! payload lacking one.

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use ddp_protocol::{DdpMessage, ProtocolError};

use crate::error::ClientResult;
use crate::signal::Signal;

/// A failure reported by the transport or by inbound frame parsing.
#[derive(Debug, Clone, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    /// Human-readable description.
    pub message: String,
}

impl TransportError {
    /// Creates a transport error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The observable notifications a transport must surface.
#[derive(Default)]
pub struct TransportEvents {
    opened: Signal<()>,
    closed: Signal<()>,
    errored: Signal<TransportError>,
    message: Signal<DdpMessage>,
}

impl TransportEvents {
    /// Creates the event set; one per transport instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fired once the socket is open and ready for traffic.
    pub fn opened(&self) -> &Signal<()> {
        &self.opened
    }

    /// Fired when the socket closes, cleanly or not.
    pub fn closed(&self) -> &Signal<()> {
        &self.closed
    }

    /// Fired on transport-level failures, including unparseable frames.
    pub fn errored(&self) -> &Signal<TransportError> {
        &self.errored
    }

    /// Fired once per inbound DDP message, in arrival order.
    pub fn message(&self) -> &Signal<DdpMessage> {
        &self.message
    }

    /// Feeds one raw inbound payload through the discriminator filter.
    ///
    /// Payloads without a `msg` field are not DDP traffic and are skipped;
    /// payloads that are not valid JSON surface on the `errored` signal.
    pub fn dispatch_raw(&self, raw: &str) {
        match DdpMessage::parse(raw) {
            Ok(Some(message)) => self.message.emit(&message),
            Ok(None) => trace!("skipping inbound payload without msg discriminator"),
            Err(error) => self.errored.emit(&TransportError::new(error.to_string())),
        }
    }
}

/// The engine's only dependency boundary.
///
/// All operations are fire-and-forget: completion and inbound traffic are
/// signaled via [`TransportEvents`], never via return values.
pub trait Transport: Send + Sync {
    /// Instructs the transport to open a socket to `url`.
    ///
    /// Readiness is signaled later through the `opened` event.
    fn connect(&self, url: &str) -> ClientResult<()>;

    /// Closes the socket.
    fn close(&self);

    /// Whether the socket is currently usable.
    fn is_alive(&self) -> bool;

    /// Hands one text frame to the socket.
    fn send(&self, frame: &str) -> ClientResult<()>;

    /// The transport's notification channels.
    fn events(&self) -> &TransportEvents;
}

impl dyn Transport {
    /// Serializes `value` and hands the resulting text frame to [`Transport::send`].
    pub fn send_json<T: Serialize>(&self, value: &T) -> ClientResult<()> {
        let frame = serde_json::to_string(value).map_err(ProtocolError::Serialization)?;
        self.send(&frame)
    }
}
