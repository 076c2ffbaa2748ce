//! The inbound message envelope.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};

/// A parsed inbound frame: the `msg` discriminator plus the raw body.
///
/// The body is kept as decoded JSON rather than a typed payload because
/// different components decode the same frame differently (a `result` body
/// is decoded against whatever type the original caller registered). One
/// envelope is created per inbound frame and consumed synchronously.
#[derive(Debug, Clone, PartialEq)]
pub struct DdpMessage {
    /// The frame's message type, e.g. `"connected"` or `"added"`.
    pub msg: String,
    /// The complete frame body, including the `msg` field.
    pub body: Value,
}

impl DdpMessage {
    /// Parses a raw text frame.
    ///
    /// Returns `Ok(None)` for frames lacking a `msg` discriminator; such
    /// frames are not DDP messages and are skipped by the transport layer.
    pub fn parse(raw: &str) -> ProtocolResult<Option<Self>> {
        let body: Value = serde_json::from_str(raw).map_err(ProtocolError::MalformedFrame)?;
        let Some(msg) = body.get("msg").and_then(Value::as_str) else {
            return Ok(None);
        };
        Ok(Some(Self {
            msg: msg.to_string(),
            body,
        }))
    }

    /// Decodes the body into a typed payload.
    pub fn decode<P: DeserializeOwned>(&self) -> ProtocolResult<P> {
        serde_json::from_value(self.body.clone()).map_err(ProtocolError::UnexpectedShape)
    }

    /// Returns the frame's `collection` field, if any.
    ///
    /// Only the five collection diff messages carry one; routers use this
    /// to filter before attempting a full decode.
    pub fn collection(&self) -> Option<&str> {
        self.body.get("collection").and_then(Value::as_str)
    }
}
