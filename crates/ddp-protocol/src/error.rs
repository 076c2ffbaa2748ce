//! Protocol error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding wire frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// An inbound text frame was not valid JSON.
    #[error("frame is not valid JSON: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    /// A frame body did not match the expected payload shape.
    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(#[source] serde_json::Error),

    /// Failed to serialize an outbound frame.
    #[error("failed to serialize frame: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// A server-reported error, attached to `result` and `nosub` frames.
///
/// The `error` code is a string or a number depending on the server, so it
/// is kept as a raw JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Machine-readable error code.
    #[serde(default)]
    pub error: Value,

    /// Short human-readable explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Full message, typically `reason` prefixed with the error source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Error class reported by the server (e.g. `Meteor.Error`).
    #[serde(rename = "errorType", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server error")?;
        match self.error.as_str() {
            Some(code) => write!(f, " {code}")?,
            None if !self.error.is_null() => write!(f, " {}", self.error)?,
            None => {}
        }
        if let Some(reason) = self.reason.as_deref().or(self.message.as_deref()) {
            write!(f, ": {reason}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteError {}
