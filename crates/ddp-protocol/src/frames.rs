//! Outbound frame vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{PROTOCOL_VERSION, SUPPORTED_VERSIONS};

/// Frames the client sends to the server.
///
/// Serializes with the DDP `msg` discriminator; optional ids are omitted
/// from the wire entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Handshake request, sent once per connection after the socket opens.
    Connect {
        /// Protocol version the client wants to speak.
        version: String,
        /// Versions the client is able to fall back to.
        support: Vec<String>,
    },

    /// Remote method invocation.
    Method {
        /// Correlation id tying the eventual `result` frame to this call.
        id: String,
        /// Method name.
        method: String,
        /// Positional arguments.
        params: Vec<Value>,
    },

    /// Start a named, parameterized subscription.
    Sub {
        /// Correlation id referenced by `ready`/`nosub` frames.
        id: String,
        /// Publication name.
        name: String,
        /// Positional arguments.
        params: Vec<Value>,
    },

    /// Stop a subscription previously started with `sub`.
    Unsub {
        /// The subscription's id.
        id: String,
    },

    /// Heartbeat probe.
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Heartbeat answer, echoing the ping's id when one was present.
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl ClientFrame {
    /// Builds the handshake frame with this client's version and support list.
    pub fn connect() -> Self {
        Self::Connect {
            version: PROTOCOL_VERSION.to_string(),
            support: SUPPORTED_VERSIONS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Builds a method frame.
    pub fn method(id: impl Into<String>, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self::Method {
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Builds a sub frame.
    pub fn sub(id: impl Into<String>, name: impl Into<String>, params: Vec<Value>) -> Self {
        Self::Sub {
            id: id.into(),
            name: name.into(),
            params,
        }
    }

    /// Builds an unsub frame.
    pub fn unsub(id: impl Into<String>) -> Self {
        Self::Unsub { id: id.into() }
    }

    /// Builds a ping frame.
    pub fn ping(id: Option<String>) -> Self {
        Self::Ping { id }
    }

    /// Builds a pong frame.
    pub fn pong(id: Option<String>) -> Self {
        Self::Pong { id }
    }
}
