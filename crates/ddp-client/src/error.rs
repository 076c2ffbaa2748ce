//! Client error types.

use thiserror::Error;

use ddp_protocol::ProtocolError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the protocol engine's public operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport reports itself dead; the caller must reconnect before
    /// issuing sub/unsub traffic.
    #[error("the DDP connection is not alive")]
    NotAlive,

    /// The transport failed to accept an outbound frame.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A wire frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A collection already has a router bound to a different document type.
    #[error("collection {collection:?} already has a subscriber with a different document type")]
    SubscriberTypeMismatch {
        /// The contested collection name.
        collection: String,
    },
}
