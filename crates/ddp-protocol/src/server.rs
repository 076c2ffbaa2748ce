//! Typed models for inbound frame bodies.
//!
//! These are decoded on demand from a [`DdpMessage`](crate::DdpMessage)
//! body by the component that dispatches on the frame; unknown body fields
//! (including the `msg` discriminator itself) are ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::error::RemoteError;

/// Body of a `connected` frame: the handshake succeeded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectedPayload {
    /// Server-assigned session identifier.
    pub session: String,
}

/// Body of a `failed` frame: the server rejected the requested version.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FailedPayload {
    /// The version the server offers instead.
    pub version: String,
}

/// Body of a `result` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultPayload {
    /// Correlation id of the method call being answered.
    pub id: String,

    /// Application error, mutually exclusive with `result`.
    #[serde(default)]
    pub error: Option<RemoteError>,

    /// Method return value; absent for methods that return nothing.
    #[serde(default)]
    pub result: Option<Value>,
}

/// Body of a `nosub` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NosubPayload {
    /// The subscription that was stopped or rejected.
    pub id: String,

    /// Present when the subscription was rejected rather than stopped.
    #[serde(default)]
    pub error: Option<RemoteError>,
}

/// Body of a `ready` frame: the listed subscriptions have delivered their
/// initial data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadyPayload {
    /// Ids of the subscriptions now ready.
    pub subs: Vec<String>,
}

/// Body of a `ping` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PingPayload {
    /// Optional id the answering `pong` must echo.
    #[serde(default)]
    pub id: Option<String>,
}

/// Body of a `pong` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PongPayload {
    /// Id of the ping being answered, if it carried one.
    #[serde(default)]
    pub id: Option<String>,
}

/// Body of an `added` frame: a document entered the collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned + Default"))]
pub struct AddedEvent<T> {
    /// The document's id; authoritative over any id inside `fields`.
    pub id: String,
    /// The collection the document belongs to.
    pub collection: String,
    /// The decoded document.
    #[serde(default)]
    pub fields: T,
}

/// Body of a `changed` frame: some of a document's fields were updated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned + Default"))]
pub struct ChangedEvent<T> {
    /// The changed document's id.
    pub id: String,
    /// The collection the document belongs to.
    pub collection: String,
    /// The changed fields, decoded as a partial document.
    #[serde(default)]
    pub fields: T,
}

/// Body of a `removed` frame: a document left the collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemovedEvent {
    /// The removed document's id.
    pub id: String,
    /// The collection the document belonged to.
    pub collection: String,
}

/// Body of an `addedBefore` frame: an ordered insert.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned + Default"))]
pub struct AddedBeforeEvent<T> {
    /// The document's id; authoritative over any id inside `fields`.
    pub id: String,
    /// The collection the document belongs to.
    pub collection: String,
    /// The decoded document.
    #[serde(default)]
    pub fields: T,
    /// Insert before this document; `None` means end of list.
    #[serde(default)]
    pub before: Option<String>,
}

/// Body of a `movedBefore` frame: an ordered move.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovedBeforeEvent {
    /// The moved document's id.
    pub id: String,
    /// The collection the document belongs to.
    pub collection: String,
    /// Move before this document; `None` means end of list.
    #[serde(default)]
    pub before: Option<String>,
}
