//! The document constraint for collection payloads.

use serde::de::DeserializeOwned;

/// A type decodable from a collection's `fields` payload.
///
/// The same diff engine serves arbitrary collections without code
/// generation; the only requirement is that a document can expose and
/// accept its id, because the envelope's id is authoritative and
/// overwrites whatever the `fields` object carried on added events.
///
/// `Default` supplies the value used when a frame omits `fields` entirely.
///
/// ```rust
/// use ddp_protocol::DdpDocument;
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize)]
/// struct Task {
///     #[serde(default)]
///     id: String,
///     #[serde(default)]
///     text: String,
/// }
///
/// impl DdpDocument for Task {
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn set_id(&mut self, id: String) {
///         self.id = id;
///     }
/// }
/// ```
pub trait DdpDocument: DeserializeOwned + Default + Send + Sync + 'static {
    /// The document's id.
    fn id(&self) -> &str;

    /// Replaces the document's id with the envelope id.
    fn set_id(&mut self, id: String);
}
