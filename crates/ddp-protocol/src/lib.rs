//! Wire vocabulary for the DDP protocol.
//!
//! Every DDP frame is a JSON object whose `msg` field discriminates the
//! message type. Outbound frames are built with [`ClientFrame`]; inbound
//! frames are parsed into a [`DdpMessage`] envelope (discriminator + raw
//! body) and decoded into the typed payload models on demand by whichever
//! component dispatches on them.
//!
//! # Example
//!
//! ```rust
//! use ddp_protocol::{ClientFrame, DdpMessage, ConnectedPayload};
//!
//! let frame = serde_json::to_string(&ClientFrame::connect()).unwrap();
//! assert!(frame.contains(r#""msg":"connect""#));
//!
//! let inbound = DdpMessage::parse(r#"{"msg":"connected","session":"s1"}"#)
//!     .unwrap()
//!     .unwrap();
//! let payload: ConnectedPayload = inbound.decode().unwrap();
//! assert_eq!(payload.session, "s1");
//! ```

mod document;
mod error;
mod frames;
mod message;
mod server;

pub use document::DdpDocument;
pub use error::{ProtocolError, ProtocolResult, RemoteError};
pub use frames::ClientFrame;
pub use message::DdpMessage;
pub use server::{
    AddedBeforeEvent, AddedEvent, ChangedEvent, ConnectedPayload, FailedPayload, MovedBeforeEvent,
    NosubPayload, PingPayload, PongPayload, ReadyPayload, RemovedEvent, ResultPayload,
};

/// The protocol version this client requests during the handshake.
pub const PROTOCOL_VERSION: &str = "1";

/// Versions offered in the handshake's support list.
pub const SUPPORTED_VERSIONS: &[&str] = &["1"];
