//! Shared leaf types for the DDP client crates.
//!
//! - [`ejson`]: the EJSON wrapper types (`$date`, `$binary`) that round-trip
//!   non-native scalars across the wire
//! - [`ids`]: connection-unique id generation and credential digests
//! - [`tracing`]: unified logging setup for library consumers

pub mod ejson;
pub mod ids;
pub mod tracing;

pub use ejson::{DdpBinary, DdpDate};
pub use ids::{random_id, sha256_hex};
pub use tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
