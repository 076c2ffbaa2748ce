//! The method correlation table.
//!
//! Every tracked method call registers a type-erased completion here,
//! keyed by its correlation id. A matching `result` frame removes the
//! entry before invoking it, so completions run exactly once; frames with
//! no matching entry are the caller's signal to drop them.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use ddp_protocol::RemoteError;

/// Failure modes of a tracked method call.
#[derive(Debug, Error)]
pub enum MethodError {
    /// The server answered with an application error.
    #[error("method call failed: {0}")]
    Remote(RemoteError),

    /// The result arrived but did not match the caller's expected type.
    #[error("failed to decode method result: {0}")]
    Decode(#[from] serde_json::Error),

    /// The transport closed before a result arrived.
    #[error("connection lost before a result arrived")]
    ConnectionLost,
}

/// Outcome delivered to a method call's completion: exactly one of a
/// decoded result or an error, never both, never neither.
pub type MethodResult<T> = Result<T, MethodError>;

pub(crate) type Completion = Box<dyn FnOnce(Result<Value, MethodError>) + Send>;

/// Outstanding method calls awaiting their `result` frame.
#[derive(Default)]
pub(crate) struct PendingCalls {
    table: Mutex<HashMap<String, Completion>>,
}

impl PendingCalls {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a completion under `id`.
    ///
    /// Ids are connection-unique by construction; a duplicate means a
    /// custom id generator misbehaved, in which case the older entry is
    /// dropped without being invoked.
    pub(crate) fn register(&self, id: &str, completion: Completion) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if table.insert(id.to_string(), completion).is_some() {
            warn!(id, "replacing pending call registered under a duplicate id");
        }
    }

    /// Removes and returns the completion for `id`, if one is registered.
    pub(crate) fn take(&self, id: &str) -> Option<Completion> {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Removes the completion for `id` without invoking it.
    ///
    /// Used to roll back a registration whose frame never reached the
    /// transport.
    pub(crate) fn discard(&self, id: &str) {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    /// Fails every outstanding call. Completions run outside the lock.
    pub(crate) fn fail_all(&self, error: impl Fn() -> MethodError) {
        let drained: Vec<Completion> = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.drain().map(|(_, completion)| completion).collect()
        };
        for completion in drained {
            completion(Err(error()));
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Decodes a raw result value into the caller's type.
///
/// A null value stands in for an absent `result` field and decodes to the
/// type's default; any other shape mismatch surfaces as a decode error.
pub(crate) fn decode_result<T: DeserializeOwned + Default>(value: Value) -> MethodResult<T> {
    if value.is_null() {
        Ok(T::default())
    } else {
        serde_json::from_value(value).map_err(MethodError::from)
    }
}
