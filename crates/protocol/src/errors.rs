//! Error types shared by every node-facing crate.
//!
//! [`ClientError`] is the uniform shape of a failure reported by (or decoded
//! from) the remote node. [`ProtocolError`] covers local conditions detected
//! before or instead of talking to the node: oversized messages, serializer
//! failures, and proof-of-work failures.
//!
//! Transport failures (network errors, timeouts) live in the HTTP adapter
//! crate; this crate performs no I/O.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Remote failures
// ---------------------------------------------------------------------------

/// A failure reported by the node, or a response the client could not read.
///
/// Every API call that reaches the node and does not succeed produces exactly
/// one of these, carrying the best diagnostic available: a structured JSON
/// error, a plain-text error, or the HTTP status text as a last resort.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{route} failed with HTTP {http_status}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct ClientError {
    /// Human-readable failure description.
    pub message: String,

    /// Route of the call that failed, relative to its base path (e.g. `"tips"`).
    pub route: String,

    /// Raw HTTP status of the response.
    pub http_status: u16,

    /// Error code reported by the node, or the status code as a string when
    /// the body carried none.
    ///
    /// `None` only on the binary path, where the status is not substituted.
    pub code: Option<String>,
}

impl ClientError {
    /// Creates a [`ClientError`].
    pub fn new(
        message: impl Into<String>,
        route: impl Into<String>,
        http_status: u16,
        code: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            route: route.into(),
            http_status,
            code,
        }
    }
}

// ---------------------------------------------------------------------------
// Local failures
// ---------------------------------------------------------------------------

/// Local protocol-level failures. None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The serialized message is larger than [`crate::MAX_MESSAGE_LENGTH`].
    ///
    /// Raised before any bytes leave the process.
    #[error("The message length is {length}, which exceeds the maximum size of {max}")]
    MessageTooLarge {
        /// Serialized length in bytes.
        length: usize,
        /// Permitted maximum in bytes.
        max: usize,
    },

    /// The message serializer rejected the message.
    #[error("Message serialization failed: {message}")]
    Serialization {
        /// Description provided by the serializer.
        message: String,
    },

    /// The proof-of-work capability failed to produce a nonce.
    #[error("Proof-of-work failed: {message}")]
    ProofOfWork {
        /// Description provided by the proof-of-work capability.
        message: String,
    },
}
