//! Error type returned by every [`crate::NodeClient`] operation.

use protocol::{ClientError, ProtocolError};
use thiserror::Error;

/// Failures surfaced by the node client.
///
/// The variants fall into three groups:
///
/// - **Local validation**: [`Configuration`](Self::Configuration),
///   [`MissingSerializer`](Self::MissingSerializer), and
///   [`Protocol`](Self::Protocol). Raised before the affected request is sent.
/// - **Transport**: [`Timeout`](Self::Timeout) and
///   [`Transport`](Self::Transport).
/// - **Remote**: [`Client`](Self::Client), for anything the node rejected or
///   any response that could not be read.
///
/// Nothing is retried automatically.
#[derive(Debug, Error)]
pub enum NodeClientError {
    /// The endpoint or client options are invalid.
    ///
    /// Produced only by [`crate::NodeClient::new`].
    #[error("Invalid client configuration: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// A structured submission was requested but no serializer is configured.
    #[error("No message serializer is configured")]
    MissingSerializer,

    /// A local protocol rule failed (size limit, serializer, proof-of-work).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The configured request timeout elapsed before the node responded.
    #[error("Request to {route} timed out")]
    Timeout {
        /// Route of the aborted call.
        route: String,
    },

    /// The request failed below HTTP (connection refused, TLS, reset, etc.).
    #[error("Request to {route} failed: {source}")]
    Transport {
        /// Route of the failed call.
        route: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The node reported a failure, or its response could not be read.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl NodeClientError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the remote [`ClientError`] if this is one.
    pub fn as_client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Client(error) => Some(error),
            _ => None,
        }
    }

    /// Returns `true` for the timeout failure kind.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
