//! Port traits implemented outside this crate.
//!
//! The node client consumes these capabilities but does not implement them:
//!
//! - [`MessageSerializer`]: the binary wire codec for [`Message`].
//! - [`PowProvider`]: proof-of-work nonce search, possibly on another thread or
//!   worker process.
//! - [`TopicSubscriber`]: the publish/subscribe channel for push notifications.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Message, Nonce, ProtocolError, SubscriptionId, Topic};

/// Deterministic binary encoder for [`Message`].
///
/// Used by the submission pipeline only to measure the serialized length and
/// to feed proof-of-work; the node itself receives the JSON form.
pub trait MessageSerializer: Send + Sync {
    /// Serializes `message` to its wire bytes.
    ///
    /// Must accept the same message shape the node's JSON API accepts,
    /// including messages whose nonce is unset.
    fn serialize(&self, message: &Message) -> Result<Vec<u8>, ProtocolError>;
}

/// Proof-of-work capability.
///
/// May run for an arbitrarily long time. Callers cancel it by dropping the
/// returned future.
#[async_trait]
pub trait PowProvider: Send + Sync {
    /// Finds a nonce for `message` whose score reaches `target_score`.
    async fn pow(&self, message: &[u8], target_score: f64) -> Result<Nonce, ProtocolError>;
}

// ---------------------------------------------------------------------------
// Publish/subscribe
// ---------------------------------------------------------------------------

/// Callback invoked with the topic and raw payload of each delivered event.
pub type TopicCallback = Arc<dyn Fn(&Topic, &[u8]) + Send + Sync>;

/// Callback invoked whenever the subscriber's connection status changes.
pub type StatusCallback = Arc<dyn Fn(&ConnectionStatus) + Send + Sync>;

/// Kind of connection status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    /// The transport connected to the broker.
    Connected,
    /// The transport lost or closed its connection.
    Disconnected,
    /// The transport reported an error.
    Error,
    /// A topic gained its first subscriber.
    SubscriptionAdded,
    /// A topic lost its last subscriber.
    SubscriptionRemoved,
}

/// A connection status change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// What happened.
    pub state: ConnectionState,
    /// Human-readable detail (topic name, error text, broker address).
    pub message: String,
}

impl ConnectionStatus {
    /// Creates a [`ConnectionStatus`].
    pub fn new(state: ConnectionState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

/// Topic-based push notification channel.
pub trait TopicSubscriber: Send + Sync {
    /// Registers `callback` for `topic` and returns its subscription id.
    fn subscribe(&self, topic: Topic, callback: TopicCallback) -> SubscriptionId;

    /// Removes a topic or status subscription.
    ///
    /// Returns `false` if `id` was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Registers `callback` for connection status changes.
    fn status_changed(&self, callback: StatusCallback) -> SubscriptionId;
}
