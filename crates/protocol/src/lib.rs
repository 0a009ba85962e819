//! Protocol domain for the ledger node client.
//!
//! This crate contains the message model, newtype identifiers, proof-of-work
//! inputs, shared error shapes, and the port traits the HTTP client consumes.
//! Infrastructure crates implement or call these; they never add protocol
//! rules.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! It defines *what* a valid message is and *which* capabilities submission
//! needs; the `node-client` crate defines *how* they reach the node.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`MessageId`, `NetworkId`, `Nonce`, `Topic`, etc.) |
//! | [`types`] | `Message`, `PowInfo`, length/nonce constants and byte helpers |
//! | [`errors`] | `ClientError` and `ProtocolError` |
//! | [`ports`] | `MessageSerializer`, `PowProvider`, `TopicSubscriber` |
//! | [`subscriptions`] | In-process `SubscriptionRegistry` |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod subscriptions;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ClientError, ProtocolError};
pub use identifiers::{Bech32Hrp, MessageId, NetworkId, Nonce, SubscriptionId, Topic};
pub use ports::{
    ConnectionState, ConnectionStatus, MessageSerializer, PowProvider, StatusCallback,
    TopicCallback, TopicSubscriber,
};
pub use subscriptions::SubscriptionRegistry;
pub use types::{
    ensure_message_length, has_zero_nonce, network_id_from_name, write_network_id, write_nonce,
    Message, PowInfo, MAX_MESSAGE_LENGTH, NETWORK_ID_OFFSET, NONCE_LENGTH, NONCE_ZERO,
};
