//! Newtype domain identifiers.
//!
//! Every protocol concept that has an identity is a distinct newtype wrapping a
//! primitive. A [`MessageId`] and a [`Topic`] are both strings on the wire, but
//! they are never interchangeable in the API.
//!
//! Numeric identifiers that the node's JSON API carries as decimal strings
//! ([`NetworkId`], [`Nonce`]) serialise as strings and accept either a string
//! or a JSON number when deserialising.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes carried as decimal strings in JSON.
// Generates: struct (Copy), new(), as_u64(), to/from little-endian bytes,
// Display, and string-based serde.
// ---------------------------------------------------------------------------
macro_rules! decimal_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new value from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }

            /// Reads the value from 8 little-endian bytes.
            pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
                Self(u64::from_le_bytes(bytes))
            }

            /// Returns the value as 8 little-endian bytes.
            pub fn to_le_bytes(self) -> [u8; 8] {
                self.0.to_le_bytes()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match DecimalRepr::deserialize(deserializer)? {
                    DecimalRepr::Number(value) => Ok(Self(value)),
                    DecimalRepr::Text(text) => text
                        .parse::<u64>()
                        .map(Self)
                        .map_err(serde::de::Error::custom),
                }
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Number(u64),
    Text(String),
}

// ---------------------------------------------------------------------------
// Identifiers — node-assigned strings
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a message accepted by the node (hex-encoded hash).
    ///
    /// Also used for parent references: a message's parents are the ids of
    /// earlier messages.
    MessageId
}

string_id! {
    /// Human-readable prefix used when encoding addresses as bech32
    /// (e.g. `"iota"`, `"atoi"`).
    Bech32Hrp
}

string_id! {
    /// A publish/subscribe topic path (e.g. `"milestones/latest"`).
    ///
    /// Use the constructors on [`Topic`] for the node's standard topics, or
    /// [`Topic::new`] for a custom path.
    Topic
}

impl Topic {
    /// Latest milestone announcements.
    pub fn milestones_latest() -> Self {
        Self("milestones/latest".to_owned())
    }

    /// Confirmed milestone announcements.
    pub fn milestones_confirmed() -> Self {
        Self("milestones/confirmed".to_owned())
    }

    /// Every message the node attaches.
    pub fn messages() -> Self {
        Self("messages".to_owned())
    }

    /// Metadata for every message referenced by a milestone.
    pub fn messages_referenced() -> Self {
        Self("messages/referenced".to_owned())
    }

    /// Messages carrying an indexation payload with the given hex index.
    pub fn messages_indexation(index_hex: &str) -> Self {
        Self(format!("messages/indexation/{index_hex}"))
    }

    /// Metadata updates for a single message.
    pub fn message_metadata(message_id: &MessageId) -> Self {
        Self(format!("messages/{message_id}/metadata"))
    }

    /// Updates for a single output.
    pub fn output(output_id: &str) -> Self {
        Self(format!("outputs/{output_id}"))
    }

    /// The message that included a given transaction.
    pub fn transaction_included_message(transaction_id: &str) -> Self {
        Self(format!("transactions/{transaction_id}/included-message"))
    }

    /// Outputs created for a bech32 address.
    pub fn address_outputs(address_bech32: &str) -> Self {
        Self(format!("addresses/{address_bech32}/outputs"))
    }
}

// ---------------------------------------------------------------------------
// Identifiers — numeric, decimal strings in transit
// ---------------------------------------------------------------------------

decimal_id! {
    /// Identifies the network a message is valid on.
    ///
    /// Derived from the node's advertised network name; see
    /// [`crate::PowInfo::from_network_name`].
    NetworkId
}

decimal_id! {
    /// Proof-of-work nonce occupying the final 8 bytes of a serialized message.
    Nonce
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one subscription registered with a [`crate::TopicSubscriber`].
///
/// Generated fresh on every `subscribe` call; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Generates a new random subscription identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
