//! Message model and proof-of-work inputs.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! invariants the client enforces before a message reaches the node: the
//! serialized length limit, the reserved nonce slot, and the network id slot.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{MessageId, NetworkId, Nonce, ProtocolError};

type Blake2b256 = Blake2b<U32>;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length, in bytes, of a serialized message accepted by the node.
pub const MAX_MESSAGE_LENGTH: usize = 32_768;

/// Length of the nonce slot at the end of a serialized message.
pub const NONCE_LENGTH: usize = 8;

/// A nonce slot that has not been filled by proof-of-work yet.
pub const NONCE_ZERO: [u8; NONCE_LENGTH] = [0; NONCE_LENGTH];

/// Byte offset of the network id inside a serialized message.
pub const NETWORK_ID_OFFSET: usize = 0;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A message in the structured form accepted by the node's JSON API.
///
/// Fields left empty are filled in by the submission pipeline when a
/// proof-of-work capability is configured (parents from the node's tips,
/// network id from the node's protocol info, nonce from the capability).
/// Without one, the node fills them itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Network the message is valid on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<NetworkId>,

    /// Parent references, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_message_ids: Vec<MessageId>,

    /// Arbitrary payload; its shape is defined by the payload's own type tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Proof-of-work nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Nonce>,
}

impl Message {
    /// Creates an empty message carrying `payload`.
    pub fn with_payload(payload: Value) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Proof-of-work inputs
// ---------------------------------------------------------------------------

/// The two node-derived values needed to run proof-of-work.
///
/// Derived from the node's protocol info on every submission; never cached,
/// because both values can change across node restarts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowInfo {
    /// Network id derived from the node's network name.
    pub network_id: NetworkId,

    /// Minimum proof-of-work score the node accepts.
    pub min_pow_score: f64,
}

impl PowInfo {
    /// Derives [`PowInfo`] from the node's advertised network name and score.
    pub fn from_network_name(network_name: &str, min_pow_score: f64) -> Self {
        Self {
            network_id: network_id_from_name(network_name),
            min_pow_score,
        }
    }
}

/// Hashes `network_name` with BLAKE2b-256 and reads the first 8 bytes of the
/// digest as a little-endian integer.
pub fn network_id_from_name(network_name: &str) -> NetworkId {
    let digest = Blake2b256::digest(network_name.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    NetworkId::from_le_bytes(prefix)
}

// ---------------------------------------------------------------------------
// Raw message helpers
// ---------------------------------------------------------------------------

/// Fails with [`ProtocolError::MessageTooLarge`] if `length` exceeds
/// [`MAX_MESSAGE_LENGTH`].
pub fn ensure_message_length(length: usize) -> Result<(), ProtocolError> {
    if length > MAX_MESSAGE_LENGTH {
        return Err(ProtocolError::MessageTooLarge {
            length,
            max: MAX_MESSAGE_LENGTH,
        });
    }
    Ok(())
}

/// Returns `true` when the trailing nonce slot of `bytes` is all zero.
///
/// Buffers shorter than the slot never qualify.
pub fn has_zero_nonce(bytes: &[u8]) -> bool {
    bytes.len() >= NONCE_LENGTH && bytes[bytes.len() - NONCE_LENGTH..] == NONCE_ZERO
}

/// Writes `network_id` into its slot at [`NETWORK_ID_OFFSET`].
///
/// Buffers too short to hold the slot are left untouched.
pub fn write_network_id(bytes: &mut [u8], network_id: NetworkId) {
    if let Some(slot) = bytes.get_mut(NETWORK_ID_OFFSET..NETWORK_ID_OFFSET + 8) {
        slot.copy_from_slice(&network_id.to_le_bytes());
    }
}

/// Writes `nonce` into the trailing nonce slot.
///
/// Buffers shorter than the slot are left untouched.
pub fn write_nonce(bytes: &mut [u8], nonce: Nonce) {
    if let Some(start) = bytes.len().checked_sub(NONCE_LENGTH) {
        bytes[start..].copy_from_slice(&nonce.to_le_bytes());
    }
}
