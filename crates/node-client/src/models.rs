//! Typed response bodies for the endpoints the client interprets itself.
//!
//! Other endpoints are returned as [`serde_json::Value`]; their shapes belong
//! to the node and change between node versions.

use protocol::{Bech32Hrp, MessageId, PowInfo};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `GET info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    /// Node software name.
    #[serde(default)]
    pub name: String,

    /// Node software version.
    #[serde(default)]
    pub version: String,

    /// Protocol parameters the node enforces.
    pub protocol: ProtocolParameters,

    /// Remaining fields, preserved as returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `protocol` section of [`NodeInfo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolParameters {
    /// Network name; hashed to derive the network id.
    pub network_name: String,

    /// Human-readable prefix for bech32 addresses on this network.
    #[serde(rename = "bech32HRP")]
    pub bech32_hrp: Bech32Hrp,

    /// Minimum proof-of-work score accepted by the node.
    #[serde(rename = "minPoWScore")]
    pub min_pow_score: f64,

    /// Remaining fields, preserved as returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeInfo {
    /// Derives the proof-of-work inputs advertised by this node.
    pub fn pow_info(&self) -> PowInfo {
        PowInfo::from_network_name(&self.protocol.network_name, self.protocol.min_pow_score)
    }
}

/// Response of `GET tips`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tips {
    /// Suggested parents for a new message.
    pub tip_message_ids: Vec<MessageId>,
}

/// Response of `POST messages`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmittedMessage {
    pub(crate) message_id: MessageId,
}

/// Request body of `POST peers`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddPeerRequest<'a> {
    pub(crate) multi_address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) alias: Option<&'a str>,
}
