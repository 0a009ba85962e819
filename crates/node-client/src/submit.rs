//! Message submission.
//!
//! Both entry points guarantee the outgoing payload is within
//! [`MAX_MESSAGE_LENGTH`](protocol::MAX_MESSAGE_LENGTH) before anything is
//! sent. When a proof-of-work provider is configured, the client fills in the
//! fields the node would otherwise fill (parents, network id, nonce) and
//! computes the nonce locally.

use protocol::{
    ensure_message_length, has_zero_nonce, write_network_id, write_nonce, Message, MessageId,
};
use reqwest::Method;
use tracing::{debug, info};

use crate::client::{json_body, Api, NodeClient};
use crate::models::SubmittedMessage;
use crate::NodeClientError;

const MESSAGES_ROUTE: &str = "messages";

impl NodeClient {
    /// Submits a structured message and returns the id the node assigned.
    ///
    /// With a proof-of-work provider configured, the node's protocol info is
    /// queried fresh for every call; empty parents are replaced by the node's
    /// tips and a missing network id by the one derived from the node's
    /// network name. The nonce returned by the provider is written into the
    /// message before it is posted.
    ///
    /// # Errors
    ///
    /// - [`NodeClientError::MissingSerializer`] if no serializer is configured.
    /// - [`NodeClientError::Protocol`] if the serialized message is too large,
    ///   or the serializer or provider fail. Nothing is posted in that case.
    /// - Transport and [`NodeClientError::Client`] failures from any of the
    ///   requests involved.
    pub async fn submit_message(&self, mut message: Message) -> Result<MessageId, NodeClientError> {
        let serializer = self
            .config()
            .serializer
            .clone()
            .ok_or(NodeClientError::MissingSerializer)?;
        let pow_provider = self.config().pow_provider.clone();

        let pow_info = match &pow_provider {
            Some(_) => {
                let pow_info = self.pow_info().await?;
                if message.parent_message_ids.is_empty() {
                    message.parent_message_ids = self.tips().await?.tip_message_ids;
                    debug!(
                        parents = message.parent_message_ids.len(),
                        "adopted node tips as parents"
                    );
                }
                if message.network_id.is_none() {
                    message.network_id = Some(pow_info.network_id);
                    debug!(network_id = %pow_info.network_id, "adopted node network id");
                }
                Some(pow_info)
            }
            None => None,
        };

        let bytes = serializer.serialize(&message)?;
        ensure_message_length(bytes.len())?;

        if let (Some(provider), Some(pow_info)) = (&pow_provider, pow_info) {
            let nonce = provider.pow(&bytes, pow_info.min_pow_score).await?;
            debug!(%nonce, "computed proof-of-work nonce");
            message.nonce = Some(nonce);
        }

        let submitted: SubmittedMessage = self
            .fetch_json(
                Api::Core,
                Method::POST,
                MESSAGES_ROUTE,
                Some(json_body(&message)?),
            )
            .await?;
        info!(message_id = %submitted.message_id, bytes = bytes.len(), "message accepted");
        Ok(submitted.message_id)
    }

    /// Submits a message already in binary form and returns the id the node
    /// assigned.
    ///
    /// Proof-of-work runs only when a provider is configured and the trailing
    /// nonce bytes are all zero; a buffer carrying a nonce is sent unchanged.
    /// When it runs, the network id at the start of the buffer and the nonce
    /// are both overwritten.
    ///
    /// # Errors
    ///
    /// - [`NodeClientError::Protocol`] if the buffer is too large or the
    ///   provider fails. Nothing is posted in that case.
    /// - Transport and [`NodeClientError::Client`] failures.
    pub async fn submit_message_raw(&self, mut bytes: Vec<u8>) -> Result<MessageId, NodeClientError> {
        ensure_message_length(bytes.len())?;

        if let Some(provider) = self.config().pow_provider.clone() {
            if has_zero_nonce(&bytes) {
                let pow_info = self.pow_info().await?;
                write_network_id(&mut bytes, pow_info.network_id);
                let nonce = provider.pow(&bytes, pow_info.min_pow_score).await?;
                write_nonce(&mut bytes, nonce);
                debug!(%nonce, network_id = %pow_info.network_id, "computed proof-of-work nonce");
            } else {
                debug!("raw message already carries a nonce; skipping proof-of-work");
            }
        }

        let length = bytes.len();
        let submitted: SubmittedMessage = self
            .fetch_binary_write(Method::POST, MESSAGES_ROUTE, bytes)
            .await?;
        info!(message_id = %submitted.message_id, bytes = length, "raw message accepted");
        Ok(submitted.message_id)
    }
}
