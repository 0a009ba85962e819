//! Message submission against an in-process mock node.

mod common;

use std::sync::Arc;

use common::{
    FailingPow, FixedPow, JsonSerializer, MockNode, ACCEPTED_ID, MIN_POW_SCORE, TESTNET_NETWORK_ID,
    TIP_A, TIP_B,
};
use node_client::{ClientOptions, NodeClient, NodeClientError};
use protocol::{
    Message, MessageId, NetworkId, Nonce, ProtocolError, MAX_MESSAGE_LENGTH, NONCE_LENGTH,
};
use serde_json::json;

fn client_with_pow(node: &MockNode, pow: Arc<FixedPow>) -> NodeClient {
    let options = ClientOptions::new()
        .with_serializer(Arc::new(JsonSerializer))
        .with_pow_provider(pow);
    NodeClient::new(&node.url, options).unwrap()
}

fn client_without_pow(node: &MockNode) -> NodeClient {
    let options = ClientOptions::new().with_serializer(Arc::new(JsonSerializer));
    NodeClient::new(&node.url, options).unwrap()
}

fn raw_buffer(len: usize, nonce: [u8; NONCE_LENGTH]) -> Vec<u8> {
    let mut bytes = vec![0x5a; len];
    bytes[len - NONCE_LENGTH..].copy_from_slice(&nonce);
    bytes
}

// ---------------------------------------------------------------------------
// Structured submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn structured_submission_with_pow_fills_parents_network_id_and_nonce() {
    let node = MockNode::start().await;
    let pow = FixedPow::new(42);
    let client = client_with_pow(&node, Arc::clone(&pow));

    let message_id = client
        .submit_message(Message::with_payload(json!({"type": 2, "index": "6869"})))
        .await
        .unwrap();

    assert_eq!(message_id.as_str(), ACCEPTED_ID);
    let paths: Vec<_> = node
        .requests()
        .iter()
        .map(|request| request.path().to_owned())
        .collect();
    assert_eq!(paths, ["/api/v2/info", "/api/v2/tips", "/api/v2/messages"]);

    let posted = node.requests_to("/api/v2/messages").remove(0);
    assert_eq!(posted.header("content-type"), Some("application/json"));
    let body = posted.json();
    assert_eq!(body["parentMessageIds"], json!([TIP_A, TIP_B]));
    assert_eq!(body["networkId"], json!(TESTNET_NETWORK_ID.to_string()));
    assert_eq!(body["nonce"], json!("42"));
    assert_eq!(body["payload"]["index"], json!("6869"));

    let calls = pow.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, MIN_POW_SCORE);
    let hashed: Message = serde_json::from_slice(&calls[0].0).unwrap();
    assert_eq!(hashed.nonce, None);
    assert_eq!(hashed.network_id, Some(NetworkId::new(TESTNET_NETWORK_ID)));
}

#[tokio::test]
async fn structured_submission_keeps_supplied_parents_and_network_id() {
    let node = MockNode::start().await;
    let client = client_with_pow(&node, FixedPow::new(7));
    let parent = MessageId::new("dd".repeat(32)).unwrap();
    let message = Message {
        network_id: Some(NetworkId::new(99)),
        parent_message_ids: vec![parent.clone()],
        ..Message::default()
    };

    client.submit_message(message).await.unwrap();

    assert!(node.requests_to("/api/v2/tips").is_empty());
    let body = node.requests_to("/api/v2/messages").remove(0).json();
    assert_eq!(body["parentMessageIds"], json!([parent.as_str()]));
    assert_eq!(body["networkId"], json!("99"));
    assert_eq!(body["nonce"], json!("7"));
}

#[tokio::test]
async fn structured_submission_without_pow_posts_message_as_given() {
    let node = MockNode::start().await;
    let client = client_without_pow(&node);

    client
        .submit_message(Message::with_payload(json!({"type": 2})))
        .await
        .unwrap();

    let requests = node.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].json(), json!({"payload": {"type": 2}}));
}

#[tokio::test]
async fn oversized_structured_message_fails_without_a_request() {
    let node = MockNode::start().await;
    let client = client_without_pow(&node);
    let payload = json!({"data": "x".repeat(MAX_MESSAGE_LENGTH)});

    let error = client
        .submit_message(Message::with_payload(payload))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        NodeClientError::Protocol(ProtocolError::MessageTooLarge { max, .. }) if max == MAX_MESSAGE_LENGTH
    ));
    assert!(node.requests().is_empty());
}

#[tokio::test]
async fn oversized_structured_message_with_pow_never_posts() {
    let node = MockNode::start().await;
    let pow = FixedPow::new(1);
    let client = client_with_pow(&node, Arc::clone(&pow));
    let payload = json!({"data": "x".repeat(MAX_MESSAGE_LENGTH)});

    let error = client
        .submit_message(Message::with_payload(payload))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        NodeClientError::Protocol(ProtocolError::MessageTooLarge { .. })
    ));
    assert!(node.requests_to("/api/v2/messages").is_empty());
    assert!(pow.calls().is_empty());
    let paths: Vec<_> = node
        .requests()
        .iter()
        .map(|request| request.path().to_owned())
        .collect();
    assert_eq!(paths, ["/api/v2/info", "/api/v2/tips"]);
}

#[tokio::test]
async fn structured_submission_requires_a_serializer() {
    let node = MockNode::start().await;
    let client = NodeClient::new(&node.url, ClientOptions::new()).unwrap();

    let error = client.submit_message(Message::default()).await.unwrap_err();

    assert!(matches!(error, NodeClientError::MissingSerializer));
    assert!(node.requests().is_empty());
}

#[tokio::test]
async fn failing_pow_stops_before_posting() {
    let node = MockNode::start().await;
    let options = ClientOptions::new()
        .with_serializer(Arc::new(JsonSerializer))
        .with_pow_provider(Arc::new(FailingPow));
    let client = NodeClient::new(&node.url, options).unwrap();

    let error = client.submit_message(Message::default()).await.unwrap_err();

    assert!(matches!(
        error,
        NodeClientError::Protocol(ProtocolError::ProofOfWork { .. })
    ));
    assert!(node.requests_to("/api/v2/messages").is_empty());
}

// ---------------------------------------------------------------------------
// Raw submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn raw_submission_with_zero_nonce_runs_pow() {
    let node = MockNode::start().await;
    let pow = FixedPow::new(0x0102_0304);
    let client = client_with_pow(&node, Arc::clone(&pow));

    let message_id = client
        .submit_message_raw(raw_buffer(64, [0; NONCE_LENGTH]))
        .await
        .unwrap();

    assert_eq!(message_id.as_str(), ACCEPTED_ID);
    let posted = node.requests_to("/api/v2/messages").remove(0);
    assert_eq!(posted.header("content-type"), Some("application/octet-stream"));
    assert_eq!(posted.body.len(), 64);
    assert_eq!(posted.body[..8], TESTNET_NETWORK_ID.to_le_bytes());
    assert_eq!(posted.body[56..], Nonce::new(0x0102_0304).to_le_bytes());
    assert!(posted.body[8..56].iter().all(|byte| *byte == 0x5a));

    let calls = pow.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0[..8], TESTNET_NETWORK_ID.to_le_bytes());
    assert_eq!(calls[0].0[56..], [0; NONCE_LENGTH]);
}

#[tokio::test]
async fn raw_submission_with_existing_nonce_skips_pow() {
    let node = MockNode::start().await;
    let pow = FixedPow::new(1);
    let client = client_with_pow(&node, Arc::clone(&pow));
    let buffer = raw_buffer(48, [9, 0, 0, 0, 0, 0, 0, 0]);

    client.submit_message_raw(buffer.clone()).await.unwrap();

    assert!(pow.calls().is_empty());
    assert!(node.requests_to("/api/v2/info").is_empty());
    assert_eq!(
        node.requests_to("/api/v2/messages").remove(0).body.to_vec(),
        buffer
    );
}

#[tokio::test]
async fn raw_submission_without_provider_posts_buffer_unchanged() {
    let node = MockNode::start().await;
    let client = client_without_pow(&node);
    let buffer = raw_buffer(40, [0; NONCE_LENGTH]);

    let message_id = client.submit_message_raw(buffer.clone()).await.unwrap();

    assert_eq!(message_id.as_str(), ACCEPTED_ID);
    assert!(node.requests_to("/api/v2/info").is_empty());
    assert_eq!(node.requests().len(), 1);
    assert_eq!(
        node.requests_to("/api/v2/messages").remove(0).body.to_vec(),
        buffer
    );
}

#[tokio::test]
async fn oversized_raw_message_fails_without_a_request() {
    let node = MockNode::start().await;
    let pow = FixedPow::new(1);
    let client = client_with_pow(&node, Arc::clone(&pow));

    let error = client
        .submit_message_raw(vec![0; MAX_MESSAGE_LENGTH + 1])
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        NodeClientError::Protocol(ProtocolError::MessageTooLarge { length, .. }) if length == MAX_MESSAGE_LENGTH + 1
    ));
    assert!(pow.calls().is_empty());
    assert!(node.requests().is_empty());
}

#[tokio::test]
async fn rejected_raw_submission_surfaces_the_node_error() {
    let node = MockNode::with_responder(|_| {
        common::Reply::json(
            400,
            json!({"error": {"code": "invalid_data", "message": "invalid message"}}),
        )
    })
    .await;
    let client = NodeClient::new(&node.url, ClientOptions::new()).unwrap();

    let error = client
        .submit_message_raw(raw_buffer(32, [1; NONCE_LENGTH]))
        .await
        .unwrap_err();

    let client_error = error.as_client_error().unwrap();
    assert_eq!(client_error.message, "invalid message");
    assert_eq!(client_error.code.as_deref(), Some("invalid_data"));
    assert_eq!(client_error.route, "messages");
    assert_eq!(client_error.http_status, 400);
}
