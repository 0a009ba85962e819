//! The [`NodeClient`] handle and its REST accessor surface.

use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use protocol::{Bech32Hrp, ClientError, MessageId, PowInfo, ProtocolError};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{ClientOptions, EndpointConfig};
use crate::models::{AddPeerRequest, NodeInfo, Tips};
use crate::response;
use crate::transport::Transport;
use crate::NodeClientError;

const HEALTH_ROUTE: &str = "/health";
const JSON_CONTENT_TYPE: &str = "application/json";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Which configured base path a route is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Api {
    Core,
    Plugins,
}

/// Async client for one node endpoint.
///
/// Cheap to clone; clones share the validated configuration, the connection
/// pool, and the cached bech32 prefix. Calls are independent of each other
/// and may run concurrently.
#[derive(Clone)]
pub struct NodeClient {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Transport,
    bech32_hrp: OnceLock<Bech32Hrp>,
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("endpoint", &self.endpoint())
            .finish_non_exhaustive()
    }
}

impl NodeClient {
    /// Creates a client for `endpoint` (scheme, host and port; trailing
    /// slashes are ignored).
    ///
    /// # Errors
    ///
    /// Returns [`NodeClientError::Configuration`] when the endpoint or the
    /// options are invalid. No request is made.
    pub fn new(endpoint: &str, options: ClientOptions) -> Result<Self, NodeClientError> {
        let config = Arc::new(EndpointConfig::resolve(endpoint, options)?);
        let transport = Transport::new(config)?;
        Ok(Self {
            inner: Arc::new(Inner {
                transport,
                bech32_hrp: OnceLock::new(),
            }),
        })
    }

    /// The endpoint this client talks to, without trailing slashes.
    pub fn endpoint(&self) -> &str {
        &self.config().endpoint
    }

    pub(crate) fn config(&self) -> &EndpointConfig {
        self.inner.transport.config()
    }

    // -----------------------------------------------------------------------
    // Core API
    // -----------------------------------------------------------------------

    /// Probes `GET /health`.
    ///
    /// Returns `true` for 200 and `false` for 503; any other status is a
    /// [`ClientError`].
    pub async fn health(&self) -> Result<bool, NodeClientError> {
        let response = self
            .inner
            .transport
            .send(Method::GET, HEALTH_ROUTE, HEALTH_ROUTE, HeaderMap::new(), None)
            .await?;
        match response.status {
            StatusCode::OK => Ok(true),
            StatusCode::SERVICE_UNAVAILABLE => Ok(false),
            other => Err(ClientError::new(
                "Unexpected response code",
                HEALTH_ROUTE,
                other.as_u16(),
                None,
            )
            .into()),
        }
    }

    /// Fetches the node's info.
    pub async fn info(&self) -> Result<NodeInfo, NodeClientError> {
        self.fetch_json(Api::Core, Method::GET, "info", None).await
    }

    /// Fetches parent suggestions for a new message.
    pub async fn tips(&self) -> Result<Tips, NodeClientError> {
        self.fetch_json(Api::Core, Method::GET, "tips", None).await
    }

    /// Fetches a message in JSON form.
    pub async fn message(&self, message_id: &MessageId) -> Result<Value, NodeClientError> {
        let route = format!("messages/{message_id}");
        self.fetch_json(Api::Core, Method::GET, &route, None).await
    }

    /// Fetches a message's metadata.
    pub async fn message_metadata(&self, message_id: &MessageId) -> Result<Value, NodeClientError> {
        let route = format!("messages/{message_id}/metadata");
        self.fetch_json(Api::Core, Method::GET, &route, None).await
    }

    /// Fetches a message in its binary form.
    pub async fn message_raw(&self, message_id: &MessageId) -> Result<Bytes, NodeClientError> {
        let route = format!("messages/{message_id}/raw");
        self.fetch_binary_read(&route).await
    }

    /// Fetches the children of a message.
    pub async fn message_children(&self, message_id: &MessageId) -> Result<Value, NodeClientError> {
        let route = format!("messages/{message_id}/children");
        self.fetch_json(Api::Core, Method::GET, &route, None).await
    }

    /// Fetches the message that included the given transaction.
    pub async fn transaction_included_message(
        &self,
        transaction_id: &str,
    ) -> Result<Value, NodeClientError> {
        let route = format!("transactions/{transaction_id}/included-message");
        self.fetch_json(Api::Core, Method::GET, &route, None).await
    }

    /// Fetches an output.
    pub async fn output(&self, output_id: &str) -> Result<Value, NodeClientError> {
        let route = format!("outputs/{output_id}");
        self.fetch_json(Api::Core, Method::GET, &route, None).await
    }

    /// Fetches a milestone by index.
    pub async fn milestone(&self, index: u32) -> Result<Value, NodeClientError> {
        let route = format!("milestones/{index}");
        self.fetch_json(Api::Core, Method::GET, &route, None).await
    }

    /// Fetches the outputs created and consumed by a milestone.
    pub async fn milestone_utxo_changes(&self, index: u32) -> Result<Value, NodeClientError> {
        let route = format!("milestones/{index}/utxo-changes");
        self.fetch_json(Api::Core, Method::GET, &route, None).await
    }

    pub async fn treasury(&self) -> Result<Value, NodeClientError> {
        self.fetch_json(Api::Core, Method::GET, "treasury", None).await
    }

    /// Fetches migration receipts, optionally only those migrated at the
    /// given milestone index.
    pub async fn receipts(&self, migrated_at: Option<u32>) -> Result<Value, NodeClientError> {
        let route = match migrated_at {
            Some(index) => format!("receipts/{index}"),
            None => "receipts".to_owned(),
        };
        self.fetch_json(Api::Core, Method::GET, &route, None).await
    }

    pub async fn peers(&self) -> Result<Value, NodeClientError> {
        self.fetch_json(Api::Core, Method::GET, "peers", None).await
    }

    pub async fn peer(&self, peer_id: &str) -> Result<Value, NodeClientError> {
        let route = format!("peers/{peer_id}");
        self.fetch_json(Api::Core, Method::GET, &route, None).await
    }

    /// Adds a peer by multi-address, with an optional alias.
    pub async fn peer_add(
        &self,
        multi_address: &str,
        alias: Option<&str>,
    ) -> Result<Value, NodeClientError> {
        let body = json_body(&AddPeerRequest {
            multi_address,
            alias,
        })?;
        self.fetch_json(Api::Core, Method::POST, "peers", Some(body))
            .await
    }

    /// Removes a peer. The node answers `204 No Content`.
    pub async fn peer_delete(&self, peer_id: &str) -> Result<(), NodeClientError> {
        let route = format!("peers/{peer_id}");
        let _: Value = self
            .fetch_json(Api::Core, Method::DELETE, &route, None)
            .await?;
        Ok(())
    }

    /// Returns the network's bech32 prefix.
    ///
    /// Fetched from `info` on first use and cached for the lifetime of the
    /// client. Concurrent first calls may each fetch; the first stored value
    /// is kept.
    pub async fn bech32_hrp(&self) -> Result<Bech32Hrp, NodeClientError> {
        if let Some(hrp) = self.inner.bech32_hrp.get() {
            return Ok(hrp.clone());
        }
        let info = self.info().await?;
        let hrp = self
            .inner
            .bech32_hrp
            .get_or_init(|| info.protocol.bech32_hrp);
        debug!(hrp = hrp.as_str(), "cached bech32 prefix");
        Ok(hrp.clone())
    }

    /// Derives the proof-of-work inputs from a fresh `info` query.
    pub async fn pow_info(&self) -> Result<PowInfo, NodeClientError> {
        Ok(self.info().await?.pow_info())
    }

    // -----------------------------------------------------------------------
    // Plugin API
    // -----------------------------------------------------------------------

    /// Calls a plugin endpoint at
    /// `{plugin base}{plugin_path}{method_path}?{query joined by '&'}`.
    ///
    /// `plugin_path` is the plugin's own prefix (e.g. `"participation/"`);
    /// `query` entries are sent as given (e.g. `"type=1"`).
    pub async fn plugin_fetch(
        &self,
        method: Method,
        plugin_path: &str,
        method_path: &str,
        query: &[&str],
        body: Option<Value>,
    ) -> Result<Value, NodeClientError> {
        let mut route = format!("{plugin_path}{method_path}");
        if !query.is_empty() {
            route.push('?');
            route.push_str(&query.join("&"));
        }
        let body = body.as_ref().map(json_body).transpose()?;
        self.fetch_json(Api::Plugins, method, &route, body).await
    }

    // -----------------------------------------------------------------------
    // Request paths
    // -----------------------------------------------------------------------

    fn base_path(&self, api: Api) -> &str {
        match api {
            Api::Core => &self.config().base_path,
            Api::Plugins => &self.config().base_plugin_path,
        }
    }

    /// JSON request: `application/json` in, decoded `T` out.
    pub(crate) async fn fetch_json<T: DeserializeOwned>(
        &self,
        api: Api,
        method: Method,
        route: &str,
        body: Option<Vec<u8>>,
    ) -> Result<T, NodeClientError> {
        let path = format!("{}{route}", self.base_path(api));
        let response = self
            .inner
            .transport
            .send(method, &path, route, content_type(JSON_CONTENT_TYPE), body)
            .await?;
        let value = response::interpret_json(route, &response)?;
        Ok(response::decode_json(route, response.status, value)?)
    }

    /// Binary read against the core API: raw bytes out.
    pub(crate) async fn fetch_binary_read(&self, route: &str) -> Result<Bytes, NodeClientError> {
        let path = format!("{}{route}", self.base_path(Api::Core));
        let response = self
            .inner
            .transport
            .send(
                Method::GET,
                &path,
                route,
                content_type(BINARY_CONTENT_TYPE),
                None,
            )
            .await?;
        Ok(response::interpret_binary_read(route, response)?)
    }

    /// Binary write against the core API: octet stream in, the response's
    /// `data` field decoded as `T` out.
    pub(crate) async fn fetch_binary_write<T: DeserializeOwned>(
        &self,
        method: Method,
        route: &str,
        body: Vec<u8>,
    ) -> Result<T, NodeClientError> {
        let path = format!("{}{route}", self.base_path(Api::Core));
        let response = self
            .inner
            .transport
            .send(
                method,
                &path,
                route,
                content_type(BINARY_CONTENT_TYPE),
                Some(body),
            )
            .await?;
        let status = response.status;
        let data = response::interpret_binary_write(route, response)?;
        Ok(response::decode_json(route, status, data)?)
    }
}

fn content_type(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
    headers
}

pub(crate) fn json_body<B: Serialize>(body: &B) -> Result<Vec<u8>, NodeClientError> {
    serde_json::to_vec(body).map_err(|error| {
        ProtocolError::Serialization {
            message: error.to_string(),
        }
        .into()
    })
}
