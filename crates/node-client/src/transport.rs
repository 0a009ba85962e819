//! Single-request HTTP transport.
//!
//! Sends one request with merged headers and an optional deadline, and hands
//! back the status and fully buffered body. Status codes are not interpreted
//! here; see [`crate::response`].

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use tracing::{debug, warn};

use crate::config::EndpointConfig;
use crate::NodeClientError;

/// Status and buffered body of one HTTP exchange.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub(crate) status: StatusCode,
    pub(crate) body: Bytes,
}

impl RawResponse {
    /// The canonical reason phrase for the status (e.g. `"Not Found"`).
    pub(crate) fn status_text(&self) -> String {
        self.status
            .canonical_reason()
            .map(str::to_owned)
            .unwrap_or_else(|| self.status.as_u16().to_string())
    }
}

pub(crate) struct Transport {
    http: reqwest::Client,
    config: Arc<EndpointConfig>,
}

impl Transport {
    pub(crate) fn new(config: Arc<EndpointConfig>) -> Result<Self, NodeClientError> {
        // No client-level timeout: the deadline below owns cancellation so it
        // can be reported as a distinct failure kind.
        let http = reqwest::Client::builder()
            .build()
            .map_err(|error| NodeClientError::configuration(error.to_string()))?;
        Ok(Self { http, config })
    }

    pub(crate) fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Performs one request against `{endpoint}{path}`.
    ///
    /// `route` names the call in errors and logs. When a timeout is
    /// configured, the whole exchange (headers and body) must finish inside
    /// it; otherwise the request is dropped and [`NodeClientError::Timeout`]
    /// is returned. Dropping the deadline future releases its timer on every
    /// exit path.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        route: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, NodeClientError> {
        let url = format!("{}{}", self.config.endpoint, path);
        let headers = merge_headers(
            &self.config.headers,
            headers,
            self.config.authorization.as_ref(),
        );
        let mut request = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        debug!(%method, route, "sending request");
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(RawResponse { status, body })
        };

        let outcome = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, exchange).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => {
                    warn!(
                        %method,
                        route,
                        timeout = ?limit,
                        "request timed out"
                    );
                    return Err(NodeClientError::Timeout {
                        route: route.to_owned(),
                    });
                }
            },
            None => exchange.await,
        };

        match outcome {
            Ok(response) => {
                debug!(
                    %method,
                    route,
                    status = response.status.as_u16(),
                    bytes = response.body.len(),
                    "node responded"
                );
                Ok(response)
            }
            Err(source) => {
                warn!(%method, route, error = %source, "request failed");
                Err(NodeClientError::Transport {
                    route: route.to_owned(),
                    source,
                })
            }
        }
    }
}

/// Merges header layers, later layers replacing same-name entries:
/// static headers, then call headers, then the computed `Authorization`.
pub(crate) fn merge_headers(
    static_headers: &HeaderMap,
    call_headers: HeaderMap,
    authorization: Option<&HeaderValue>,
) -> HeaderMap {
    let mut merged = static_headers.clone();
    let mut current = None;
    for (name, value) in call_headers {
        // A `None` name continues the previous header's value list.
        if let Some(name) = name {
            merged.remove(&name);
            current = Some(name);
        }
        if let Some(name) = &current {
            merged.append(name.clone(), value);
        }
    }
    if let Some(authorization) = authorization {
        merged.insert(AUTHORIZATION, authorization.clone());
    }
    merged
}
