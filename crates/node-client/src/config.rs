//! Client options and endpoint validation.
//!
//! [`ClientOptions`] is the caller-facing builder. [`EndpointConfig`] is the
//! validated, immutable form shared by every request a client makes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use protocol::{MessageSerializer, PowProvider};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};

use crate::NodeClientError;

/// Default base path of the node's core REST API.
pub const DEFAULT_BASE_PATH: &str = "/api/v2/";

/// Default base path under which node plugins expose their APIs.
pub const DEFAULT_BASE_PLUGIN_PATH: &str = "/api/plugins/";

/// Username/password pair for HTTP basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    /// Basic-auth user name.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
}

impl BasicCredentials {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Optional capabilities and settings for a [`crate::NodeClient`].
#[derive(Clone)]
pub struct ClientOptions {
    base_path: String,
    base_plugin_path: String,
    timeout: Option<Duration>,
    headers: Vec<(String, String)>,
    credentials: Option<BasicCredentials>,
    pow_provider: Option<Arc<dyn PowProvider>>,
    serializer: Option<Arc<dyn MessageSerializer>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_owned(),
            base_plugin_path: DEFAULT_BASE_PLUGIN_PATH.to_owned(),
            timeout: None,
            headers: Vec::new(),
            credentials: None,
            pow_provider: None,
            serializer: None,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_path", &self.base_path)
            .field("base_plugin_path", &self.base_plugin_path)
            .field("timeout", &self.timeout)
            .field("headers", &self.headers.len())
            .field("credentials", &self.credentials)
            .field("pow_provider", &self.pow_provider.is_some())
            .field("serializer", &self.serializer.is_some())
            .finish()
    }
}

impl ClientOptions {
    /// Creates options with default base paths and no optional capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the core API base path.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the plugin API base path.
    #[must_use]
    pub fn with_base_plugin_path(mut self, base_plugin_path: impl Into<String>) -> Self {
        self.base_plugin_path = base_plugin_path.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Enables HTTP basic authentication. Requires an `https` endpoint.
    ///
    /// Ignored unless both the user name and the password are non-empty.
    #[must_use]
    pub fn with_credentials(mut self, credentials: BasicCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Enables client-side proof-of-work for submissions.
    #[must_use]
    pub fn with_pow_provider(mut self, provider: Arc<dyn PowProvider>) -> Self {
        self.pow_provider = Some(provider);
        self
    }

    /// Sets the binary serializer used to size and hash structured messages.
    #[must_use]
    pub fn with_serializer(mut self, serializer: Arc<dyn MessageSerializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }
}

/// Validated endpoint configuration.
///
/// Immutable after construction and shared read-only by concurrent calls.
pub(crate) struct EndpointConfig {
    pub(crate) endpoint: String,
    pub(crate) base_path: String,
    pub(crate) base_plugin_path: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) headers: HeaderMap,
    pub(crate) authorization: Option<HeaderValue>,
    pub(crate) pow_provider: Option<Arc<dyn PowProvider>>,
    pub(crate) serializer: Option<Arc<dyn MessageSerializer>>,
}

impl EndpointConfig {
    /// Validates `endpoint` and `options`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeClientError::Configuration`] when the endpoint is empty,
    /// credentials are used without `https`, credentials are combined with an
    /// explicit `Authorization` header, or a header is not valid HTTP.
    pub(crate) fn resolve(endpoint: &str, options: ClientOptions) -> Result<Self, NodeClientError> {
        if endpoint.is_empty() {
            return Err(NodeClientError::configuration("The endpoint can not be empty"));
        }
        let endpoint = endpoint.trim_end_matches('/').to_owned();

        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
                NodeClientError::configuration(format!("invalid header name '{name}': {error}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|error| {
                NodeClientError::configuration(format!("invalid value for header '{name}': {error}"))
            })?;
            headers.insert(header_name, header_value);
        }

        // An empty user name or password disables basic auth entirely.
        let credentials = options
            .credentials
            .as_ref()
            .filter(|credentials| {
                !credentials.username.is_empty() && !credentials.password.is_empty()
            });
        let authorization = match credentials {
            Some(credentials) => {
                if !endpoint.to_ascii_lowercase().starts_with("https://") {
                    return Err(NodeClientError::configuration(
                        "Basic authentication requires the endpoint to be https",
                    ));
                }
                // HeaderMap keys are case-insensitive: covers both spellings.
                if headers.contains_key(AUTHORIZATION) {
                    return Err(NodeClientError::configuration(
                        "You can not supply both user/pass and authorization header",
                    ));
                }
                Some(basic_authorization(credentials)?)
            }
            None => None,
        };

        Ok(Self {
            endpoint,
            base_path: options.base_path,
            base_plugin_path: options.base_plugin_path,
            timeout: options.timeout,
            headers,
            authorization,
            pow_provider: options.pow_provider,
            serializer: options.serializer,
        })
    }
}

fn basic_authorization(credentials: &BasicCredentials) -> Result<HeaderValue, NodeClientError> {
    let encoded = BASE64_STANDARD.encode(format!(
        "{}:{}",
        credentials.username, credentials.password
    ));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|error| NodeClientError::configuration(error.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}
