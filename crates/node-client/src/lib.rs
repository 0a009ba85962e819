//! HTTP client for a single ledger node.
//!
//! Talks to one node's REST API: validates and signs requests, classifies
//! responses into results or [`ClientError`](protocol::ClientError)s, and
//! submits messages, optionally computing proof-of-work locally through a
//! [`PowProvider`](protocol::PowProvider).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP details (header merging, basic auth, timeouts,
//! the node's several error body shapes) live here. Message rules and the
//! capability traits come from the [`protocol`] crate.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | `config` | `ClientOptions` builder and endpoint validation |
//! | `transport` | One request with merged headers and an optional deadline |
//! | `response` | JSON and binary response classification |
//! | `client` | `NodeClient` and the REST accessors |
//! | `submit` | Structured and raw message submission |
//! | `models` | Typed bodies for `info` and `tips` |
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> Result<(), node_client::NodeClientError> {
//! use std::time::Duration;
//! use node_client::{ClientOptions, NodeClient};
//!
//! let client = NodeClient::new(
//!     "https://node.example:14265",
//!     ClientOptions::new().with_timeout(Duration::from_secs(10)),
//! )?;
//! if client.health().await? {
//!     let info = client.info().await?;
//!     println!("{} {}", info.name, info.protocol.network_name);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod models;
mod response;
mod submit;
#[cfg(test)]
mod test_support;
mod transport;

pub use client::NodeClient;
pub use config::{BasicCredentials, ClientOptions, DEFAULT_BASE_PATH, DEFAULT_BASE_PLUGIN_PATH};
pub use error::NodeClientError;
pub use models::{NodeInfo, ProtocolParameters, Tips};

pub use reqwest::Method;
