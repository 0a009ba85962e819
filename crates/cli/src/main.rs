//! `nodectl`: command-line access to a ledger node.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: flags, with `NODE_URL`, `NODE_TIMEOUT_MS`,
//!    `NODE_USERNAME` and `NODE_PASSWORD` as environment fallbacks.
//! 2. **Wire observability**: `tracing-subscriber` with an `EnvFilter`
//!    (`RUST_LOG`, default `info`) and an optional JSON formatter. Events from
//!    the `node-client` crate flow through this layer.
//! 3. **Construct the client** and run one command, printing the result as
//!    pretty JSON (hex for raw messages).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use node_client::{BasicCredentials, ClientOptions, Method, NodeClient};
use protocol::MessageId;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nodectl", version, about = "Query and submit to a ledger node")]
struct Cli {
    /// Node endpoint (scheme, host and port).
    #[arg(long, env = "NODE_URL", default_value = "http://127.0.0.1:14265")]
    url: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "NODE_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Basic-auth user name; requires an https endpoint.
    #[arg(long, env = "NODE_USERNAME", requires = "password")]
    username: Option<String>,

    #[arg(long, env = "NODE_PASSWORD", hide_env_values = true, requires = "username")]
    password: Option<String>,

    /// Extra header sent with every request, as `name=value`. Repeatable.
    #[arg(long = "header", value_name = "NAME=VALUE")]
    headers: Vec<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probe node health; exits non-zero when unhealthy.
    Health,
    /// Show node info.
    Info,
    /// Show suggested parents for a new message.
    Tips,
    /// Show a message.
    Message { id: String },
    /// Show a message's metadata.
    Metadata { id: String },
    /// Show a message's children.
    Children { id: String },
    /// Print a message's binary form as hex.
    Raw { id: String },
    /// Show a milestone.
    Milestone { index: u32 },
    /// Show the network's bech32 prefix.
    Hrp,
    /// List connected peers.
    Peers,
    /// Submit a binary message read from a file; the node performs
    /// proof-of-work when the nonce is zero.
    SubmitRaw { path: PathBuf },
    /// Call a plugin endpoint.
    Plugin {
        /// HTTP method.
        #[arg(long, default_value = "GET")]
        method: String,
        /// Plugin prefix, e.g. `participation/`.
        plugin_path: String,
        /// Endpoint below the plugin prefix, e.g. `events`.
        method_path: String,
        /// Query parameter as `key=value`. Repeatable.
        #[arg(long = "query")]
        query: Vec<String>,
        /// JSON request body.
        #[arg(long)]
        body: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        // A subscriber is already installed.
    }
}

fn client_options(cli: &Cli) -> Result<ClientOptions> {
    let mut options = ClientOptions::new();
    if let Some(timeout_ms) = cli.timeout_ms {
        options = options.with_timeout(Duration::from_millis(timeout_ms));
    }
    for header in &cli.headers {
        let Some((name, value)) = header.split_once('=') else {
            bail!("header '{header}' must be NAME=VALUE");
        };
        options = options.with_header(name.trim(), value.trim());
    }
    if let (Some(username), Some(password)) = (&cli.username, &cli.password) {
        options = options.with_credentials(BasicCredentials::new(username, password));
    }
    Ok(options)
}

fn message_id(id: &str) -> Result<MessageId> {
    MessageId::new(id).context("message id must not be empty")
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

/// Process exit status for a health probe result.
fn health_status(healthy: bool) -> u8 {
    if healthy {
        0
    } else {
        1
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let client = NodeClient::new(&cli.url, client_options(&cli)?)
        .with_context(|| format!("invalid node configuration for {}", cli.url))?;
    debug!(endpoint = client.endpoint(), command = ?cli.command, "running command");

    match cli.command {
        Command::Health => {
            let healthy = client.health().await?;
            println!("{}", if healthy { "healthy" } else { "unhealthy" });
            return Ok(ExitCode::from(health_status(healthy)));
        }
        Command::Info => print_json(&client.info().await?)?,
        Command::Tips => print_json(&client.tips().await?)?,
        Command::Message { id } => print_json(&client.message(&message_id(&id)?).await?)?,
        Command::Metadata { id } => {
            print_json(&client.message_metadata(&message_id(&id)?).await?)?
        }
        Command::Children { id } => {
            print_json(&client.message_children(&message_id(&id)?).await?)?
        }
        Command::Raw { id } => {
            let bytes = client.message_raw(&message_id(&id)?).await?;
            println!("{}", to_hex(&bytes));
        }
        Command::Milestone { index } => print_json(&client.milestone(index).await?)?,
        Command::Hrp => println!("{}", client.bech32_hrp().await?),
        Command::Peers => print_json(&client.peers().await?)?,
        Command::SubmitRaw { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            println!("{}", client.submit_message_raw(bytes).await?);
        }
        Command::Plugin {
            method,
            plugin_path,
            method_path,
            query,
            body,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{method}'"))?;
            let body = body
                .map(|body| serde_json::from_str::<Value>(&body))
                .transpose()
                .context("--body must be valid JSON")?;
            let query: Vec<&str> = query.iter().map(String::as_str).collect();
            let result = client
                .plugin_fetch(method, &plugin_path, &method_path, &query, body)
                .await?;
            print_json(&result)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    run(cli).await
}
