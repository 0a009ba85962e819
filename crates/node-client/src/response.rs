//! Response classification.
//!
//! Turns a [`RawResponse`] into either a decoded result or a [`ClientError`].
//! The node reports failures in different shapes depending on which layer
//! rejected the request: structured JSON from the application, partial or
//! non-standard JSON from middleware, plain text from a proxy or the HTTP
//! framework. Failure bodies are run through an ordered list of extraction
//! tiers; the first one that finds a message wins, and the HTTP status text
//! is used when none do.

use bytes::Bytes;
use protocol::ClientError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::transport::RawResponse;

// ---------------------------------------------------------------------------
// Error extraction tiers
// ---------------------------------------------------------------------------

/// Outcome of one extraction tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Extraction {
    Found {
        message: String,
        code: Option<String>,
    },
    NotFound,
}

impl Extraction {
    fn into_found(self) -> Option<(String, Option<String>)> {
        match self {
            Self::Found { message, code } => Some((message, code)),
            Self::NotFound => None,
        }
    }
}

type Tier = fn(&[u8]) -> Extraction;

/// Attempted in order; each tier tolerates any body without failing.
const ERROR_TIERS: [Tier; 3] = [typed_envelope, loose_envelope, plain_text];

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// `{"error": {"message": "...", "code": "..."}}` with string fields.
fn typed_envelope(body: &[u8]) -> Extraction {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => Extraction::Found {
            message: envelope.error.message,
            code: envelope.error.code,
        },
        _ => Extraction::NotFound,
    }
}

/// Same envelope, re-read permissively: numeric codes and non-string
/// messages are stringified instead of rejected.
fn loose_envelope(body: &[u8]) -> Extraction {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return Extraction::NotFound;
    };
    let error = &value["error"];
    let message = match &error["message"] {
        Value::Null => return Extraction::NotFound,
        Value::String(text) if text.is_empty() => return Extraction::NotFound,
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    Extraction::Found {
        message,
        code: json_code(&error["code"]),
    }
}

/// Plain-text body, optionally shaped `code=<digits>, message=<rest>`.
///
/// JSON objects were already examined by the earlier tiers and are skipped.
fn plain_text(body: &[u8]) -> Extraction {
    if body.is_empty() || matches!(serde_json::from_slice::<Value>(body), Ok(Value::Object(_))) {
        return Extraction::NotFound;
    }
    let text = String::from_utf8_lossy(body);
    match split_coded_text(&text) {
        Some((code, message)) => Extraction::Found {
            message,
            code: Some(code),
        },
        None => Extraction::Found {
            message: text.into_owned(),
            code: None,
        },
    }
}

/// Finds the first `code=<digits>, message=<rest of line>` in `text`.
fn split_coded_text(text: &str) -> Option<(String, String)> {
    const CODE: &str = "code=";
    const MESSAGE: &str = ", message=";

    let mut from = 0;
    while let Some(offset) = text[from..].find(CODE) {
        let start = from + offset + CODE.len();
        let rest = &text[start..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            if let Some(message) = rest[digits..].strip_prefix(MESSAGE) {
                let message = message.lines().next().unwrap_or_default();
                return Some((rest[..digits].to_owned(), message.to_owned()));
            }
        }
        from = start;
    }
    None
}

fn json_code(code: &Value) -> Option<String> {
    match code {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn has_embedded_error(value: &Value) -> bool {
    value
        .get("error")
        .is_some_and(|error| !matches!(error, Value::Null | Value::Bool(false)))
}

/// Builds the [`ClientError`] for a failed JSON-path response.
///
/// Falls back to the status text and the numeric status as the code.
pub(crate) fn extract_error(route: &str, response: &RawResponse) -> ClientError {
    let status = response.status.as_u16();
    let found = ERROR_TIERS
        .iter()
        .find_map(|tier| tier(&response.body).into_found());
    let (message, code) = match found {
        Some((message, code)) => (message, code.unwrap_or_else(|| status.to_string())),
        None => (response.status_text(), status.to_string()),
    };
    ClientError::new(message, route, status, Some(code))
}

// ---------------------------------------------------------------------------
// JSON path
// ---------------------------------------------------------------------------

/// Classifies a response to a JSON request.
///
/// `204 No Content` yields an empty object. Any other success status whose
/// body decodes as JSON without an embedded `error` yields the decoded body.
/// Everything else becomes a [`ClientError`].
pub(crate) fn interpret_json(route: &str, response: &RawResponse) -> Result<Value, ClientError> {
    if response.status.is_success() {
        if response.status == StatusCode::NO_CONTENT {
            return Ok(Value::Object(Map::new()));
        }
        if let Ok(value) = serde_json::from_slice::<Value>(&response.body) {
            if !has_embedded_error(&value) {
                return Ok(value);
            }
        }
    }
    let error = extract_error(route, response);
    warn!(
        route,
        status = error.http_status,
        code = error.code.as_deref().unwrap_or_default(),
        error_message = %error.message,
        "node rejected request"
    );
    Err(error)
}

/// Converts a decoded success body into the caller's expected type.
pub(crate) fn decode_json<T: DeserializeOwned>(
    route: &str,
    status: StatusCode,
    value: Value,
) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|error| {
        ClientError::new(
            format!("Unexpected response body: {error}"),
            route,
            status.as_u16(),
            None,
        )
    })
}

// ---------------------------------------------------------------------------
// Binary path
// ---------------------------------------------------------------------------

/// Classifies a response to an octet-stream `GET`: success bodies are
/// returned unmodified, without any JSON parsing.
pub(crate) fn interpret_binary_read(route: &str, response: RawResponse) -> Result<Bytes, ClientError> {
    if response.status.is_success() {
        return Ok(response.body);
    }
    Err(binary_failure(route, &response))
}

/// Classifies a response to an octet-stream write (`POST`, `PUT`, ...):
/// success bodies are JSON and their `data` field is the result.
pub(crate) fn interpret_binary_write(route: &str, response: RawResponse) -> Result<Value, ClientError> {
    if !response.status.is_success() {
        return Err(binary_failure(route, &response));
    }
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(mut value) if !has_embedded_error(&value) => {
            Ok(value.get_mut("data").map(Value::take).unwrap_or_default())
        }
        Ok(value) => Err(binary_error(route, &response, Some(&value))),
        Err(error) => Err(ClientError::new(
            format!("Invalid JSON response: {error}"),
            route,
            response.status.as_u16(),
            None,
        )),
    }
}

fn binary_failure(route: &str, response: &RawResponse) -> ClientError {
    let value = serde_json::from_slice::<Value>(&response.body).ok();
    let error = binary_error(route, response, value.as_ref());
    warn!(
        route,
        status = error.http_status,
        error_message = %error.message,
        "node rejected binary request"
    );
    error
}

fn binary_error(route: &str, response: &RawResponse, value: Option<&Value>) -> ClientError {
    let error = value.and_then(|value| value.get("error"));
    let message = error
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| response.status_text());
    let code = error.and_then(|error| error.get("code")).and_then(json_code);
    ClientError::new(message, route, response.status.as_u16(), code)
}
