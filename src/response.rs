//! Response synthesis configuration.
//!
//! Option structs consumed by [`Stub::with`](crate::Stub::with) and
//! [`Stub::to_return`](crate::Stub::to_return), and the synthesized response
//! record handed to the interception adapter on a hit.

use crate::matcher::BodyMatcher;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// JSON payload accepted by [`ResponseOptions::json`].
///
/// A pre-encoded string is used as the body verbatim; a structured value is
/// serialized to compact JSON at configuration time.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonBody {
    /// Already-encoded JSON text, not re-encoded.
    Text(String),
    /// A structured value, serialized with `serde_json`.
    Value(Value),
}

impl JsonBody {
    pub(crate) fn encode(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Value(value) => value.to_string(),
        }
    }
}

impl From<&str> for JsonBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for JsonBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for JsonBody {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Request-side expectations attached to a stub via `with`.
///
/// Every field is optional; omitted fields leave the stub's current
/// expectations untouched.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    /// Required request body (raw or structured).
    pub body: Option<BodyMatcher>,
    /// Headers that must be present and equal on the request.
    pub headers: Option<HashMap<String, String>>,
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the request body to equal the given matcher.
    pub fn body(mut self, body: impl Into<BodyMatcher>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Require the given headers to be present on the request.
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = Some(
            headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

/// Response fields set by `to_return`.
///
/// Any subset may be supplied; later calls overwrite earlier ones per field,
/// and an empty set of options is a no-op. `json` wins over `body` when both
/// are given in the same call, and adds a `Content-Type: application/json`
/// header merged into (not replacing) the headers in effect.
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions {
    /// Raw response body, used verbatim.
    pub body: Option<String>,
    /// JSON response body; also sets the Content-Type header.
    pub json: Option<JsonBody>,
    /// Replacement for the full response header map.
    pub headers: Option<BTreeMap<String, String>>,
    /// Response status code.
    pub status_code: Option<u16>,
    /// Artificial delay before the response is delivered.
    pub delay: Option<Duration>,
}

impl ResponseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response body verbatim.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON response body.
    pub fn json(mut self, json: impl Into<JsonBody>) -> Self {
        self.json = Some(json.into());
        self
    }

    /// Replace the response headers with exactly this mapping.
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = Some(
            headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set the response status code.
    pub fn status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Delay delivery of the response by this duration.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Snapshot of a matched stub's response fields, taken at resolve time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubbedResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub delay: Duration,
}
