//! Declarative stub fixtures.
//!
//! Stub sets can live in YAML files next to a suite's other fixtures and be
//! applied to a registry in one call, instead of being built in code:
//!
//! ```yaml
//! stubs:
//!   - method: get
//!     url: http://api.test/users
//!     response:
//!       status: 200
//!       json:
//!         users: []
//! ```

use crate::matcher::BodyMatcher;
use crate::registry::StubRegistry;
use crate::response::{JsonBody, MatchOptions, ResponseOptions};
use crate::stub::{Method, Stub};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

/// A YAML stub fixture file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StubFile {
    /// Stub definitions, registered in file order.
    #[serde(default)]
    pub stubs: Vec<StubDefinition>,
}

impl StubFile {
    /// Load and validate a fixture file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: Self = serde_yaml::from_str(&content)?;
        file.validate()?;
        Ok(file)
    }

    /// Parse and validate fixtures from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let file: Self = serde_yaml::from_str(yaml)?;
        file.validate()?;
        Ok(file)
    }

    /// Validate every definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, stub) in self.stubs.iter().enumerate() {
            stub.validate()
                .map_err(|e| anyhow::anyhow!("stub {}: {}", i, e))?;
        }
        Ok(())
    }

    /// Register every definition with the registry, in file order, returning
    /// the created stub handles.
    pub fn apply(&self, registry: &StubRegistry) -> anyhow::Result<Vec<Stub>> {
        self.stubs
            .iter()
            .map(|definition| definition.register(registry))
            .collect()
    }
}

/// One stub in a fixture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StubDefinition {
    /// HTTP verb, case-insensitive.
    pub method: String,

    /// Exact URL to match.
    pub url: String,

    /// Request-side expectations.
    #[serde(default)]
    pub request: Option<RequestExpectation>,

    /// Canned response.
    #[serde(default)]
    pub response: Option<ResponseDefinition>,
}

impl StubDefinition {
    /// Validate the definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        Method::parse(&self.method)?;
        if self.url.is_empty() {
            anyhow::bail!("url cannot be empty");
        }
        if let Some(response) = &self.response {
            response.validate()?;
        }
        Ok(())
    }

    fn register(&self, registry: &StubRegistry) -> anyhow::Result<Stub> {
        let stub = registry.stub_request(&self.method, &self.url)?;
        if let Some(request) = &self.request {
            stub.with(request.to_options());
        }
        if let Some(response) = &self.response {
            stub.to_return(response.to_options());
        }
        Ok(stub)
    }
}

/// Request-side expectations for a fixture stub.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RequestExpectation {
    /// Required request body: a raw string or a key-value mapping.
    #[serde(default)]
    pub body: Option<BodyExpectation>,

    /// Headers that must be present and equal on the request.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

impl RequestExpectation {
    fn to_options(&self) -> MatchOptions {
        let mut options = MatchOptions::new();
        options.body = self.body.as_ref().map(BodyExpectation::to_matcher);
        options.headers = self.headers.clone();
        options
    }
}

/// Body expectation as written in YAML: either a raw string or a mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BodyExpectation {
    Raw(String),
    Fields(BTreeMap<String, Value>),
}

impl BodyExpectation {
    fn to_matcher(&self) -> BodyMatcher {
        match self {
            Self::Raw(body) => BodyMatcher::Raw(body.clone()),
            Self::Fields(fields) => BodyMatcher::Fields(fields.clone()),
        }
    }
}

/// Canned response for a fixture stub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseDefinition {
    /// HTTP status code.
    #[serde(default = "default_status")]
    pub status: u16,

    /// Response headers.
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,

    /// Raw response body.
    #[serde(default)]
    pub body: Option<String>,

    /// JSON response body. A string value is used verbatim; any other value
    /// is serialized to compact JSON. Sets the Content-Type header.
    #[serde(default)]
    pub json: Option<Value>,

    /// Artificial delay before delivery, in milliseconds.
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

fn default_status() -> u16 {
    200
}

impl ResponseDefinition {
    /// Validate the response definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.status < 100 || self.status > 599 {
            anyhow::bail!("invalid status code: {}", self.status);
        }
        Ok(())
    }

    fn to_options(&self) -> ResponseOptions {
        let mut options = ResponseOptions::new();
        options.body = self.body.clone();
        options.json = self.json.clone().map(|value| match value {
            Value::String(text) => JsonBody::Text(text),
            other => JsonBody::Value(other),
        });
        options.headers = self.headers.clone();
        options.status_code = Some(self.status);
        options.delay = self.delay_ms.map(Duration::from_millis);
        options
    }
}
