//! Stub definitions: one request pattern plus its canned response.
//!
//! A [`Stub`] is a cheaply-clonable handle over shared state. The registry
//! stores a clone of every handle it returns, so configuration applied after
//! registration (`with`, `to_return`) is visible to subsequent lookups.

use crate::matcher::{headers_include, BodyMatcher, RequestBody};
use crate::response::{MatchOptions, ResponseOptions};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Errors produced while building stubs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Stub construction was given a verb outside the supported set.
    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),
}

/// The HTTP verbs a stub may be registered for.
///
/// Parsed case-insensitively; displayed lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
    ];

    /// Parse a verb, case-insensitively.
    pub fn parse(method: &str) -> Result<Self, Error> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "patch" => Ok(Method::Patch),
            "delete" => Ok(Method::Delete),
            "head" => Ok(Method::Head),
            "options" => Ok(Method::Options),
            _ => Err(Error::InvalidMethod(method.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Options => "options",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::parse(s)
    }
}

/// Mutable configuration behind the stub handle.
#[derive(Debug)]
struct StubState {
    body_matcher: Option<BodyMatcher>,
    header_matcher: Option<HashMap<String, String>>,
    response_body: String,
    response_headers: BTreeMap<String, String>,
    response_status: u16,
    response_delay: Duration,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            body_matcher: None,
            header_matcher: None,
            response_body: String::new(),
            response_headers: BTreeMap::new(),
            response_status: 200,
            response_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug)]
struct Inner {
    method: Method,
    url: String,
    state: Mutex<StubState>,
    call_count: AtomicU64,
}

/// A registered request pattern plus its canned response.
#[derive(Clone)]
pub struct Stub {
    inner: Arc<Inner>,
}

impl Stub {
    /// Build a stub for the given verb and exact URL.
    ///
    /// Fails immediately when `method` is not one of the supported verbs.
    pub fn new(method: &str, url: impl Into<String>) -> Result<Self, Error> {
        let method = Method::parse(method)?;
        Ok(Self {
            inner: Arc::new(Inner {
                method,
                url: url.into(),
                state: Mutex::new(StubState::default()),
                call_count: AtomicU64::new(0),
            }),
        })
    }

    pub fn method(&self) -> Method {
        self.inner.method
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Attach request-side expectations. Omitted fields keep their current
    /// values; calls chain.
    pub fn with(&self, options: MatchOptions) -> &Self {
        let mut state = self.lock_state();
        if let Some(body) = options.body {
            state.body_matcher = Some(body);
        }
        if let Some(headers) = options.headers {
            state.header_matcher = Some(headers);
        }
        self
    }

    /// Configure the canned response. Any subset of fields may be supplied;
    /// later calls overwrite earlier ones per field, and an empty call is a
    /// no-op.
    ///
    /// `headers` replaces the response header map wholesale. `json` encodes
    /// the body (verbatim for pre-encoded strings, compact serialization for
    /// structured values) and then merges `Content-Type: application/json`
    /// into the headers in effect, including ones replaced in the same call.
    pub fn to_return(&self, options: ResponseOptions) -> &Self {
        let mut state = self.lock_state();
        if let Some(headers) = options.headers {
            state.response_headers = headers;
        }
        if let Some(body) = options.body {
            state.response_body = body;
        }
        if let Some(json) = options.json {
            state.response_body = json.encode();
            state
                .response_headers
                .insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some(status_code) = options.status_code {
            state.response_status = status_code;
        }
        if let Some(delay) = options.delay {
            state.response_delay = delay;
        }
        self
    }

    /// Evaluate this stub against an incoming request.
    ///
    /// True iff the verb and URL match exactly, the body satisfies the
    /// declared body matcher (if any), and every declared header is present
    /// and equal. The call counter increments only on a true result; the verb
    /// is compared case-insensitively and an unknown verb simply never
    /// matches.
    pub fn matches(
        &self,
        method: &str,
        url: &str,
        body: Option<&RequestBody>,
        headers: Option<&HashMap<String, String>>,
    ) -> bool {
        if !method.eq_ignore_ascii_case(self.inner.method.as_str()) {
            return false;
        }
        if url != self.inner.url {
            return false;
        }

        {
            let state = self.lock_state();
            if let Some(matcher) = &state.body_matcher {
                if !matcher.matches(body) {
                    return false;
                }
            }
            if let Some(expected) = &state.header_matcher {
                if !headers_include(expected, headers) {
                    return false;
                }
            }
        }

        self.inner.call_count.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Number of requests this stub has matched.
    pub fn call_count(&self) -> u64 {
        self.inner.call_count.load(Ordering::Relaxed)
    }

    pub fn response_body(&self) -> String {
        self.lock_state().response_body.clone()
    }

    pub fn response_headers(&self) -> BTreeMap<String, String> {
        self.lock_state().response_headers.clone()
    }

    pub fn response_status_code(&self) -> u16 {
        self.lock_state().response_status
    }

    pub fn response_delay(&self) -> Duration {
        self.lock_state().response_delay
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, StubState> {
        self.inner.state.lock().expect("stub state lock poisoned")
    }
}

impl fmt::Debug for Stub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stub")
            .field("method", &self.inner.method)
            .field("url", &self.inner.url)
            .field("call_count", &self.call_count())
            .finish()
    }
}
