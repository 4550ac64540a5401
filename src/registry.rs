//! The stub registry and the match-or-fallback decision.
//!
//! A [`StubRegistry`] owns the ordered stub sequence and the network-access
//! flag for one test run. Tests that need isolation create (or reset) one
//! registry explicitly instead of sharing implicit global state.

use crate::matcher::RequestBody;
use crate::response::StubbedResponse;
use crate::stub::{Error, Stub};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Synthetic connection failure handed to the interception adapter when no
/// stub matched and network access is disabled.
///
/// This is a value produced by [`StubRegistry::resolve`], never raised as a
/// control-flow error inside the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkError {
    description: String,
}

impl NetworkError {
    fn no_stub_registered(method: &str, url: &str) -> Self {
        Self {
            description: format!(
                "network access disabled and no stub registered for {} {}",
                method.to_ascii_uppercase(),
                url
            ),
        }
    }

    /// Human-readable description of the failure. Never empty.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl std::error::Error for NetworkError {}

/// Outcome of resolving one outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A stub matched; deliver this synthesized response.
    Served(StubbedResponse),
    /// No stub matched and network access is enabled; send for real.
    PassThrough,
    /// No stub matched and network access is disabled.
    Blocked(NetworkError),
}

/// Ordered collection of live stubs plus the network-access flag.
///
/// The stub sequence and the flag are independent pieces of state with
/// independent lifecycles: [`reset_stubs`](Self::reset_stubs) never touches
/// the flag. All operations take `&self`; the scan-and-increment performed by
/// [`lookup`](Self::lookup) is atomic per call.
#[derive(Debug, Default)]
pub struct StubRegistry {
    stubs: Mutex<Vec<Stub>>,
    network_access: NetworkAccessFlag,
}

/// Two-state switch controlling fallback on a stub miss. Starts enabled.
#[derive(Debug)]
struct NetworkAccessFlag(AtomicBool);

impl Default for NetworkAccessFlag {
    fn default() -> Self {
        Self(AtomicBool::new(true))
    }
}

impl StubRegistry {
    /// Create an empty registry with network access enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stub for the given verb and exact URL and return its
    /// handle for further configuration.
    ///
    /// No uniqueness is enforced; two stubs with identical method and URL may
    /// coexist, and lookups serve the first registered.
    pub fn stub_request(&self, method: &str, url: impl Into<String>) -> Result<Stub, Error> {
        let stub = Stub::new(method, url)?;
        debug!(method = %stub.method(), url = %stub.url(), "stub registered");
        self.lock_stubs().push(stub.clone());
        Ok(stub)
    }

    /// Drop every registered stub. Leaves the network-access flag untouched.
    pub fn reset_stubs(&self) {
        let mut stubs = self.lock_stubs();
        debug!(count = stubs.len(), "stub registry cleared");
        stubs.clear();
    }

    /// Number of live stubs.
    pub fn stub_count(&self) -> usize {
        self.lock_stubs().len()
    }

    /// Allow unmatched requests to reach the real network. Idempotent.
    pub fn enable_network_access(&self) {
        self.network_access.0.store(true, Ordering::SeqCst);
    }

    /// Block unmatched requests with a synthetic error. Idempotent.
    pub fn disable_network_access(&self) {
        self.network_access.0.store(false, Ordering::SeqCst);
    }

    pub fn network_access_enabled(&self) -> bool {
        self.network_access.0.load(Ordering::SeqCst)
    }

    /// Return the first stub, in registration order, matching the request.
    ///
    /// Matching short-circuits: only the returned stub's call counter is
    /// incremented, stubs after the first hit are not evaluated.
    pub fn lookup(
        &self,
        method: &str,
        url: &str,
        body: Option<&RequestBody>,
        headers: Option<&HashMap<String, String>>,
    ) -> Option<Stub> {
        let stubs = self.lock_stubs();
        stubs
            .iter()
            .find(|stub| stub.matches(method, url, body, headers))
            .cloned()
    }

    /// Decide the outcome for one outbound request.
    ///
    /// On a hit, the matched stub's response fields are snapshotted into a
    /// [`StubbedResponse`]; `json` configuration was already baked into the
    /// body and headers at configuration time. On a miss, the network-access
    /// flag picks between [`Resolution::PassThrough`] and
    /// [`Resolution::Blocked`].
    pub fn resolve(
        &self,
        method: &str,
        url: &str,
        body: Option<&RequestBody>,
        headers: Option<&HashMap<String, String>>,
    ) -> Resolution {
        match self.lookup(method, url, body, headers) {
            Some(stub) => {
                debug!(method, url, "request matched stub");
                Resolution::Served(StubbedResponse {
                    status: stub.response_status_code(),
                    headers: stub.response_headers(),
                    body: stub.response_body(),
                    delay: stub.response_delay(),
                })
            }
            None if self.network_access_enabled() => {
                debug!(method, url, "no stub matched, passing through");
                Resolution::PassThrough
            }
            None => {
                warn!(method, url, "no stub matched and network access is disabled");
                Resolution::Blocked(NetworkError::no_stub_registered(method, url))
            }
        }
    }

    fn lock_stubs(&self) -> std::sync::MutexGuard<'_, Vec<Stub>> {
        self.stubs.lock().expect("stub registry lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::BodyMatcher;
    use crate::response::{MatchOptions, ResponseOptions};
    use serde_json::json;

    const URL: &str = "http://www.google.com/search";

    #[test]
    fn stub_request_returns_the_new_stub() {
        let registry = StubRegistry::new();
        let stub = registry.stub_request("get", URL).unwrap();

        assert_eq!(stub.url(), URL);
        assert_eq!(registry.stub_count(), 1);
    }

    #[test]
    fn stub_request_propagates_invalid_methods() {
        let registry = StubRegistry::new();
        assert!(registry.stub_request("invalid", URL).is_err());
        assert_eq!(registry.stub_count(), 0);
    }

    #[test]
    fn configuration_after_registration_is_visible_to_lookups() {
        let registry = StubRegistry::new();
        let stub = registry.stub_request("get", URL).unwrap();
        stub.to_return(ResponseOptions::new().body("hello"));

        match registry.resolve("get", URL, None, None) {
            Resolution::Served(response) => assert_eq!(response.body, "hello"),
            other => panic!("expected Served, got {:?}", other),
        }
    }

    #[test]
    fn lookup_returns_the_first_match_and_short_circuits() {
        let registry = StubRegistry::new();
        let first = registry.stub_request("get", URL).unwrap();
        let second = registry.stub_request("get", URL).unwrap();

        let hit = registry.lookup("get", URL, None, None).unwrap();
        assert_eq!(hit.call_count(), 1);
        assert_eq!(first.call_count(), 1);
        // The second stub was never evaluated.
        assert_eq!(second.call_count(), 0);
    }

    #[test]
    fn lookup_returns_none_without_a_match() {
        let registry = StubRegistry::new();
        registry.stub_request("get", URL).unwrap();

        assert!(registry.lookup("post", URL, None, None).is_none());
        assert!(registry.lookup("get", "http://other/", None, None).is_none());
    }

    #[test]
    fn reset_stubs_clears_the_sequence_and_is_idempotent() {
        let registry = StubRegistry::new();
        registry.stub_request("get", URL).unwrap();
        registry.stub_request("post", URL).unwrap();

        registry.reset_stubs();
        assert_eq!(registry.stub_count(), 0);

        registry.reset_stubs();
        assert_eq!(registry.stub_count(), 0);
    }

    #[test]
    fn reset_stubs_leaves_the_network_access_flag_alone() {
        let registry = StubRegistry::new();
        registry.stub_request("get", URL).unwrap();
        registry.disable_network_access();

        registry.reset_stubs();

        assert!(!registry.network_access_enabled());
        match registry.resolve("get", URL, None, None) {
            Resolution::Blocked(error) => assert!(!error.description().is_empty()),
            other => panic!("expected Blocked, got {:?}", other),
        }
    }

    #[test]
    fn network_access_toggles_are_idempotent() {
        let registry = StubRegistry::new();
        assert!(registry.network_access_enabled());

        registry.disable_network_access();
        registry.disable_network_access();
        assert!(!registry.network_access_enabled());

        registry.enable_network_access();
        registry.enable_network_access();
        assert!(registry.network_access_enabled());
    }

    #[test]
    fn unmatched_requests_pass_through_while_access_is_enabled() {
        let registry = StubRegistry::new();
        assert_eq!(registry.resolve("get", URL, None, None), Resolution::PassThrough);
    }

    #[test]
    fn unmatched_requests_are_blocked_while_access_is_disabled() {
        let registry = StubRegistry::new();
        registry.disable_network_access();

        match registry.resolve("get", URL, None, None) {
            Resolution::Blocked(error) => {
                assert!(error.description().contains("GET"));
                assert!(error.description().contains(URL));
            }
            other => panic!("expected Blocked, got {:?}", other),
        }
    }

    #[test]
    fn served_response_carries_body_headers_and_status() {
        let registry = StubRegistry::new();
        registry
            .stub_request("get", "http://x/")
            .unwrap()
            .to_return(
                ResponseOptions::new()
                    .body("hello")
                    .headers([("Content-Type", "text/plain")]),
            );

        match registry.resolve("get", "http://x/", None, None) {
            Resolution::Served(response) => {
                assert_eq!(response.status, 200);
                assert_eq!(response.body, "hello");
                assert_eq!(
                    response.headers.get("Content-Type").map(String::as_str),
                    Some("text/plain")
                );
            }
            other => panic!("expected Served, got {:?}", other),
        }
    }

    #[test]
    fn body_matcher_gates_resolution() {
        let registry = StubRegistry::new();
        registry.disable_network_access();
        registry
            .stub_request("post", URL)
            .unwrap()
            .with(MatchOptions::new().body(BodyMatcher::fields([("q", "search")])));

        let matching = RequestBody::fields([("q", "search")]);
        assert!(matches!(
            registry.resolve("post", URL, Some(&matching), None),
            Resolution::Served(_)
        ));

        let empty = RequestBody::Fields(Default::default());
        assert!(matches!(
            registry.resolve("post", URL, Some(&empty), None),
            Resolution::Blocked(_)
        ));
    }

    #[test]
    fn json_response_with_status_code() {
        let registry = StubRegistry::new();
        registry
            .stub_request("get", URL)
            .unwrap()
            .to_return(
                ResponseOptions::new()
                    .json(json!({"error": "Not Found"}))
                    .status_code(400),
            );

        match registry.resolve("get", URL, None, None) {
            Resolution::Served(response) => {
                assert_eq!(response.status, 400);
                assert_eq!(response.body, r#"{"error":"Not Found"}"#);
                assert_eq!(
                    response.headers.get("Content-Type").map(String::as_str),
                    Some("application/json")
                );
            }
            other => panic!("expected Served, got {:?}", other),
        }
    }
}
