//! Deterministic HTTP stubbing for test suites.
//!
//! `webstub` replaces live network calls with pre-programmed responses. A
//! test registers stubs (verb + exact URL + optional body/header matchers +
//! canned response) on a [`StubRegistry`]; while network access is disabled,
//! every outbound request resolved against the registry either receives the
//! matching stub's synthesized response or a synthetic connection-failure
//! value. No real I/O is performed: every response is built in process.
//!
//! # Features
//!
//! - **Request matching**: exact verb and URL, raw or structured body
//!   equality, header subset inclusion
//! - **Canned responses**: raw or JSON bodies, headers, status codes, and
//!   artificial delivery delays
//! - **Call counting**: every stub counts the requests it matched
//! - **Network-access control**: unmatched requests either pass through to
//!   the real network or are blocked with a synthetic error
//! - **YAML fixtures**: stub sets can be loaded from fixture files
//!
//! # Example
//!
//! ```
//! use webstub::{Resolution, ResponseOptions, StubRegistry};
//!
//! let registry = StubRegistry::new();
//! registry.disable_network_access();
//!
//! let stub = registry.stub_request("get", "http://api.test/hello")?;
//! stub.to_return(ResponseOptions::new().body("hello"));
//!
//! match registry.resolve("get", "http://api.test/hello", None, None) {
//!     Resolution::Served(response) => {
//!         assert_eq!(response.status, 200);
//!         assert_eq!(response.body, "hello");
//!     }
//!     other => panic!("expected a stubbed response, got {:?}", other),
//! }
//!
//! // Unmatched requests are blocked while network access is disabled.
//! assert!(matches!(
//!     registry.resolve("get", "http://api.test/other", None, None),
//!     Resolution::Blocked(_)
//! ));
//! # Ok::<(), webstub::Error>(())
//! ```

pub mod adapter;
pub mod config;
pub mod matcher;
pub mod registry;
pub mod response;
pub mod stub;

pub use adapter::{Interceptor, OutboundRequest, Transport};
pub use config::StubFile;
pub use matcher::{BodyMatcher, RequestBody};
pub use registry::{NetworkError, Resolution, StubRegistry};
pub use response::{JsonBody, MatchOptions, ResponseOptions, StubbedResponse};
pub use stub::{Error, Method, Stub};
