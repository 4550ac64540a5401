//! Request comparison logic.
//!
//! Pure predicates shared by [`Stub::matches`](crate::Stub::matches) and the
//! registry's lookup: body equality under the raw/structured rules and header
//! subset inclusion. URLs are compared by exact string equality only; pattern
//! matching is deliberately out of scope.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Body of an outbound request as seen by the matcher.
///
/// Structured bodies are canonically keyed by strings; callers normalize at
/// this boundary rather than inside the comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// An opaque payload compared byte-for-byte.
    Raw(String),
    /// A key-value payload (form fields, decoded JSON object).
    Fields(BTreeMap<String, Value>),
}

impl RequestBody {
    /// Build a raw body.
    pub fn raw(body: impl Into<String>) -> Self {
        Self::Raw(body.into())
    }

    /// Build a structured body from key-value entries.
    pub fn fields<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Fields(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for RequestBody {
    fn from(body: &str) -> Self {
        Self::Raw(body.to_string())
    }
}

impl From<String> for RequestBody {
    fn from(body: String) -> Self {
        Self::Raw(body)
    }
}

impl From<BTreeMap<String, Value>> for RequestBody {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self::Fields(fields)
    }
}

/// Declared expectation for a request body.
///
/// A declared matcher makes a body mandatory on the request side: a stub that
/// expects a body never matches a request without one, and raw/structured
/// shapes never cross-match.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyMatcher {
    /// The request body must be a raw string identical to this one.
    Raw(String),
    /// The request body must be structured and equal to these fields.
    Fields(BTreeMap<String, Value>),
}

impl BodyMatcher {
    /// Build a raw-string matcher.
    pub fn raw(body: impl Into<String>) -> Self {
        Self::Raw(body.into())
    }

    /// Build a structured matcher from key-value entries.
    pub fn fields<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Fields(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Check an incoming body against this expectation.
    pub fn matches(&self, body: Option<&RequestBody>) -> bool {
        match (self, body) {
            (Self::Raw(expected), Some(RequestBody::Raw(actual))) => expected == actual,
            (Self::Fields(expected), Some(RequestBody::Fields(actual))) => expected == actual,
            _ => false,
        }
    }
}

impl From<&str> for BodyMatcher {
    fn from(body: &str) -> Self {
        Self::Raw(body.to_string())
    }
}

impl From<String> for BodyMatcher {
    fn from(body: String) -> Self {
        Self::Raw(body)
    }
}

impl From<BTreeMap<String, Value>> for BodyMatcher {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self::Fields(fields)
    }
}

/// Subset inclusion for headers: every expected name must be present in the
/// incoming headers with an equal value. Header names compare
/// case-insensitively; values compare exactly. Extra incoming headers are
/// ignored.
pub(crate) fn headers_include(
    expected: &HashMap<String, String>,
    actual: Option<&HashMap<String, String>>,
) -> bool {
    expected.iter().all(|(name, value)| {
        actual
            .and_then(|headers| {
                headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .is_some_and(|actual_value| actual_value == value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_matcher_requires_identical_raw_body() {
        let matcher = BodyMatcher::raw("raw body");

        assert!(matcher.matches(Some(&RequestBody::raw("raw body"))));
        assert!(!matcher.matches(Some(&RequestBody::raw("other body"))));
        assert!(!matcher.matches(Some(&RequestBody::fields([("q", "query")]))));
        assert!(!matcher.matches(None));
    }

    #[test]
    fn fields_matcher_requires_equal_field_sets() {
        let matcher = BodyMatcher::fields([("q", "query")]);

        assert!(matcher.matches(Some(&RequestBody::fields([("q", "query")]))));
        assert!(!matcher.matches(Some(&RequestBody::fields([("q", "other")]))));
        assert!(!matcher.matches(Some(&RequestBody::Fields(BTreeMap::new()))));
        assert!(!matcher.matches(Some(&RequestBody::raw("q=query"))));
        assert!(!matcher.matches(None));
    }

    #[test]
    fn fields_matcher_compares_non_string_values() {
        let matcher = BodyMatcher::fields([("page", json!(2)), ("q", json!("x"))]);

        assert!(matcher.matches(Some(&RequestBody::fields([
            ("page", json!(2)),
            ("q", json!("x")),
        ]))));
        assert!(!matcher.matches(Some(&RequestBody::fields([
            ("page", json!("2")),
            ("q", json!("x")),
        ]))));
    }

    #[test]
    fn header_subset_ignores_extra_headers() {
        let expected = HashMap::from([("Authorization".to_string(), "secret".to_string())]);
        let actual = HashMap::from([
            ("Authorization".to_string(), "secret".to_string()),
            ("X-Extra".to_string(), "42".to_string()),
        ]);

        assert!(headers_include(&expected, Some(&actual)));
    }

    #[test]
    fn header_subset_fails_on_missing_or_mismatched_header() {
        let expected = HashMap::from([("Authorization".to_string(), "secret".to_string())]);

        let missing = HashMap::from([("X-Extra".to_string(), "42".to_string())]);
        assert!(!headers_include(&expected, Some(&missing)));

        let mismatched = HashMap::from([("Authorization".to_string(), "other".to_string())]);
        assert!(!headers_include(&expected, Some(&mismatched)));

        assert!(!headers_include(&expected, None));
    }

    #[test]
    fn header_names_compare_case_insensitively() {
        let expected = HashMap::from([("content-type".to_string(), "text/plain".to_string())]);
        let actual = HashMap::from([("Content-Type".to_string(), "text/plain".to_string())]);

        assert!(headers_include(&expected, Some(&actual)));
    }
}
