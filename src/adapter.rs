//! Interception adapter boundary.
//!
//! The platform hook that captures outbound requests is installed outside
//! this crate; what it installs is an [`Interceptor`]. The interceptor
//! describes each native request, resolves it against a [`StubRegistry`],
//! and either synthesizes a response, renders a synthetic network error, or
//! forwards the request to the real network stack unmodified.
//!
//! A configured response delay is honored with a tokio timer before
//! delivery, so one delayed response never blocks other resolutions.

use crate::matcher::RequestBody;
use crate::registry::{NetworkError, Resolution, StubRegistry};
use crate::response::StubbedResponse;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Descriptor extracted from a host-native request object.
#[derive(Debug, Clone, Default)]
pub struct OutboundRequest {
    /// HTTP verb, as the host reports it.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Request body, if any.
    pub body: Option<RequestBody>,
    /// Request headers, if any.
    pub headers: Option<HashMap<String, String>>,
}

impl OutboundRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

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

/// Bridge between the host networking layer's native types and the registry.
///
/// Implementations translate in both directions: native request to
/// [`OutboundRequest`] descriptor, and resolution outcome back to whatever
/// response and error objects the host layer expects.
#[async_trait]
pub trait Transport: Send + Sync {
    type Request: Send;
    type Response: Send;
    type Error: Send;

    /// Extract the (method, url, body, headers) descriptor from a native
    /// request.
    fn describe(&self, request: &Self::Request) -> OutboundRequest;

    /// Build a native response carrying the synthesized status, headers, and
    /// body, as if received from the real network.
    fn synthesize(&self, response: StubbedResponse) -> Self::Response;

    /// Build a native network-level error whose description matches the
    /// synthetic failure. No body accompanies it.
    fn network_error(&self, error: NetworkError) -> Self::Error;

    /// Send the request over the real network stack, unmodified.
    async fn forward(&self, request: Self::Request) -> Result<Self::Response, Self::Error>;
}

/// Drives the resolve decision for every request the host layer hands over.
pub struct Interceptor<T> {
    registry: Arc<StubRegistry>,
    transport: T,
}

impl<T: Transport> Interceptor<T> {
    pub fn new(registry: Arc<StubRegistry>, transport: T) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// The registry this interceptor resolves against.
    pub fn registry(&self) -> &StubRegistry {
        &self.registry
    }

    /// Resolve one outbound request and deliver its outcome.
    ///
    /// Once a response is decided, delivery always completes; there are no
    /// cancellation semantics. The configured delay elapses before a
    /// synthesized response is returned.
    pub async fn dispatch(&self, request: T::Request) -> Result<T::Response, T::Error> {
        let descriptor = self.transport.describe(&request);
        let outcome = self.registry.resolve(
            &descriptor.method,
            &descriptor.url,
            descriptor.body.as_ref(),
            descriptor.headers.as_ref(),
        );

        match outcome {
            Resolution::Served(response) => {
                if !response.delay.is_zero() {
                    debug!(delay = ?response.delay, url = %descriptor.url, "delaying stubbed response");
                    tokio::time::sleep(response.delay).await;
                }
                Ok(self.transport.synthesize(response))
            }
            Resolution::Blocked(error) => Err(self.transport.network_error(error)),
            Resolution::PassThrough => self.transport.forward(request).await,
        }
    }
}
