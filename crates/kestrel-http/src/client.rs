//! HTTP client implementation

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::{header::HeaderMap, Method};
use tracing::debug;

use crate::{
    body::Body,
    builder::ClientBuilder,
    config::HttpConfig,
    error::Result,
    mock::MockRegistry,
    rate_limit::RateLimiter,
    request::Request,
    response::Response,
    transport::{ReqwestTransport, Transport},
};

/// Mockable HTTP client trait
#[async_trait]
pub trait HttpClientTrait: Send + Sync {
    /// Execute a GET request
    async fn get(&self, url: &str) -> Result<Response>;

    /// Execute a POST request
    async fn post(&self, url: &str, body: Body) -> Result<Response>;

    /// Execute a PUT request
    async fn put(&self, url: &str, body: Body) -> Result<Response>;

    /// Execute a PATCH request
    async fn patch(&self, url: &str, body: Body) -> Result<Response>;

    /// Execute a DELETE request
    async fn delete(&self, url: &str) -> Result<Response>;

    /// Execute a HEAD request
    async fn head(&self, url: &str) -> Result<Response>;

    /// Execute an OPTIONS request
    async fn options(&self, url: &str) -> Result<Response>;

    /// Execute a custom HTTP request, e.g. one carrying per-call headers
    /// built with [`Request::get`] and friends
    async fn execute(&self, request: Request) -> Result<Response>;
}

/// Configured HTTP client
///
/// Cloning is cheap; clones share the transport, rate limiter and mock
/// registry.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) config: HttpConfig,
    pub(crate) headers: HeaderMap,
    pub(crate) limiter: Arc<dyn RateLimiter>,
    pub(crate) mocks: Arc<MockRegistry>,
    transport: OnceCell<Arc<dyn Transport>>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create HTTP client with default configuration
    pub fn with_defaults() -> Self {
        ClientBuilder::new().build()
    }

    pub(crate) fn from_parts(
        config: HttpConfig,
        headers: HeaderMap,
        limiter: Arc<dyn RateLimiter>,
        transport: Option<Arc<dyn Transport>>,
        mocks: Arc<MockRegistry>,
    ) -> Self {
        let transport = match transport {
            Some(transport) => OnceCell::with_value(transport),
            None => OnceCell::new(),
        };
        Self {
            inner: Arc::new(ClientInner {
                config,
                headers,
                limiter,
                mocks,
                transport,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &HttpConfig {
        &self.inner.config
    }

    /// Headers merged into every request
    pub fn default_headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Registry consulted while mocking is enabled
    pub fn mock_registry(&self) -> &Arc<MockRegistry> {
        &self.inner.mocks
    }

    /// The network transport, constructing it on first use
    pub fn transport(&self) -> Result<Arc<dyn Transport>> {
        self.inner.transport().cloned()
    }

    async fn send(&self, method: Method, url: &str, body: Option<Body>) -> Result<Response> {
        let mut request = Request::new(method, url);
        request.body = body;
        self.inner.dispatch(request).await
    }
}

impl ClientInner {
    /// Network transport, built at most once per client.
    ///
    /// Concurrent first callers block until the single initialization
    /// finishes and then all observe the same instance.
    pub(crate) fn transport(&self) -> Result<&Arc<dyn Transport>> {
        self.transport.get_or_try_init(|| {
            debug!("Constructing HTTP transport");
            let transport = ReqwestTransport::new(&self.config.transport_settings())?;
            Ok(Arc::new(transport) as Arc<dyn Transport>)
        })
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("headers", &self.inner.headers)
            .field("transport_ready", &self.inner.transport.get().is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpClientTrait for Client {
    async fn get(&self, url: &str) -> Result<Response> {
        debug!("HTTP GET: {}", url);
        self.send(Method::GET, url, None).await
    }

    async fn post(&self, url: &str, body: Body) -> Result<Response> {
        debug!("HTTP POST: {}", url);
        self.send(Method::POST, url, Some(body)).await
    }

    async fn put(&self, url: &str, body: Body) -> Result<Response> {
        debug!("HTTP PUT: {}", url);
        self.send(Method::PUT, url, Some(body)).await
    }

    async fn patch(&self, url: &str, body: Body) -> Result<Response> {
        debug!("HTTP PATCH: {}", url);
        self.send(Method::PATCH, url, Some(body)).await
    }

    async fn delete(&self, url: &str) -> Result<Response> {
        debug!("HTTP DELETE: {}", url);
        self.send(Method::DELETE, url, None).await
    }

    async fn head(&self, url: &str) -> Result<Response> {
        debug!("HTTP HEAD: {}", url);
        self.send(Method::HEAD, url, None).await
    }

    async fn options(&self, url: &str) -> Result<Response> {
        debug!("HTTP OPTIONS: {}", url);
        self.send(Method::OPTIONS, url, None).await
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        debug!("HTTP {}: {}", request.method, request.url);
        self.inner.dispatch(request).await
    }
}

/// Create a shared HTTP client (Arc-wrapped for cloning)
pub fn shared_client(builder: &ClientBuilder) -> Arc<dyn HttpClientTrait> {
    Arc::new(builder.build())
}
