//! Fluent client construction

use std::{fmt, sync::Arc, time::Duration};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::{
    client::Client,
    config::{HttpConfig, RateLimit},
    mock::MockRegistry,
    rate_limit::{limiter_for, RateLimiter},
    transport::Transport,
};

/// Accumulates client options; [`ClientBuilder::build`] snapshots them.
///
/// Clients built from the same builder share its rate limiter, so a limit set
/// here bounds their combined traffic. Clients built from different builders
/// never wait on each other.
#[derive(Clone, Default)]
pub struct ClientBuilder {
    config: HttpConfig,
    headers: HeaderMap,
    limiter: Option<Arc<dyn RateLimiter>>,
    transport: Option<Arc<dyn Transport>>,
    mocks: Option<Arc<MockRegistry>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded configuration
    pub fn from_config(config: HttpConfig) -> Self {
        let limiter = config.rate_limit.map(|limit| limiter_for(Some(limit)));
        Self {
            config,
            limiter,
            ..Default::default()
        }
    }

    /// Headers sent with every request
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Add one default header
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Maximum time to establish a connection; zero means the default
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = Some(timeout);
        self
    }

    /// Maximum time to wait for response headers; zero means the default
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = Some(timeout);
        self
    }

    /// Idle connections kept per host; zero means the default
    pub fn with_max_idle_connections(mut self, max: usize) -> Self {
        self.config.max_idle_connections = Some(max);
        self
    }

    pub fn disable_timeouts(mut self, disable: bool) -> Self {
        self.config.disable_timeouts = disable;
        self
    }

    pub fn disable_keep_alives(mut self, disable: bool) -> Self {
        self.config.disable_keep_alives = disable;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Allow `rate` requests per second with bursts of up to `burst`
    pub fn with_rate_limit(mut self, rate: f64, burst: u32) -> Self {
        let limit = RateLimit::new(rate, burst);
        self.config.rate_limit = Some(limit);
        self.limiter = Some(limiter_for(Some(limit)));
        self
    }

    /// Use a custom limiter, e.g. one shared across several builders
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Send requests through `transport` instead of building one
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Consult `registry` instead of the global one
    pub fn with_mock_registry(mut self, registry: Arc<MockRegistry>) -> Self {
        self.mocks = Some(registry);
        self
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Create a client from the current options
    pub fn build(&self) -> Client {
        Client::from_parts(
            self.config.clone(),
            self.headers.clone(),
            self.limiter.clone().unwrap_or_else(|| limiter_for(None)),
            self.transport.clone(),
            self.mocks.clone().unwrap_or_else(MockRegistry::global),
        )
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("headers", &self.headers)
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}
