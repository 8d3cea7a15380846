//! Request mocking
//!
//! While a [`MockRegistry`] is enabled, every client that uses it is served
//! canned responses instead of touching the network. Mocks are keyed by
//! method, URL and request body, so two requests that differ only in how
//! their body is laid out (surrounding whitespace, newlines, tabs) hit the
//! same mock.
//!
//! Clients use [`MockRegistry::global`] unless built with their own registry.
//! The global registry is shared by every test in the process; call
//! [`MockRegistry::clear`] at the start of each scenario.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode,
};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{
    error::{HttpError, Result, TransportError},
    transport::{PreparedRequest, Transport},
};

static GLOBAL_REGISTRY: Lazy<Arc<MockRegistry>> = Lazy::new(|| Arc::new(MockRegistry::new()));

/// A canned answer for one method + URL + body combination
#[derive(Debug, Clone)]
pub struct Mock {
    pub method: Method,
    pub url: String,
    pub request_body: String,

    /// Returned instead of a response when set
    pub error: Option<TransportError>,
    pub response_status: StatusCode,
    pub response_body: String,
    pub response_headers: HeaderMap,
}

impl Mock {
    /// Mock answering `method url` with an empty `200 OK`
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            request_body: String::new(),
            error: None,
            response_status: StatusCode::OK,
            response_body: String::new(),
            response_headers: HeaderMap::new(),
        }
    }

    /// Only match requests carrying this body
    pub fn with_request_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = body.into();
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.response_status = status;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.response_body = body.into();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.response_headers.insert(name, value);
        self
    }

    /// Fail matching requests with `error`, as if the network had
    pub fn with_error<E>(mut self, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(error));
        self
    }

    /// Fail matching requests with a plain message
    pub fn with_error_message(self, message: impl Into<String>) -> Self {
        self.with_error(MockFailure(message.into()))
    }

    /// Build the response this mock describes, or return its preset error
    pub fn response(&self) -> Result<http::Response<Bytes>> {
        if let Some(error) = &self.error {
            return Err(HttpError::Transport(error.clone()));
        }

        let mut response = http::Response::new(Bytes::from(self.response_body.clone()));
        *response.status_mut() = self.response_status;

        // One value per header, even if the mock was given several
        let headers = response.headers_mut();
        for name in self.response_headers.keys() {
            if let Some(value) = self.response_headers.get(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        Ok(response)
    }

    fn key(&self) -> String {
        mock_key(&self.method, &self.url, &self.request_body)
    }
}

/// Error carried by [`Mock::with_error_message`]
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct MockFailure(pub String);

/// Registry of mocks plus the switch that routes traffic to them
#[derive(Debug, Default)]
pub struct MockRegistry {
    state: Mutex<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    enabled: bool,
    mocks: HashMap<String, Mock>,
}

impl MockRegistry {
    /// Create an isolated, disabled registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by clients by default
    pub fn global() -> Arc<MockRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Route every request of the attached clients to the registry
    pub fn enable(&self) {
        self.state.lock().enabled = true;
        debug!("Request mocking enabled");
    }

    /// Go back to the network
    pub fn disable(&self) {
        self.state.lock().enabled = false;
        debug!("Request mocking disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Add a mock, replacing any mock with the same method, URL and body
    pub fn register(&self, mock: Mock) {
        let key = mock.key();
        debug!("Registering mock for {} {}", mock.method, mock.url);
        self.state.lock().mocks.insert(key, mock);
    }

    /// Remove every mock. The enabled flag is left as it is.
    pub fn clear(&self) {
        self.state.lock().mocks.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().mocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Answer a request from the registered mocks.
    ///
    /// A request with no matching mock fails with
    /// [`HttpError::MockNotFound`]; it is never sent over the network.
    pub fn resolve(&self, method: &Method, url: &str, body: &str) -> Result<http::Response<Bytes>> {
        let key = mock_key(method, url, body);
        let mock = self.state.lock().mocks.get(&key).cloned();

        match mock {
            Some(mock) => mock.response(),
            None => {
                warn!("No mock registered for {} {}", method, url);
                Err(HttpError::MockNotFound {
                    method: method.to_string(),
                    url: url.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl Transport for MockRegistry {
    async fn execute(&self, request: &PreparedRequest) -> Result<http::Response<Bytes>> {
        self.resolve(&request.method, &request.url, &request.body_text())
    }
}

/// Strip surrounding whitespace and embedded newlines and tabs
pub(crate) fn normalize_body(body: &str) -> String {
    body.trim().replace(['\n', '\t'], "")
}

fn mock_key(method: &Method, url: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(url.as_bytes());
    hasher.update(normalize_body(body).as_bytes());
    hex::encode(hasher.finalize())
}
