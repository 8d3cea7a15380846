//! Network transports
//!
//! A [`Transport`] turns a fully assembled [`PreparedRequest`] into a response
//! whose body has already been read to the end.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::HeaderMap, Method};
use tracing::debug;

use crate::{
    config::TransportSettings,
    error::{HttpError, Result},
};

/// A request with headers merged, body encoded and URL assembled
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl PreparedRequest {
    /// Request body decoded lossily as UTF-8
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes requests on behalf of a client
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and read the whole response body.
    ///
    /// A failure while reading the body is an error; a partially read
    /// response is never returned.
    async fn execute(&self, request: &PreparedRequest) -> Result<http::Response<Bytes>>;
}

/// Transport backed by a `reqwest` connection pool
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a pool tuned by `settings`
    pub fn new(settings: &TransportSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if !settings.timeout.is_zero() {
            builder = builder.timeout(settings.timeout);
        }
        if !settings.connect_timeout.is_zero() {
            builder = builder.connect_timeout(settings.connect_timeout);
        }

        // Configure connection pooling
        if settings.keep_alive {
            builder = builder.pool_max_idle_per_host(settings.max_idle_per_host);
        } else {
            builder = builder.pool_max_idle_per_host(0);
        }

        let inner = builder
            .build()
            .map_err(|e| HttpError::BuildError(e.to_string()))?;

        debug!(
            "Built HTTP transport (timeout: {:?}, connect timeout: {:?}, idle per host: {}, keep-alive: {})",
            settings.timeout, settings.connect_timeout, settings.max_idle_per_host, settings.keep_alive
        );

        Ok(Self { inner })
    }

    /// Reuse an existing `reqwest` client
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &PreparedRequest) -> Result<http::Response<Bytes>> {
        let url = request
            .url
            .parse::<url::Url>()
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {e}", request.url)))?;

        let mut builder = self
            .inner
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(HttpError::transport)?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::ReadBody(Arc::new(e)))?;

        let mut wrapped = http::Response::new(body);
        *wrapped.status_mut() = status;
        *wrapped.version_mut() = version;
        *wrapped.headers_mut() = headers;
        Ok(wrapped)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::{
        matchers::{body_string, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::config::HttpConfig;

    fn prepared(method: Method, url: String, body: &'static str) -> PreparedRequest {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "ABC-123".parse().unwrap());
        PreparedRequest {
            method,
            url,
            headers,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_build_with_default_settings() {
        let settings = HttpConfig::default().transport_settings();
        assert!(ReqwestTransport::new(&settings).is_ok());
    }

    #[test]
    fn test_build_without_timeouts_or_keep_alive() {
        let settings = TransportSettings {
            timeout: Duration::ZERO,
            connect_timeout: Duration::ZERO,
            max_idle_per_host: 10,
            keep_alive: false,
        };
        assert!(ReqwestTransport::new(&settings).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let transport = ReqwestTransport::new(&HttpConfig::default().transport_settings()).unwrap();
        let request = prepared(Method::GET, "not a url".to_string(), "");
        let result = transport.execute(&request).await;
        assert!(matches!(result, Err(HttpError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_execute_captures_status_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/repos"))
            .and(header("x-request-id", "ABC-123"))
            .and(body_string(r#"{"name":"test-repo"}"#))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("x-served-by", "wiremock")
                    .set_body_string(r#"{"id":123}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(&HttpConfig::default().transport_settings()).unwrap();
        let request = prepared(
            Method::POST,
            format!("{}/user/repos", server.uri()),
            r#"{"name":"test-repo"}"#,
        );

        let response = transport.execute(&request).await.unwrap();

        assert_eq!(response.status(), 201);
        assert_eq!(response.headers()["x-served-by"], "wiremock");
        assert_eq!(&response.body()[..], br#"{"id":123}"#);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let transport = ReqwestTransport::new(&HttpConfig::default().transport_settings()).unwrap();
        let request = prepared(Method::GET, "http://127.0.0.1:1/".to_string(), "");
        let result = transport.execute(&request).await;
        assert!(matches!(result, Err(HttpError::Transport(_))));
    }
}
