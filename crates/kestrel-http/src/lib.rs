//! Configurable HTTP client
//!
//! Builds clients that share defaults (headers, timeouts, base URL, user
//! agent, rate limit) and swaps the network for canned responses in tests.
//!
//! ## Features
//!
//! - **Fluent builder**: `ClientBuilder` snapshots options into a `Client`
//! - **Rate limiting**: token bucket shared by clients of one builder
//! - **Lazy transport**: the `reqwest` pool is built once, on first real request
//! - **Body encoding**: JSON, XML or form, picked from `Content-Type`
//! - **Request mocking**: `MockRegistry` answers requests while enabled
//!
//! ```no_run
//! use kestrel_http::{Client, HttpClientTrait};
//!
//! # async fn run() -> kestrel_http::Result<()> {
//! let client = Client::builder()
//!     .with_base_url("https://api.example.com")
//!     .with_user_agent("kestrel-example")
//!     .with_rate_limit(10.0, 5)
//!     .build();
//!
//! let response = client.get("/users/octocat").await?;
//! println!("{}", response.status_line());
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod builder;
pub mod client;
pub mod config;
mod dispatch;
pub mod error;
mod headers;
pub mod mock;
pub mod rate_limit;
pub mod request;
pub mod response;
pub mod transport;

pub use body::{Body, Encode};
pub use builder::ClientBuilder;
pub use client::{shared_client, Client, HttpClientTrait};
pub use config::{HttpConfig, RateLimit, TransportSettings};
pub use error::{EncodeError, HttpError, Result, TransportError};
pub use mock::{Mock, MockFailure, MockRegistry};
pub use rate_limit::{RateLimiter, TokenBucket, Unlimited};
pub use request::Request;
pub use response::Response;
pub use transport::{PreparedRequest, ReqwestTransport, Transport};

/// Re-export commonly used types
pub use reqwest::{header, Method, StatusCode};
pub use tokio_util::sync::CancellationToken;
