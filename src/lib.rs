//! GitHub-style API calls used by the end-to-end tests
//!
//! These functions are written the way an application would use
//! `kestrel-http`: one shared client, built on first use, and plain async
//! functions on top of it. The tests in `tests/` drive them through the
//! global mock registry.

use kestrel_http::{
    header::{HeaderMap, HeaderValue},
    Body, Client, HttpClientTrait, HttpError, StatusCode,
};
use kestrel_mime::{CONTENT_TYPE_JSON, HEADER_ACCEPT, HEADER_CONTENT_TYPE};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const API_ROOT: &str = "https://api.github.com";

static CLIENT: Lazy<Client> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(HEADER_CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    headers.insert(HEADER_ACCEPT, HeaderValue::from_static(CONTENT_TYPE_JSON));

    Client::builder()
        .with_headers(headers)
        .with_connection_timeout(Duration::from_secs(2))
        .with_response_timeout(Duration::from_secs(3))
        .with_user_agent("kestrel-examples")
        .with_rate_limit(10.0, 5)
        .build()
});

/// Errors surfaced by the example API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The API answered with its own error message
    #[error("{0}")]
    Api(String),

    #[error("error processing github error response when creating a new repo")]
    UnreadableErrorBody,
}

/// Entry points advertised by the API root
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    pub current_user_url: String,
    #[serde(default)]
    pub authorizations_url: Option<String>,
    #[serde(default)]
    pub repository_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
}

impl Repository {
    pub fn new(name: impl Into<String>, private: bool) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            private,
        }
    }
}

/// Request payload for creating a repository
#[derive(Debug, Serialize)]
struct CreateRepoRequest {
    name: String,
    private: bool,
}

#[derive(Debug, Deserialize)]
struct GithubError {
    message: String,
}

/// The shared client used by every call in this crate
pub fn client() -> &'static Client {
    &CLIENT
}

/// Fetch the API root
pub async fn get_endpoints() -> Result<Endpoints, ApiError> {
    let response = client().get(API_ROOT).await?;
    Ok(response.json()?)
}

/// Create a repository for the authenticated user
pub async fn create_repo(repository: &Repository) -> Result<Repository, ApiError> {
    let body = Body::structured(CreateRepoRequest {
        name: repository.name.clone(),
        private: repository.private,
    });

    let response = client()
        .post(&format!("{API_ROOT}/user/repos"), body)
        .await?;

    if response.status() != StatusCode::CREATED {
        let error: GithubError = response
            .json()
            .map_err(|_| ApiError::UnreadableErrorBody)?;
        return Err(ApiError::Api(error.message));
    }

    Ok(response.json()?)
}
