//! Buffered HTTP responses

use std::fmt::Write as _;

use bytes::Bytes;
use reqwest::{header::HeaderMap, StatusCode, Version};
use serde::de::DeserializeOwned;

use crate::{
    error::{HttpError, Result},
    transport::PreparedRequest,
};

const DUMP_SEPARATOR: &str = "--------\n";

/// A response whose body was read in full when it arrived
///
/// All accessors work on the captured bytes and can be called any number of
/// times.
#[derive(Debug, Clone)]
pub struct Response {
    request: PreparedRequest,
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Pair a buffered transport response with the request that produced it
    pub fn from_parts(request: PreparedRequest, response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            request,
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Status code and reason phrase, e.g. `200 OK`
    pub fn status_line(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("{} {}", self.status.as_u16(), reason),
            None => self.status.as_u16().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8 sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the JSON body.
    ///
    /// On failure the error records where in the body decoding stopped.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| HttpError::Decode {
            line: source.line(),
            column: source.column(),
            source,
        })
    }

    /// The request as it was handed to the transport
    pub fn request(&self) -> &PreparedRequest {
        &self.request
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Human-readable dump of the full request and the response
    pub fn debug(&self) -> String {
        let mut dump = String::new();

        dump.push_str(DUMP_SEPARATOR);
        dump.push_str("REQUEST\n");
        dump.push_str(DUMP_SEPARATOR);
        self.write_request(&mut dump);
        dump.push('\n');

        dump.push_str(DUMP_SEPARATOR);
        dump.push_str("RESPONSE\n");
        dump.push_str(DUMP_SEPARATOR);
        let _ = write!(dump, "{:?} {}\r\n", self.version, self.status_line());
        write_headers(&mut dump, &self.headers);
        dump.push_str("\r\n");
        dump.push_str(&self.text());
        dump.push('\n');

        dump
    }

    fn write_request(&self, dump: &mut String) {
        let request = &self.request;
        let (target, host) = match url::Url::parse(&request.url) {
            Ok(url) => {
                let mut target = url.path().to_string();
                if let Some(query) = url.query() {
                    target.push('?');
                    target.push_str(query);
                }
                (target, url.host_str().map(|host| match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                }))
            }
            Err(_) => (request.url.clone(), None),
        };

        let _ = write!(dump, "{} {} HTTP/1.1\r\n", request.method, target);
        if let Some(host) = host {
            let _ = write!(dump, "Host: {host}\r\n");
        }
        write_headers(dump, &request.headers);
        dump.push_str("\r\n");
        dump.push_str(&request.body_text());
    }
}

fn write_headers(dump: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        let _ = write!(dump, "{name}: {value}\r\n");
    }
}
