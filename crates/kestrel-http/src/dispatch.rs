//! Request dispatch
//!
//! The steps run in a fixed order: merge headers, encode the body, assemble
//! the URL, take a rate limiter token, then hand the request to either the
//! mock registry or the network transport. Anything that fails before the
//! token is granted never reaches a transport.

use bytes::Bytes;
use kestrel_mime::ContentType;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};

use crate::{
    client::ClientInner,
    error::Result,
    headers::merge_headers,
    request::Request,
    response::Response,
    transport::{PreparedRequest, Transport},
};

impl ClientInner {
    pub(crate) async fn dispatch(&self, request: Request) -> Result<Response> {
        let prepared = self.prepare(&request)?;

        self.limiter.wait(&request.cancellation).await?;

        let transport = self.select_transport()?;
        let response = transport.execute(&prepared).await?;

        debug!(
            "{} {} -> {}",
            prepared.method,
            prepared.url,
            response.status()
        );
        Ok(Response::from_parts(prepared, response))
    }

    /// Merge headers, encode the body and build the final URL
    pub(crate) fn prepare(&self, request: &Request) -> Result<PreparedRequest> {
        let headers = merge_headers(
            &self.headers,
            &request.headers,
            self.config.user_agent.as_deref(),
        )?;

        let body = match &request.body {
            Some(body) => {
                let content_type =
                    ContentType::classify(headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()));
                body.encode(content_type)?
            }
            None => Bytes::new(),
        };

        let url = format!("{}{}", self.config.base_url, request.url);
        trace!("Prepared {} {} ({} body bytes)", request.method, url, body.len());

        Ok(PreparedRequest {
            method: request.method.clone(),
            url,
            headers,
            body,
        })
    }

    /// Mock registry while mocking is on, the network otherwise
    fn select_transport(&self) -> Result<&dyn Transport> {
        if self.mocks.is_enabled() {
            trace!("Serving request from mock registry");
            return Ok(self.mocks.as_ref());
        }
        Ok(self.transport()?.as_ref())
    }
}
