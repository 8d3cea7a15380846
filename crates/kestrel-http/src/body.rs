//! Request bodies and their encoding

use std::{fmt, sync::Arc};

use bytes::Bytes;
use kestrel_mime::ContentType;
use serde::Serialize;
use tracing::trace;

use crate::error::EncodeError;

/// Serialize a value into each supported wire format
pub trait Encode: Send + Sync {
    fn encode_json(&self) -> Result<Vec<u8>, EncodeError>;

    fn encode_xml(&self) -> Result<Vec<u8>, EncodeError>;

    fn encode_form(&self) -> Result<Vec<u8>, EncodeError>;
}

impl<T> Encode for T
where
    T: Serialize + Send + Sync,
{
    fn encode_json(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }

    fn encode_xml(&self) -> Result<Vec<u8>, EncodeError> {
        quick_xml::se::to_string(self)
            .map(String::into_bytes)
            .map_err(|e| EncodeError::Xml(e.to_string()))
    }

    fn encode_form(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_urlencoded::to_string(self)?.into_bytes())
    }
}

/// Request payload
///
/// Raw bytes and text are sent as-is. Structured values are serialized
/// according to the request's effective `Content-Type`.
#[derive(Clone)]
pub enum Body {
    Bytes(Bytes),
    Text(String),
    Structured(Arc<dyn Encode>),
}

impl Body {
    /// Wrap any serializable value
    pub fn structured<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Body::Structured(Arc::new(value))
    }

    /// Structured body from a JSON value
    pub fn json_value(value: serde_json::Value) -> Self {
        Body::structured(value)
    }

    /// Produce the bytes sent on the wire
    pub fn encode(&self, content_type: ContentType) -> Result<Bytes, EncodeError> {
        let encoded = match self {
            Body::Bytes(bytes) => return Ok(bytes.clone()),
            Body::Text(text) => return Ok(Bytes::from(text.clone())),
            Body::Structured(value) if content_type.encodes_as_json() => value.encode_json()?,
            Body::Structured(value) => match content_type {
                ContentType::Xml => value.encode_xml()?,
                _ => value.encode_form()?,
            },
        };
        trace!("Encoded {:?} body into {} bytes", content_type, encoded.len());
        Ok(Bytes::from(encoded))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Body::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Body::Structured(_) => f.write_str("Structured(..)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::json_value(value)
    }
}
