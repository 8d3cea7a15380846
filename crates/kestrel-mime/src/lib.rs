//! Header names and content types
//!
//! Shared vocabulary for building requests with the kestrel client. The
//! [`ContentType`] classifier decides how a structured request body gets
//! encoded before it goes over the wire.

/// `Content-Type` header name
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
/// `User-Agent` header name
pub const HEADER_USER_AGENT: &str = "User-Agent";
/// `Authorization` header name
pub const HEADER_AUTHORIZATION: &str = "Authorization";
/// `Accept` header name
pub const HEADER_ACCEPT: &str = "Accept";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";
pub const CONTENT_TYPE_PDF: &str = "application/pdf";

/// Body encoding selected from a `Content-Type` header value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `application/xml`
    Xml,
    /// `application/x-www-form-urlencoded`
    FormUrlEncoded,
    /// Anything else, including a missing header
    Other,
}

impl ContentType {
    /// Classify a header value.
    ///
    /// The media type is compared case-insensitively and any `;` parameters
    /// (such as `charset`) are ignored.
    pub fn classify(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return ContentType::Other;
        };

        let essence = value.split(';').next().unwrap_or_default().trim();

        if essence.eq_ignore_ascii_case(CONTENT_TYPE_JSON) {
            ContentType::Json
        } else if essence.eq_ignore_ascii_case(CONTENT_TYPE_XML) {
            ContentType::Xml
        } else if essence.eq_ignore_ascii_case(CONTENT_TYPE_FORM_URL_ENCODED) {
            ContentType::FormUrlEncoded
        } else {
            ContentType::Other
        }
    }

    /// Whether bodies of this type are JSON-encoded. JSON is the fallback.
    pub fn encodes_as_json(self) -> bool {
        matches!(self, ContentType::Json | ContentType::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names() {
        assert_eq!(HEADER_CONTENT_TYPE, "Content-Type");
        assert_eq!(HEADER_USER_AGENT, "User-Agent");
        assert_eq!(CONTENT_TYPE_JSON, "application/json");
        assert_eq!(CONTENT_TYPE_XML, "application/xml");
    }

    #[test]
    fn test_classify_known_types() {
        assert_eq!(ContentType::classify(Some("application/json")), ContentType::Json);
        assert_eq!(ContentType::classify(Some("application/xml")), ContentType::Xml);
        assert_eq!(
            ContentType::classify(Some("application/x-www-form-urlencoded")),
            ContentType::FormUrlEncoded
        );
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(ContentType::classify(Some("Application/JSON")), ContentType::Json);
        assert_eq!(ContentType::classify(Some("APPLICATION/XML")), ContentType::Xml);
    }

    #[test]
    fn test_classify_ignores_parameters() {
        assert_eq!(
            ContentType::classify(Some("application/json; charset=utf-8")),
            ContentType::Json
        );
    }

    #[test]
    fn test_unknown_and_missing_fall_back_to_json() {
        let other = ContentType::classify(Some("text/plain"));
        assert_eq!(other, ContentType::Other);
        assert!(other.encodes_as_json());

        let missing = ContentType::classify(None);
        assert_eq!(missing, ContentType::Other);
        assert!(missing.encodes_as_json());

        assert!(!ContentType::Xml.encodes_as_json());
        assert!(!ContentType::FormUrlEncoded.encodes_as_json());
    }
}
