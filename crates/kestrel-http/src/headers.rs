//! Default and per-request header merging

use kestrel_mime::HEADER_USER_AGENT;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::trace;

use crate::error::{HttpError, Result};

/// Merge client defaults with request headers.
///
/// Each key keeps a single value. A request header replaces the default with
/// the same name instead of being appended to it. `user_agent` is only
/// injected when neither side already supplies a `User-Agent`.
pub(crate) fn merge_headers(
    defaults: &HeaderMap,
    request: &HeaderMap,
    user_agent: Option<&str>,
) -> Result<HeaderMap> {
    let mut merged = HeaderMap::with_capacity(defaults.keys_len() + request.keys_len() + 1);

    for source in [defaults, request] {
        for name in source.keys() {
            if let Some(value) = source.get(name) {
                merged.insert(name.clone(), value.clone());
            }
        }
    }

    if let Some(agent) = user_agent.filter(|agent| !agent.is_empty()) {
        let name = HeaderName::from_static("user-agent");
        if !merged.contains_key(&name) {
            let value = HeaderValue::from_str(agent)
                .map_err(|e| HttpError::InvalidHeader(format!("{HEADER_USER_AGENT}: {e}")))?;
            merged.insert(name, value);
        }
    }

    trace!("Merged {} request headers", merged.len());
    Ok(merged)
}

/// Parse a name/value pair into typed header parts
pub(crate) fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            let (name, value) = header_pair(name, value).unwrap();
            map.insert(name, value);
        }
        map
    }

    #[test]
    fn test_user_agent_injected_when_missing() {
        let defaults = headers(&[("Content-Type", "application/json")]);

        let merged = merge_headers(&defaults, &HeaderMap::new(), Some("Example")).unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged["content-type"], "application/json");
        assert_eq!(merged["user-agent"], "Example");
    }

    #[test]
    fn test_defaults_and_request_headers_combined() {
        let defaults = headers(&[("Content-Type", "application/json")]);
        let request = headers(&[("X-Request-Id", "X")]);

        let merged = merge_headers(&defaults, &request, None).unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged["x-request-id"], "X");
        assert_eq!(merged["content-type"], "application/json");
    }

    #[test]
    fn test_request_header_overrides_default() {
        let defaults = headers(&[("Content-Type", "application/json")]);
        let request = headers(&[("Content-Type", "application/xml")]);

        let merged = merge_headers(&defaults, &request, None).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged["content-type"], "application/xml");
    }

    #[test]
    fn test_explicit_user_agent_is_kept() {
        let request = headers(&[("User-Agent", "B")]);

        let merged = merge_headers(&HeaderMap::new(), &request, Some("A")).unwrap();

        assert_eq!(merged["user-agent"], "B");
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_default_user_agent_header_beats_config() {
        let defaults = headers(&[
            ("Content-Type", "application/json"),
            ("User-Agent", "cool-agent"),
        ]);
        let request = headers(&[("X-Request-Id", "ABC-123")]);

        let merged = merge_headers(&defaults, &request, Some("config-agent")).unwrap();

        assert_eq!(merged.len(), 3);
        assert_eq!(merged["user-agent"], "cool-agent");
    }

    #[test]
    fn test_multi_valued_default_collapses_to_first() {
        let mut defaults = HeaderMap::new();
        defaults.append("accept", HeaderValue::from_static("text/html"));
        defaults.append("accept", HeaderValue::from_static("application/json"));

        let merged = merge_headers(&defaults, &HeaderMap::new(), None).unwrap();

        assert_eq!(merged.get_all("accept").iter().count(), 1);
        assert_eq!(merged["accept"], "text/html");
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let result = header_pair("bad header", "x");
        assert!(matches!(result, Err(HttpError::InvalidHeader(_))));
    }
}
