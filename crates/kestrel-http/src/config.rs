//! HTTP client configuration
//!
//! Numeric options are stored as given and resolved against their defaults
//! only when a transport is about to be built, so an unset or zero value
//! always means "use the default".

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Idle connections kept per host when none is configured
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 10;
/// Time allowed for response headers when none is configured
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
/// Time allowed for the connection handshake when none is configured
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Maximum time to establish a connection
    #[serde(default)]
    pub connection_timeout: Option<Duration>,

    /// Maximum time to wait for response headers once the request is written
    #[serde(default)]
    pub response_timeout: Option<Duration>,

    /// Idle (keep-alive) connections kept per host
    #[serde(default)]
    pub max_idle_connections: Option<usize>,

    /// Disable both connection and response timeouts
    #[serde(default)]
    pub disable_timeouts: bool,

    /// Use every connection for a single request only
    #[serde(default)]
    pub disable_keep_alives: bool,

    /// Prefix prepended verbatim to every request path
    #[serde(default)]
    pub base_url: String,

    /// Sent as `User-Agent` unless the request already carries one
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Outgoing request rate, unbounded when absent
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
}

/// Token bucket parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Tokens added per second
    pub rate: f64,
    /// Bucket capacity, i.e. requests allowed back to back
    pub burst: u32,
}

impl RateLimit {
    pub fn new(rate: f64, burst: u32) -> Self {
        Self { rate, burst }
    }

    /// A rate that cannot be honoured is treated as "no limit"
    pub fn is_bounded(&self) -> bool {
        self.rate.is_finite() && self.rate > 0.0
    }
}

impl HttpConfig {
    /// Create a new HTTP config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Connection timeout after applying defaults and `disable_timeouts`
    pub fn effective_connection_timeout(&self) -> Duration {
        if self.disable_timeouts {
            return Duration::ZERO;
        }
        match self.connection_timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => DEFAULT_CONNECTION_TIMEOUT,
        }
    }

    /// Response timeout after applying defaults and `disable_timeouts`
    pub fn effective_response_timeout(&self) -> Duration {
        if self.disable_timeouts {
            return Duration::ZERO;
        }
        match self.response_timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Whole-request timeout; zero means none
    pub fn total_timeout(&self) -> Duration {
        self.effective_response_timeout() + self.effective_connection_timeout()
    }

    /// Idle connection cap per host
    pub fn effective_max_idle_connections(&self) -> usize {
        match self.max_idle_connections {
            Some(max) if max > 0 => max,
            _ => DEFAULT_MAX_IDLE_CONNECTIONS,
        }
    }

    /// Snapshot of what the network transport needs
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            timeout: self.total_timeout(),
            connect_timeout: self.effective_connection_timeout(),
            max_idle_per_host: self.effective_max_idle_connections(),
            keep_alive: !self.disable_keep_alives,
        }
    }
}

/// Resolved parameters for constructing a network transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    /// Whole-request timeout, zero for none
    pub timeout: Duration,
    /// Connect timeout, zero for none
    pub connect_timeout: Duration,
    pub max_idle_per_host: usize,
    pub keep_alive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.effective_connection_timeout(), DEFAULT_CONNECTION_TIMEOUT);
        assert_eq!(config.effective_response_timeout(), DEFAULT_RESPONSE_TIMEOUT);
        assert_eq!(config.effective_max_idle_connections(), 10);
        assert_eq!(config.total_timeout(), Duration::from_secs(60));
        assert!(config.rate_limit.is_none());
    }

    #[test]
    fn test_custom_timeouts() {
        let config = HttpConfig {
            connection_timeout: Some(Duration::from_secs(50)),
            response_timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        assert_eq!(config.effective_connection_timeout(), Duration::from_secs(50));
        assert_eq!(config.effective_response_timeout(), Duration::from_secs(5));
        assert_eq!(config.total_timeout(), Duration::from_secs(55));
    }

    #[test]
    fn test_zero_timeout_means_default() {
        let config = HttpConfig {
            response_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert_eq!(config.effective_response_timeout(), DEFAULT_RESPONSE_TIMEOUT);
    }

    #[test]
    fn test_disable_timeouts_overrides_explicit_values() {
        let config = HttpConfig {
            connection_timeout: Some(Duration::from_secs(50)),
            response_timeout: Some(Duration::from_secs(50)),
            disable_timeouts: true,
            ..Default::default()
        };
        assert_eq!(config.effective_connection_timeout(), Duration::ZERO);
        assert_eq!(config.effective_response_timeout(), Duration::ZERO);
        assert_eq!(config.transport_settings().timeout, Duration::ZERO);
    }

    #[test]
    fn test_custom_max_idle_connections() {
        let config = HttpConfig {
            max_idle_connections: Some(50),
            ..Default::default()
        };
        assert_eq!(config.effective_max_idle_connections(), 50);
    }

    #[test]
    fn test_transport_settings_keep_alive() {
        let config = HttpConfig {
            disable_keep_alives: true,
            ..Default::default()
        };
        let settings = config.transport_settings();
        assert!(!settings.keep_alive);
        assert_eq!(settings.max_idle_per_host, 10);
    }

    #[test]
    fn test_rate_limit_bounds() {
        assert!(RateLimit::new(5.0, 1).is_bounded());
        assert!(!RateLimit::new(0.0, 1).is_bounded());
        assert!(!RateLimit::new(f64::INFINITY, 1).is_bounded());
        assert!(!RateLimit::new(f64::NAN, 1).is_bounded());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: HttpConfig =
            serde_json::from_str(r#"{"base_url":"https://api.example.com","disable_timeouts":true}"#)
                .unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert!(config.disable_timeouts);
        assert_eq!(config.user_agent, None);
        assert_eq!(config.effective_max_idle_connections(), 10);
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = HttpConfig {
            user_agent: Some("kestrel-test".to_string()),
            rate_limit: Some(RateLimit::new(2.0, 4)),
            ..Default::default()
        };
        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: HttpConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, config);
    }
}
