//! Data models and structures
//!
//! Defines the proxy request body and the process-wide configuration that
//! carries the provider credential.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Body accepted by `POST /api/detect`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectRequest {
    #[serde(rename = "imageBase64", default)]
    pub image_base64: Option<String>,
}

impl DetectRequest {
    pub fn new(image_base64: impl Into<String>) -> Self {
        Self {
            image_base64: Some(image_base64.into()),
        }
    }

    /// Returns the payload when it is present and not blank.
    pub fn payload(&self) -> Option<&str> {
        self.image_base64
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Provider credential. Never printed in plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<ApiKey>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub request_timeout: Duration,
    pub bind_addr: SocketAddr,
    pub proxy_url: Option<String>,
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_timeout = match non_empty("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                crate::Error::Configuration(format!(
                    "REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let bind_raw = non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse().map_err(|_| {
            crate::Error::Configuration(format!("BIND_ADDR is not a socket address: '{}'", bind_raw))
        })?;

        Ok(Self {
            gemini_api_key: non_empty("GEMINI_API_KEY").map(ApiKey::new),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: non_empty("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout,
            bind_addr,
            proxy_url: non_empty("DETECT_PROXY_URL"),
        })
    }

    /// Returns the credential or a configuration error naming the variable.
    pub fn require_api_key(&self) -> crate::Result<&ApiKey> {
        self.gemini_api_key
            .as_ref()
            .ok_or_else(|| crate::Error::Configuration("GEMINI_API_KEY missing".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_any_variables() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, DEFAULT_MODEL);
        assert_eq!(config.gemini_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(config.proxy_url.is_none());
    }

    #[test]
    fn test_blank_key_is_treated_as_missing() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap();
        let err = config.require_api_key().unwrap_err();
        assert_eq!(err.to_string(), "GEMINI_API_KEY missing");
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("GEMINI_BASE_URL", "http://localhost:9999/"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("DETECT_PROXY_URL", "http://localhost:3000"),
        ]))
        .unwrap();

        assert_eq!(config.require_api_key().unwrap().expose(), "secret");
        assert_eq!(config.gemini_model, "gemini-2.5-pro");
        assert_eq!(config.gemini_base_url, "http://localhost:9999");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.proxy_url.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn test_invalid_timeout_is_configuration_error() {
        let err = Config::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, crate::Error::Configuration(_)));
    }

    #[test]
    fn test_api_key_is_redacted() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "top-secret")])).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("top-secret"));
        assert_eq!(ApiKey::new("top-secret").to_string(), "***");
    }

    #[test]
    fn test_detect_request_payload() {
        let body: DetectRequest = serde_json::from_str(r#"{"imageBase64":"abc"}"#).unwrap();
        assert_eq!(body.payload(), Some("abc"));

        let empty: DetectRequest = serde_json::from_str(r#"{"imageBase64":""}"#).unwrap();
        assert_eq!(empty.payload(), None);

        let missing: DetectRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.payload(), None);
    }
}
