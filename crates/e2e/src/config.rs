//! Harness configuration resolved from the environment

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the system under test lives and how long to wait for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Backend base URL (`API_URL`, falling back to `API_BASE_URL`)
    pub api_url: String,

    /// Frontend base URL (`BASE_URL`, falling back to `FRONTEND_URL`)
    pub frontend_url: String,

    /// Shared secret used to sign Shopify webhooks
    pub shopify_api_secret: Option<String>,

    /// Pre-issued bearer token for authenticated API calls
    pub test_auth_token: Option<String>,

    /// Bound on the fail-fast `/health` probe
    #[serde(with = "millis")]
    pub health_timeout: Duration,

    /// Default per-request timeout
    #[serde(with = "millis")]
    pub request_timeout: Duration,

    /// Default navigation / element wait timeout
    #[serde(with = "millis")]
    pub navigation_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            shopify_api_secret: None,
            test_auth_token: None,
            health_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(40),
        }
    }
}

impl HarnessConfig {
    /// Build from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let millis = |key: &str| get(key).and_then(|v| v.parse::<u64>().ok()).map(Duration::from_millis);
        let defaults = Self::default();

        Self {
            api_url: get("API_URL")
                .or_else(|| get("API_BASE_URL"))
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            frontend_url: get("BASE_URL")
                .or_else(|| get("FRONTEND_URL"))
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.frontend_url),
            shopify_api_secret: get("SHOPIFY_API_SECRET"),
            test_auth_token: get("TEST_AUTH_TOKEN"),
            health_timeout: millis("E2E_HEALTH_TIMEOUT_MS").unwrap_or(defaults.health_timeout),
            request_timeout: millis("E2E_REQUEST_TIMEOUT_MS").unwrap_or(defaults.request_timeout),
            navigation_timeout: millis("E2E_NAVIGATION_TIMEOUT_MS").unwrap_or(defaults.navigation_timeout),
        }
    }

    /// Join a path onto the API base URL.
    pub fn api(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Join a path onto the frontend base URL.
    pub fn frontend(&self, path: &str) -> String {
        format!("{}/{}", self.frontend_url, path.trim_start_matches('/'))
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = HarnessConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.health_timeout, Duration::from_secs(5));
        assert!(config.shopify_api_secret.is_none());
    }

    #[test]
    fn test_primary_variable_wins_over_fallback() {
        let config = HarnessConfig::from_lookup(lookup(&[
            ("API_URL", "http://api:9000/"),
            ("API_BASE_URL", "http://ignored"),
            ("FRONTEND_URL", "http://web:3000"),
        ]));
        assert_eq!(config.api_url, "http://api:9000");
        assert_eq!(config.frontend_url, "http://web:3000");
        assert_eq!(config.api("/api/v1/health"), "http://api:9000/api/v1/health");
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        let config = HarnessConfig::from_lookup(lookup(&[
            ("API_URL", ""),
            ("API_BASE_URL", "http://fallback:8000"),
            ("E2E_HEALTH_TIMEOUT_MS", "250"),
        ]));
        assert_eq!(config.api_url, "http://fallback:8000");
        assert_eq!(config.health_timeout, Duration::from_millis(250));
    }
}
