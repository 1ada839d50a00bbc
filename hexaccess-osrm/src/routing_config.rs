use serde::{Deserialize, Serialize};

/// connection and retry settings for the OSRM routing service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RoutingConfig {
    /// when false, every distance is resolved with the geodesic fallback
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// OSRM profile segment of the route URL
    pub profile: String,
    /// per-request timeout
    pub timeout_secs: u64,
    /// additional attempts after a retryable failure
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: String::from("localhost"),
            port: 5000,
            profile: String::from("driving"),
            timeout_secs: 10,
            max_retries: 2,
            retry_backoff_ms: 10,
        }
    }
}

impl RoutingConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
