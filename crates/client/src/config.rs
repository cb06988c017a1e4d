//! Client configuration (environment driven).

use std::time::Duration;

use cokins_stock::CountPolicy;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing slash.
    pub api_url: String,
    /// Bearer token handed over by the session layer, passed through verbatim.
    pub auth_token: Option<String>,
    /// Deadline applied to every backend request.
    pub request_timeout: Duration,
    pub count_policy: CountPolicy,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid number of seconds: {value}")]
    InvalidTimeout { var: &'static str, value: String },
    #[error("{var}: {message}")]
    InvalidPolicy { var: &'static str, message: String },
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            count_policy: CountPolicy::default(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_count_policy(mut self, policy: CountPolicy) -> Self {
        self.count_policy = policy;
        self
    }

    /// Read `COKINS_API_URL`, `COKINS_AUTH_TOKEN`, `COKINS_REQUEST_TIMEOUT_SECS`
    /// and `COKINS_COUNT_POLICY`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("COKINS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url);

        config.auth_token = lookup("COKINS_AUTH_TOKEN").filter(|t| !t.trim().is_empty());

        if let Some(raw) = lookup("COKINS_REQUEST_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout {
                    var: "COKINS_REQUEST_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("COKINS_COUNT_POLICY") {
            config.count_policy = raw.parse().map_err(|e: cokins_core::DomainError| {
                ConfigError::InvalidPolicy {
                    var: "COKINS_COUNT_POLICY",
                    message: e.to_string(),
                }
            })?;
        }

        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}
