use crate::error::{PortalError, Result};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.kuraimibank.com/sandbox";
pub const DEFAULT_MERCHANT_ID: &str = "TEST_MERCHANT";
pub const DEFAULT_API_KEY: &str = "TEST_KEY";
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:8080/payment-callback";

/// Settings for talking to the remote payment processor.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub merchant_id: String,
    pub api_key: String,
    pub callback_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            callback_url: DEFAULT_CALLBACK_URL.to_string(),
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl GatewayConfig {
    pub fn new(
        base_url: impl Into<String>,
        merchant_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        Self {
            base_url: base_url.into(),
            merchant_id: merchant_id.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
        .validated()
    }

    pub fn with_callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = callback_url.into();
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Endpoint under the configured base, tolerating a trailing slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn validated(self) -> Result<Self> {
        if self.base_url.trim().is_empty() {
            return Err(PortalError::ConfigError(
                "Gateway base URL must not be empty".to_string(),
            ));
        }
        if self.merchant_id.trim().is_empty() {
            return Err(PortalError::ConfigError(
                "Merchant id must not be empty".to_string(),
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(PortalError::ConfigError(
                "API key must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sandbox() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.merchant_id, DEFAULT_MERCHANT_ID);
    }

    #[test]
    fn test_empty_credentials_are_rejected() {
        assert!(matches!(
            GatewayConfig::new("https://bank", "", "key"),
            Err(PortalError::ConfigError(_))
        ));
        assert!(GatewayConfig::new("https://bank", "m", " ").is_err());
        assert!(GatewayConfig::new("", "m", "k").is_err());
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let config = GatewayConfig::new("https://bank/api/", "m", "k").unwrap();
        assert_eq!(
            config.endpoint("/payments/initiate"),
            "https://bank/api/payments/initiate"
        );
    }
}
