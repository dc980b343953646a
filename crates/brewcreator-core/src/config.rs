// ── Runtime configuration ──
//
// These types describe *how* to reach the BrewCreator service. They
// carry credential data and connection tuning, but never touch disk --
// the host application constructs a `BrewCreatorConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;

use brewcreator_api::{RetryPolicy, ServiceEndpoints};

/// Account credentials, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub username: String,
    pub password: SecretString,
}

impl AccountCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Configuration for one BrewCreator account connection.
#[derive(Debug, Clone)]
pub struct BrewCreatorConfig {
    pub credentials: AccountCredentials,
    /// Service base URLs; defaults point at production.
    pub endpoints: ServiceEndpoints,
    /// Transport-level request timeout.
    pub timeout: Duration,
    /// Attempt cap and delay for the request executor.
    pub retry: RetryPolicy,
}

impl BrewCreatorConfig {
    pub fn new(credentials: AccountCredentials) -> Self {
        Self {
            credentials,
            endpoints: ServiceEndpoints::default(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: ServiceEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_production_with_protocol_tuning() {
        let config =
            BrewCreatorConfig::new(AccountCredentials::new("brewer@example.com", "hunter2"));
        assert_eq!(
            config.endpoints.api_url.as_str(),
            "https://api.brewcreator.com/"
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.attempts, 5);
    }

    #[test]
    fn password_is_not_leaked_through_debug() {
        let config =
            BrewCreatorConfig::new(AccountCredentials::new("brewer@example.com", "hunter2"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }
}
