// Shared transport configuration for building reqwest::Client instances.
//
// The identity flow and the equipment API share one client (and therefore
// one cookie jar and connection pool) built through this module. The
// cookie jar is not optional in practice: the identity server's login
// page sets session cookies that the credential POST must carry.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use url::Url;

use crate::error::Error;

const USER_AGENT: &str = concat!("brewcreator-rs/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Overall request timeout. The design assumes finite but generous
    /// transport timeouts; there is no separate per-operation timeout.
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder.build().map_err(Error::Transport)
    }

    /// Create a config with a fresh cookie jar (required for the login flow).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }
}

// ── Service endpoints ────────────────────────────────────────────────

/// Base URLs for the three BrewCreator service surfaces.
///
/// Defaults point at production; tests override them with local mock
/// servers.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    /// Equipment/telemetry REST API.
    pub api_url: Url,
    /// Identity server hosting the login page and token endpoint.
    pub identity_url: Url,
    /// Realtime websocket host (already `ws`/`wss` scheme).
    pub ws_url: Url,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            api_url: Url::parse("https://api.brewcreator.com").expect("static URL"),
            identity_url: Url::parse("https://identity.brewcreator.com").expect("static URL"),
            ws_url: Url::parse("wss://api.brewcreator.com").expect("static URL"),
        }
    }
}

impl ServiceEndpoints {
    /// Build the streaming URL for a negotiated realtime connection.
    ///
    /// `wss://…/telemetry?id={connection_token}&access_token={access}`
    pub fn telemetry_ws_url(
        &self,
        connection_token: &str,
        access_token: &str,
    ) -> Result<Url, Error> {
        let mut url = self.ws_url.join("/telemetry")?;
        url.query_pairs_mut()
            .append_pair("id", connection_token)
            .append_pair("access_token", access_token);
        Ok(url)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints_point_at_production() {
        let endpoints = ServiceEndpoints::default();
        assert_eq!(endpoints.api_url.as_str(), "https://api.brewcreator.com/");
        assert_eq!(
            endpoints.identity_url.as_str(),
            "https://identity.brewcreator.com/"
        );
        assert_eq!(endpoints.ws_url.scheme(), "wss");
    }

    #[test]
    fn telemetry_url_carries_connection_and_access_tokens() {
        let endpoints = ServiceEndpoints::default();
        let url = endpoints.telemetry_ws_url("conn-123", "tok-456").unwrap();

        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/telemetry");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("id".into(), "conn-123".into())));
        assert!(pairs.contains(&("access_token".into(), "tok-456".into())));
    }

    #[test]
    fn default_transport_has_generous_timeout() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.cookie_jar.is_none());
        assert!(config.with_cookie_jar().cookie_jar.is_some());
    }
}
