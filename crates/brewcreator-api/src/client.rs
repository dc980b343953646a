// BrewCreator equipment API client.
//
// Every outbound call to the vendor API funnels through `request()`:
// token validity, bounded retry, and status classification live in one
// place so no endpoint can bypass credential handling. Endpoint methods
// are thin wrappers that name a path and a response type.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode, header};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Error;
use crate::identity::IdentityFlow;
use crate::models::{EquipmentPage, NegotiateResponse, UpdateResponse};
use crate::store::TokenStore;
use crate::token::TokenManager;
use crate::transport::{ServiceEndpoints, TransportConfig};

/// Fixed attempt cap for the request executor.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
/// Fixed pause between attempts. No backoff growth: the API is low-QPS
/// and the delay only avoids hammering during transient failures.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Fleet listing query. One large page is assumed sufficient.
const EQUIPMENTS_PATH: &str =
    "/api/v1.0/equipments?PageSize=100&PageNumber=1&Logic=And&Filters=&Sorts=";
const NEGOTIATE_PATH: &str = "/telemetry/negotiate?negotiateVersion=1";

/// Attempt cap and inter-attempt delay for [`BrewCreatorClient::request`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Authenticated HTTP client for the equipment/telemetry endpoints.
pub struct BrewCreatorClient {
    http: reqwest::Client,
    endpoints: ServiceEndpoints,
    tokens: TokenManager,
    retry: RetryPolicy,
}

impl BrewCreatorClient {
    /// Build a client sharing one HTTP connection pool (and cookie jar)
    /// between the identity flow and the equipment API.
    pub fn new(
        username: String,
        password: SecretString,
        store: Arc<dyn TokenStore>,
        endpoints: ServiceEndpoints,
        transport: &TransportConfig,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        // The identity server's login flow is cookie-based; make sure the
        // shared client actually has a jar.
        let transport = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = transport.build_client()?;

        let identity = IdentityFlow::new(http.clone(), endpoints.clone());
        let tokens = TokenManager::new(identity, store, username, password);

        Ok(Self {
            http,
            endpoints,
            tokens,
            retry,
        })
    }

    pub fn endpoints(&self) -> &ServiceEndpoints {
        &self.endpoints
    }

    /// The token lifecycle manager (shared with the realtime session).
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    // ── Request executor ─────────────────────────────────────────────

    /// Execute an authenticated API call with bounded retry.
    ///
    /// Per attempt: ensure a valid token, send with a bearer header, then
    /// classify the status. 401 invalidates token state and retries (the
    /// next attempt re-authenticates); 500 and transport errors retry
    /// without invalidating; any other non-2xx fails immediately.
    /// Returns `None` for an empty 2xx body.
    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, Error> {
        let url = self.endpoints.api_url.join(path_and_query)?;
        let attempts = self.retry.attempts;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.retry.delay).await;
            }

            let access_token = match self.tokens.ensure_valid_token().await {
                Ok(token) => token,
                Err(err @ Error::InvalidCredentials) => return Err(err),
                Err(err) => {
                    warn!(error = %err, attempt, "could not obtain access token");
                    continue;
                }
            };

            debug!(%method, %url, attempt, "sending API request");

            let mut req = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(&access_token)
                .header(header::ACCEPT, "application/json");
            if let Some(body) = body {
                req = req.json(body);
            }

            let resp = match req.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    warn!(error = %err, attempt, "transport error");
                    continue;
                }
            };

            let status = resp.status();
            if status == StatusCode::UNAUTHORIZED {
                warn!(attempt, "access token rejected (401), invalidating");
                if let Err(err) = self.tokens.invalidate().await {
                    warn!(error = %err, "failed to clear persisted tokens");
                }
                continue;
            }
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                warn!(attempt, "server error (HTTP 500), will retry");
                continue;
            }
            if !status.is_success() {
                let message = resp.text().await.unwrap_or_default();
                return Err(Error::Request {
                    status: status.as_u16(),
                    message,
                });
            }

            let text = match resp.text().await {
                Ok(text) => text,
                Err(err) => {
                    warn!(error = %err, attempt, "failed to read response body");
                    continue;
                }
            };
            if text.is_empty() {
                return Ok(None);
            }
            return serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: text,
                });
        }

        Err(Error::RetriesExhausted { attempts })
    }

    /// `request()` plus typed deserialization of a mandatory body.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<&Value>,
    ) -> Result<T, Error> {
        let value = self
            .request(method, path_and_query, body)
            .await?
            .ok_or_else(|| Error::Deserialization {
                message: "empty response body".into(),
                body: String::new(),
            })?;
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        })
    }

    // ── Equipment endpoints ──────────────────────────────────────────

    /// Fetch the raw fleet listing as JSON (diagnostics surface).
    pub async fn equipment_json(&self) -> Result<Value, Error> {
        debug!("fetching raw equipment listing");
        self.request(Method::GET, EQUIPMENTS_PATH, None)
            .await?
            .ok_or_else(|| Error::Deserialization {
                message: "empty fleet listing body".into(),
                body: String::new(),
            })
    }

    /// Fetch one page of the fleet listing.
    pub async fn equipment_page(&self) -> Result<EquipmentPage, Error> {
        debug!("fetching equipment page");
        self.request_json(Method::GET, EQUIPMENTS_PATH, None).await
    }

    /// Partial update of a single device. The payload carries only the
    /// fields to change; returns the server's reported success flag.
    pub async fn update_equipment(&self, id: &str, payload: &Value) -> Result<bool, Error> {
        debug!(id, "updating equipment");
        let path = format!("/api/v1.0/equipments/{id}");
        let resp: UpdateResponse = self.request_json(Method::PUT, &path, Some(payload)).await?;
        Ok(resp.succeeded)
    }

    /// Negotiate a realtime connection token.
    pub async fn negotiate(&self) -> Result<String, Error> {
        debug!("negotiating realtime connection");
        let resp: NegotiateResponse = self.request_json(Method::POST, NEGOTIATE_PATH, None).await?;
        Ok(resp.connection_token)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_policy_matches_protocol_constants() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }
}
