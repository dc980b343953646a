// Token lifecycle management.
//
// Owns the in-memory access/refresh token pair and its expiry, decides
// when a refresh or full re-login is required, and mirrors every change
// into the token store. All mutation happens under one mutex so that the
// foreground request flow, the realtime supervisor, and the keepalive
// sender can never race two refresh attempts.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::identity::{IdentityFlow, TokenSet};
use crate::store::{StoredTokens, TokenStore};

/// Tokens expiring within this window are treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 120;

#[derive(Debug, Default)]
struct TokenState {
    /// The store is consulted exactly once per process lifetime.
    loaded: bool,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    /// The access token, if it does not expire within the skew window.
    fn valid_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(expires_at))
                if now < expires_at - Duration::seconds(EXPIRY_SKEW_SECS) =>
            {
                Some(token)
            }
            _ => None,
        }
    }

    fn apply(&mut self, set: &TokenSet) {
        self.access_token = Some(set.access_token.clone());
        self.refresh_token = set.refresh_token.clone();
        self.expires_at = Some(set.expires_at);
    }

    fn clear(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.expires_at = None;
    }

    fn to_stored(&self) -> StoredTokens {
        StoredTokens {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Single owner of the credential/token state.
pub struct TokenManager {
    identity: IdentityFlow,
    store: Arc<dyn TokenStore>,
    username: String,
    password: SecretString,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(
        identity: IdentityFlow,
        store: Arc<dyn TokenStore>,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            identity,
            store,
            username,
            password,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Return a usable access token, going to the network only when the
    /// current one is missing or expiring within two minutes.
    ///
    /// Preference order: cached token, refresh grant, full credential
    /// exchange. Credential rejections propagate untouched -- they are
    /// terminal and must not be retried here.
    pub async fn ensure_valid_token(&self) -> Result<String, Error> {
        let mut state = self.state.lock().await;

        if !state.loaded {
            let stored = self.store.load().await?;
            state.access_token = stored.access_token;
            state.refresh_token = stored.refresh_token;
            state.expires_at = stored.expires_at;
            state.loaded = true;
            debug!(
                has_access = state.access_token.is_some(),
                has_refresh = state.refresh_token.is_some(),
                "loaded persisted tokens"
            );
        }

        if let Some(token) = state.valid_access_token(Utc::now()) {
            return Ok(token.to_owned());
        }

        let set = if let Some(refresh_token) = state.refresh_token.clone() {
            debug!("access token missing or expiring, refreshing");
            self.identity.refresh(&refresh_token).await?
        } else {
            info!("no usable refresh token, performing full login");
            self.identity.login(&self.username, &self.password).await?
        };

        state.apply(&set);
        self.store.save(state.to_stored()).await?;
        Ok(set.access_token)
    }

    /// Drop all token state, in memory and in the store.
    ///
    /// Called when the server rejects the access token outright --
    /// expiry-based validity was evidently wrong, so nothing of the old
    /// state is worth keeping.
    pub async fn invalidate(&self) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.clear();
        state.loaded = true;
        warn!("token state invalidated");
        self.store.save(StoredTokens::cleared()).await
    }

    /// Unconditionally perform the full credential exchange and persist
    /// the result. Used to verify an account before regular operation.
    pub async fn authenticate(&self) -> Result<(), Error> {
        let set = self.identity.login(&self.username, &self.password).await?;
        let mut state = self.state.lock().await;
        state.apply(&set);
        state.loaded = true;
        self.store.save(state.to_stored()).await
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTokenStore;
    use crate::transport::{ServiceEndpoints, TransportConfig};
    use url::Url;

    /// Manager whose identity endpoints point nowhere routable -- any
    /// network attempt fails fast and loudly.
    fn offline_manager(store: Arc<dyn TokenStore>) -> TokenManager {
        let endpoints = ServiceEndpoints {
            api_url: Url::parse("http://127.0.0.1:9").unwrap(),
            identity_url: Url::parse("http://127.0.0.1:9").unwrap(),
            ws_url: Url::parse("ws://127.0.0.1:9").unwrap(),
        };
        let http = TransportConfig::default().build_client().unwrap();
        TokenManager::new(
            IdentityFlow::new(http, endpoints),
            store,
            "brewer@example.com".into(),
            SecretString::from("hunter2"),
        )
    }

    #[tokio::test]
    async fn fresh_token_needs_no_network() {
        let store = Arc::new(MemoryTokenStore::with_tokens(StoredTokens {
            access_token: Some("cached".into()),
            refresh_token: Some("refresh".into()),
            expires_at: Some(Utc::now() + Duration::minutes(30)),
        }));
        let manager = offline_manager(store);

        // Would fail with a transport error if it touched the network.
        let token = manager.ensure_valid_token().await.unwrap();
        assert_eq!(token, "cached");
    }

    #[tokio::test]
    async fn token_inside_skew_window_is_not_trusted() {
        let store = Arc::new(MemoryTokenStore::with_tokens(StoredTokens {
            access_token: Some("stale".into()),
            refresh_token: None,
            expires_at: Some(Utc::now() + Duration::seconds(60)),
        }));
        let manager = offline_manager(store);

        // 60s remaining is inside the 2-minute skew: a full login is
        // attempted and fails against the unroutable endpoint.
        let err = manager.ensure_valid_token().await.unwrap_err();
        assert!(matches!(err, Error::AuthInfra { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn invalidate_clears_memory_and_store() {
        let store = Arc::new(MemoryTokenStore::with_tokens(StoredTokens {
            access_token: Some("cached".into()),
            refresh_token: Some("refresh".into()),
            expires_at: Some(Utc::now() + Duration::minutes(30)),
        }));
        let manager = offline_manager(store.clone());

        manager.ensure_valid_token().await.unwrap();
        manager.invalidate().await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
        // In-memory state is gone too: the next call hits the network
        // (and fails here, since the endpoints are unroutable).
        assert!(manager.ensure_valid_token().await.is_err());
    }

    #[test]
    fn skew_window_boundary() {
        let now = Utc::now();
        let state = TokenState {
            loaded: true,
            access_token: Some("t".into()),
            refresh_token: None,
            expires_at: Some(now + Duration::seconds(EXPIRY_SKEW_SECS + 1)),
        };
        assert!(state.valid_access_token(now).is_some());

        let state = TokenState {
            expires_at: Some(now + Duration::seconds(EXPIRY_SKEW_SECS - 1)),
            ..state
        };
        assert!(state.valid_access_token(now).is_none());
    }
}
