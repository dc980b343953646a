// Identity-server credential exchange.
//
// The BrewCreator identity server has no API-first login: authentication
// goes through the human web flow. Full login is four steps, each its own
// failure domain:
//   1. scrape the anti-forgery token from the login page,
//   2. generate a PKCE verifier/challenge pair plus nonce and state,
//   3. POST credentials and follow redirects to the authorization code,
//   4. exchange code + verifier for tokens at the token endpoint.
// Refresh is a single call to the same token endpoint.

use std::sync::LazyLock;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, distr::Alphanumeric};
use regex::Regex;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Error;
use crate::models::TokenResponse;
use crate::transport::ServiceEndpoints;

const CLIENT_ID: &str = "brew-creator";
const REDIRECT_URI: &str = "https://brewcreator.com";
// Scope list, pre-encoded for embedding in the authorize URL.
const SCOPE_ENCODED: &str = "openid%20profile%20email%20phone%20roles%20brewer-access%20offline_access";

const LOGIN_PAGE_PATH: &str = "/Account/Login";
const LOGIN_POST_PATH: &str = "/account/login";
const TOKEN_PATH: &str = "/connect/token";

const STATE_LEN: usize = 32;
const NONCE_LEN: usize = 32;
const CODE_VERIFIER_LEN: usize = 64;

/// Hidden anti-forgery input on the login page.
static VERIFICATION_TOKEN_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<input name="__RequestVerificationToken" type="hidden" value="([^"]*)""#)
        .expect("static regex")
});

/// Freshly exchanged tokens with an absolute expiry.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<TokenResponse> for TokenSet {
    fn from(resp: TokenResponse) -> Self {
        Self {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            expires_at: Utc::now() + Duration::seconds(resp.expires_in),
        }
    }
}

/// Stateless driver for the identity-server flows.
///
/// Shares the caller's `reqwest::Client` -- the login flow depends on the
/// cookie jar the client was built with.
pub struct IdentityFlow {
    http: reqwest::Client,
    endpoints: ServiceEndpoints,
}

impl IdentityFlow {
    pub fn new(http: reqwest::Client, endpoints: ServiceEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// Full credential exchange: CSRF scrape, PKCE, credential POST,
    /// authorization code, token exchange.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<TokenSet, Error> {
        let csrf_token = self.fetch_verification_token().await?;

        let nonce = random_string(NONCE_LEN);
        let state = random_string(STATE_LEN);
        let code_verifier = random_string(CODE_VERIFIER_LEN);
        let code_challenge = pkce_challenge(&code_verifier);

        let mut login_url = self.endpoints.identity_url.join(LOGIN_POST_PATH)?;
        login_url
            .query_pairs_mut()
            .append_pair("returnurl", &authorize_path(&nonce, &state, &code_challenge));

        debug!("submitting credentials to identity server");

        let resp = self
            .http
            .post(login_url)
            .form(&[
                ("Email", username),
                ("Password", password.expose_secret()),
                ("__RequestVerificationToken", csrf_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::AuthInfra {
                message: format!("login request failed: {e}"),
            })?;

        // Redirects were followed; the final URL tells us how it went.
        // Landing back on the login page means the credentials were
        // rejected and the form was re-rendered.
        let final_url = resp.url().clone();
        if final_url.path().eq_ignore_ascii_case(LOGIN_POST_PATH) {
            return Err(Error::InvalidCredentials);
        }

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::AuthInfra {
                message: format!("login flow ended with HTTP {status} at {final_url}"),
            });
        }

        let code = final_url
            .query_pairs()
            .find(|(k, v)| k == "code" && !v.is_empty())
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| Error::AuthInfra {
                message: format!(
                    "no authorization code in redirect query: {}",
                    final_url.query().unwrap_or_default()
                ),
            })?;

        self.exchange_code(&code, &code_verifier).await
    }

    /// Refresh-token grant against the token endpoint.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, Error> {
        debug!("exchanging refresh token");
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("client_id", CLIENT_ID),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    // ── Flow steps ───────────────────────────────────────────────────

    /// Fetch the login page and scrape the anti-forgery token.
    async fn fetch_verification_token(&self) -> Result<String, Error> {
        let url = self.endpoints.identity_url.join(LOGIN_PAGE_PATH)?;
        debug!("fetching login page");

        let resp = self.http.get(url).send().await.map_err(|e| Error::AuthInfra {
            message: format!("login page unreachable: {e}"),
        })?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(Error::AuthInfra {
                message: format!("login page returned HTTP {status}"),
            });
        }

        let body = resp.text().await.map_err(|e| Error::AuthInfra {
            message: format!("failed to read login page: {e}"),
        })?;

        extract_verification_token(&body).ok_or_else(|| Error::AuthInfra {
            message: "anti-forgery token not found in login page".into(),
        })
    }

    /// Exchange the authorization code + PKCE verifier for tokens.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenSet, Error> {
        debug!("exchanging authorization code");
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("client_id", CLIENT_ID),
            ("code_verifier", code_verifier),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
        ])
        .await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenSet, Error> {
        let url = self.endpoints.identity_url.join(TOKEN_PATH)?;

        let resp = self
            .http
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| Error::AuthInfra {
                message: format!("token endpoint unreachable: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::AuthInfra {
                message: format!("token endpoint returned HTTP {status}: {body}"),
            });
        }

        let body = resp.text().await.map_err(|e| Error::AuthInfra {
            message: format!("failed to read token response: {e}"),
        })?;
        let tokens: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        Ok(tokens.into())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// The authorize URL embedded (URL-encoded) as the login form's return URL.
fn authorize_path(nonce: &str, state: &str, code_challenge: &str) -> String {
    let redirect: String =
        url::form_urlencoded::byte_serialize(REDIRECT_URI.as_bytes()).collect();
    format!(
        "/connect/authorize?client_id={CLIENT_ID}&redirect_uri={redirect}\
         &response_type=code&scope={SCOPE_ENCODED}&nonce={nonce}&state={state}\
         &code_challenge={code_challenge}&code_challenge_method=S256&ui_locales=en-US"
    )
}

fn extract_verification_token(html: &str) -> Option<String> {
    VERIFICATION_TOKEN_INPUT
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// RFC 7636 S256: base64url (no padding) of the verifier's SHA-256 digest.
fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

// ── Tests ────────────────────────────────────────────────────────────
