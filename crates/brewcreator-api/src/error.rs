use thiserror::Error;

/// Top-level error type for the `brewcreator-api` crate.
///
/// Covers every failure mode across the API surface: the identity-server
/// login flow, token persistence, authenticated requests, and the realtime
/// channel. `brewcreator-core` maps these into consumer-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Username/password rejected by the identity server. Terminal --
    /// never retried, surfaced straight to the caller.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Unexpected shape or status during the login or token-exchange flow
    /// (unreachable login page, missing anti-forgery token, missing
    /// redirect code, non-success at an auth endpoint).
    #[error("Authentication infrastructure error: {message}")]
    AuthInfra { message: String },

    // ── Request execution ───────────────────────────────────────────
    /// Non-2xx API response that is neither 401 nor 500 -- not retried.
    #[error("API request failed (HTTP {status}): {message}")]
    Request { status: u16, message: String },

    /// The request executor ran out of attempts.
    #[error("Request failed after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    // ── Realtime ────────────────────────────────────────────────────
    /// A realtime session start was requested while one is active.
    #[error("Realtime session already running")]
    AlreadyRunning,

    /// WebSocket connect/handshake/send failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Persistence ─────────────────────────────────────────────────
    /// Token store load/save failure.
    #[error("Token store error: {message}")]
    Store { message: String },
}

impl Error {
    /// Returns `true` for credential rejections that must never be retried.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }

    /// Returns `true` if this error came out of the login/exchange flow
    /// rather than an equipment API call.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::AuthInfra { .. })
    }
}
