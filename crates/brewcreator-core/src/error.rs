// ── Core error types ──
//
// Consumer-facing errors. The `From<brewcreator_api::Error>` impl
// translates transport-layer failures into domain-appropriate variants;
// consumers never match on HTTP status codes directly.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ──────────────────────────────────────────────
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Connectivity ────────────────────────────────────────────────
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    // ── Service responses ───────────────────────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Invalid data from service: {message}")]
    InvalidData { message: String },

    // ── Realtime ────────────────────────────────────────────────────
    #[error("Realtime session already running")]
    RealtimeAlreadyRunning,

    // ── Persistence ─────────────────────────────────────────────────
    #[error("Token store failure: {message}")]
    TokenStore { message: String },
}

impl From<brewcreator_api::Error> for CoreError {
    fn from(err: brewcreator_api::Error) -> Self {
        use brewcreator_api::Error as ApiError;

        match err {
            ApiError::InvalidCredentials => Self::InvalidCredentials,
            ApiError::AuthInfra { message } => Self::AuthenticationFailed { message },
            ApiError::Request { status, message } => Self::Api {
                message,
                status: Some(status),
            },
            ApiError::RetriesExhausted { attempts } => Self::Api {
                message: format!("request failed after {attempts} attempts"),
                status: None,
            },
            ApiError::AlreadyRunning => Self::RealtimeAlreadyRunning,
            ApiError::WebSocket(reason) => Self::ConnectionFailed { reason },
            ApiError::Transport(e) => Self::ConnectionFailed {
                reason: e.to_string(),
            },
            ApiError::InvalidUrl(e) => Self::ConnectionFailed {
                reason: format!("invalid URL: {e}"),
            },
            ApiError::Deserialization { message, .. } => Self::InvalidData { message },
            ApiError::Store { message } => Self::TokenStore { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_translate_to_domain_variants() {
        let err: CoreError = brewcreator_api::Error::InvalidCredentials.into();
        assert!(matches!(err, CoreError::InvalidCredentials));

        let err: CoreError = brewcreator_api::Error::Request {
            status: 404,
            message: "missing".into(),
        }
        .into();
        assert!(matches!(
            err,
            CoreError::Api {
                status: Some(404),
                ..
            }
        ));

        let err: CoreError = brewcreator_api::Error::AlreadyRunning.into();
        assert!(matches!(err, CoreError::RealtimeAlreadyRunning));
    }
}
