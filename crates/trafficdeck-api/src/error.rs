use thiserror::Error;

/// Top-level error type for the `trafficdeck-api` crate.
///
/// Covers every failure mode of the backend surfaces: HTTP transport,
/// PostgREST error bodies, count headers, and the realtime websocket.
/// `trafficdeck-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Structured error returned by the backend (`{message, code, hint}` body).
    #[error("Backend error (HTTP {status}): {message}")]
    Backend {
        message: String,
        code: Option<String>,
        status: u16,
    },

    /// A COUNT request came back without a usable `Content-Range` header.
    #[error("Count missing from response for table '{table}'")]
    MissingCount { table: String },

    // ── Realtime ────────────────────────────────────────────────────
    /// Realtime websocket connection failed.
    #[error("Realtime connection failed: {0}")]
    WebSocketConnect(String),

    /// Realtime websocket closed unexpectedly.
    #[error("Realtime socket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::WebSocketConnect(_) => true,
            Self::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Backend { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Extract the backend error code, if available.
    pub fn backend_code(&self) -> Option<&str> {
        match self {
            Self::Backend { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Backend {
            message: "upstream unavailable".into(),
            code: None,
            status: 503,
        };
        assert!(err.is_transient());
        assert!(!err.is_not_found());
    }

    #[test]
    fn missing_table_is_not_found() {
        let err = Error::Backend {
            message: "relation \"public.lights\" does not exist".into(),
            code: Some("42P01".into()),
            status: 404,
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
        assert_eq!(err.backend_code(), Some("42P01"));
    }
}
