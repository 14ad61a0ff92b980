// ── Core error types ──
//
// Domain-level errors from trafficdeck-core. Consumers never see HTTP
// status codes or JSON parse failures directly; the
// `From<trafficdeck_api::Error>` impl translates transport-layer errors.
//
// Stores never return these from `refresh`: fetch failures are caught at
// the store boundary and replaced by the fallback dataset.

use thiserror::Error;

use crate::navigation::ViewId;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Backend / data errors ────────────────────────────────────────
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        code: Option<String>,
        status: Option<u16>,
    },

    #[error("Unexpected data from backend: {message}")]
    Deserialization { message: String },

    #[error("Operation not supported: {operation} (requires {required})")]
    Unsupported { operation: String, required: String },

    // ── Navigation ───────────────────────────────────────────────────
    #[error("Transition '{event}' is not defined from the {from} view")]
    InvalidTransition { from: ViewId, event: &'static str },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<trafficdeck_api::Error> for CoreError {
    fn from(err: trafficdeck_api::Error) -> Self {
        use trafficdeck_api::Error as ApiError;

        match err {
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Backend {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Backend {
                message,
                code,
                status,
            } => CoreError::Backend {
                message,
                code,
                status: Some(status),
            },
            ApiError::MissingCount { table } => CoreError::Deserialization {
                message: format!("no row count returned for '{table}'"),
            },
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("realtime connection failed: {reason}"),
            },
            ApiError::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("realtime socket closed (code {code}): {reason}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Deserialization { message }
            }
        }
    }
}
