//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text. Backend failures on data commands never reach
//! here: the stores fall back to bundled data instead.

use miette::Diagnostic;
use thiserror::Error;

use trafficdeck_config::ConfigError;
use trafficdeck_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to backend at {url}")]
    #[diagnostic(
        code(trafficdeck::connection_failed),
        help(
            "Check that the backend is reachable.\n\
             URL: {url}\n\
             Try: trafficdeck stats --insecure"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(trafficdeck::timeout),
        help("Increase timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    #[error("Backend error ({code}): {message}")]
    #[diagnostic(code(trafficdeck::backend_error))]
    Backend { code: String, message: String },

    #[error("Operation '{operation}' is not available")]
    #[diagnostic(
        code(trafficdeck::unsupported),
        help("This command requires {required}.")
    )]
    Unsupported { operation: String, required: String },

    // ── Credentials ──────────────────────────────────────────────────
    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(trafficdeck::no_credentials),
        help(
            "Pass --api-key, set TRAFFICDECK_API_KEY, or store one with:\n\
             trafficdeck config set-key --profile {profile}"
        )
    )]
    NoCredentials { profile: String },

    // ── Navigation ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(trafficdeck::navigation),
        help("Type 'help' in the session to list the commands available.")
    )]
    Navigation { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(trafficdeck::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(trafficdeck::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(trafficdeck::no_config),
        help(
            "Pass --backend and --api-key, or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(trafficdeck::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(code(trafficdeck::keyring))]
    Keyring(#[from] keyring::Error),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(trafficdeck::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(trafficdeck::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(trafficdeck::toml))]
    Toml(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(trafficdeck::internal))]
    Internal(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NoCredentials { .. } | Self::Keyring(_) => exit_code::AUTH,
            Self::Validation { .. }
            | Self::Navigation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Backend { message, code, .. } => CliError::Backend {
                code: code.unwrap_or_else(|| "unknown".into()),
                message,
            },
            CoreError::Deserialization { message } => CliError::Backend {
                code: "bad_payload".into(),
                message,
            },
            CoreError::Unsupported {
                operation,
                required,
            } => CliError::Unsupported {
                operation,
                required,
            },
            e @ CoreError::InvalidTransition { .. } => CliError::Navigation {
                message: e.to_string(),
            },
            CoreError::Config { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Serialization(e) => CliError::Toml(e.to_string()),
            ConfigError::Figment(e) => CliError::Config(e),
        }
    }
}
