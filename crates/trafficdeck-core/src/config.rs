// ── Runtime backend configuration ──
//
// These types describe *how* to reach the data backend. They carry the
// API key and connection tuning, but never touch disk. The CLI builds a
// `BackendConfig` (usually via trafficdeck-config) and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-hosted backends with self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one backend project.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend root URL (e.g., `https://xyzcompany.supabase.co`).
    pub url: Url,
    /// Project API key, sent on every request.
    pub api_key: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Open realtime change feeds for stores that subscribe.
    pub realtime_enabled: bool,
}

impl BackendConfig {
    /// Config with default tuning: system TLS, 30s timeout, realtime on.
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url,
            api_key,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            realtime_enabled: true,
        }
    }

    pub(crate) fn transport(&self) -> trafficdeck_api::TransportConfig {
        use trafficdeck_api::TlsMode;

        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        trafficdeck_api::TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
