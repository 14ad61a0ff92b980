//! CLI configuration: thin wrapper around `trafficdeck_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--backend, --api-key, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use trafficdeck_core::{BackendConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use trafficdeck_config::{
    Config, Defaults, Profile, config_path, load_config, parse_backend_url,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// `--timeout`, else the profile's, else the config file default.
pub fn resolve_timeout(flag: Option<u64>, profile: Option<u64>, defaults: &Defaults) -> Duration {
    Duration::from_secs(flag.or(profile).unwrap_or(defaults.timeout))
}

/// Build the `BackendConfig` for a data command.
///
/// One-shot commands pass `realtime = false` so no change feed is opened.
/// A config file that exists but does not parse is an error, not "no config".
pub fn build_backend_config(global: &GlobalOpts, realtime: bool) -> Result<BackendConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        let mut config = resolve_profile(profile, &profile_name, &cfg.defaults, global)?;
        config.realtime_enabled &= realtime;
        return Ok(config);
    }

    if global.profile.is_some() {
        let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    // No profile: flags / env vars alone.
    let url_str = global.backend.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = parse_backend_url(url_str)?;
    let api_key = global
        .api_key
        .clone()
        .map(SecretString::from)
        .ok_or(CliError::NoCredentials {
            profile: profile_name,
        })?;

    let mut config = BackendConfig::new(url, api_key);
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    config.timeout = resolve_timeout(global.timeout, None, &cfg.defaults);
    config.realtime_enabled = realtime;
    Ok(config)
}

/// Translate a `Profile` + global flags into a `BackendConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<BackendConfig, CliError> {
    let url = parse_backend_url(global.backend.as_deref().unwrap_or(&profile.backend))?;

    let api_key = match global.api_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => trafficdeck_config::resolve_api_key(profile, profile_name)?,
    };

    let mut config = BackendConfig::new(url, api_key);
    config.tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        trafficdeck_config::tls_for(profile)
    };
    config.timeout = resolve_timeout(global.timeout, profile.timeout, defaults);
    config.realtime_enabled = profile.realtime.unwrap_or(true);
    Ok(config)
}
