#![allow(clippy::unwrap_used)]

use std::path::Path;

use pretty_assertions::assert_eq;
use trafficdeck_config::{load_config_from, profile_to_backend_config};

const CONFIG: &str = r#"
default_profile = "city"

[defaults]
output = "json"
timeout = 12

[profiles.city]
backend = "https://city.example.co"
api_key = "anon-key"

[profiles.lab]
backend = "http://127.0.0.1:54321"
api_key = "lab-key"
realtime = false
"#;

#[test]
fn loads_profiles_from_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", CONFIG)?;
        let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;

        assert_eq!(cfg.profile_name(None), "city");
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.profiles.len(), 2);

        let lab = cfg.profile("lab").map_err(|e| e.to_string())?;
        let backend = profile_to_backend_config(lab, "trafficdeck-test-lab", &cfg.defaults)
            .map_err(|e| e.to_string())?;
        assert!(!backend.realtime_enabled);
        assert_eq!(backend.timeout.as_secs(), 12);
        Ok(())
    });
}

#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", CONFIG)?;
        jail.set_env("TRAFFICDECK_DEFAULT_PROFILE", "lab");
        jail.set_env("TRAFFICDECK_DEFAULTS__OUTPUT", "yaml");
        jail.set_env("TRAFFICDECK_PROFILES__CITY__BACKEND", "https://override.example.co");

        let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
        assert_eq!(cfg.profile_name(None), "lab");
        assert_eq!(cfg.defaults.output, "yaml");
        assert_eq!(
            cfg.profile("city").map_err(|e| e.to_string())?.backend,
            "https://override.example.co"
        );
        Ok(())
    });
}

#[test]
fn missing_file_yields_defaults() {
    figment::Jail::expect_with(|_jail| {
        let cfg = load_config_from(Path::new("nope.toml")).map_err(|e| e.to_string())?;
        assert_eq!(cfg.profile_name(None), "default");
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.defaults.timeout, 30);
        Ok(())
    });
}

#[test]
fn unknown_profile_is_an_error() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", CONFIG)?;
        let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
        assert!(cfg.profile("nowhere").is_err());
        Ok(())
    });
}
