//! Config subcommand handlers. None of these touch the backend.

use std::io::Read;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

fn profile_list(cfg: &Config, active: &str) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| {
            let marker = if name == active { "*" } else { " " };
            let backend = &cfg.profiles[name].backend;
            format!("{marker} {name}  {backend}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let body = cfg.to_redacted_toml()?;
            let path = config::config_path();
            output::print_output(&format!("# {}\n{body}", path.display()), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            if cfg.profiles.is_empty() {
                if !global.quiet {
                    eprintln!(
                        "No profiles configured in {}",
                        config::config_path().display()
                    );
                }
                return Ok(());
            }
            let active = config::active_profile_name(global, &cfg);
            output::print_output(&profile_list(&cfg, &active), global.quiet);
            Ok(())
        }

        ConfigCommand::SetKey => {
            let cfg = config::load_config()?;
            let profile = config::active_profile_name(global, &cfg);

            let mut key = String::new();
            std::io::stdin().read_to_string(&mut key)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "api key".into(),
                    reason: "nothing was read from stdin".into(),
                });
            }

            let entry = keyring::Entry::new(
                trafficdeck_config::KEYRING_SERVICE,
                &format!("{profile}/api-key"),
            )?;
            entry.set_password(key)?;
            if !global.quiet {
                eprintln!("API key for profile '{profile}' stored in system keyring");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use trafficdeck_config::Profile;

    use super::*;

    #[test]
    fn marks_active_profile() {
        let mut cfg = Config::default();
        for (name, url) in [("city", "https://city.example"), ("lab", "http://lab:3000")] {
            cfg.profiles.insert(
                name.into(),
                Profile {
                    backend: url.into(),
                    ..Profile::default()
                },
            );
        }

        let listing = profile_list(&cfg, "lab");
        assert_eq!(
            listing,
            "  city  https://city.example\n* lab  http://lab:3000"
        );
    }
}
