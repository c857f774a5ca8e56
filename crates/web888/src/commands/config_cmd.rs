//! Config subcommand handlers.

use secrecy::SecretString;

use web888_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, apply_overrides};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with plaintext passwords masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("****".into());
        }
    }
    cfg
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for a password and store it in the system keyring.
fn prompt_and_store(profile_name: &str) -> Result<(), CliError> {
    let secret = rpassword::prompt_password("Admin password: ").map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "value cannot be empty".into(),
        });
    }
    web888_config::store_password(profile_name, &SecretString::from(secret))?;
    eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
    Ok(())
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    CliError::ProfileNotFound {
        name,
        available: cfg.profile_names(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path(global).display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default(global));
            let out = match global.output {
                OutputFormat::Table => toml::to_string_pretty(&cfg)
                    .map_err(|e| CliError::Render(e.to_string()))?,
                ref format => output::render_single(format, &cfg, |_| String::new())?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            store_password,
            force,
        } => {
            let path = config::config_path(global);
            let mut cfg = config::load_config_or_default(global);
            let profile_name = global.profile.clone().unwrap_or_else(|| "default".into());

            if cfg.profiles.contains_key(&profile_name) && !force {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: format!("'{profile_name}' already exists; pass --force to replace it"),
                });
            }
            let Some(ref host) = global.host else {
                return Err(CliError::Validation {
                    field: "host".into(),
                    reason: "pass --host <HOST> for the new profile".into(),
                });
            };

            let mut profile = Profile::new(host.clone());
            apply_overrides(&mut profile, global);
            web888_config::validate_profile(&profile)?;

            if store_password {
                prompt_and_store(&profile_name)?;
            }

            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.profiles.len() == 1 || cfg.default_profile.is_none() {
                cfg.default_profile = Some(profile_name.clone());
            }
            config::save_config(global, &cfg)?;

            eprintln!("✓ Configuration written to {}", path.display());
            eprintln!("  Profile: {profile_name}");
            eprintln!("\n  Test it: web888 status --profile {profile_name}");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default(global);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: web888 config init --host <HOST>");
            } else {
                let default = cfg.default_profile_name();
                for (name, profile) in &cfg.profiles {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}\t{}:{}", profile.host, profile.port);
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default(global);
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(global, &cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default(global);
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(profile_name, &cfg));
            }
            prompt_and_store(&profile_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_passwords() {
        let mut profile = Profile::new("rx.local");
        profile.password = Some("hunter2".into());
        profile.password_env = Some("RX_PW".into());
        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), profile);

        let masked = redacted(&cfg);
        let shown = &masked.profiles["default"];
        assert_eq!(shown.password.as_deref(), Some("****"));
        assert_eq!(shown.password_env.as_deref(), Some("RX_PW"));
        assert_eq!(cfg.profiles["default"].password.as_deref(), Some("hunter2"));
    }
}
