//! CLI configuration: thin wrapper around `web888_config` shared types.
//!
//! Adds the `--config` path override and the flag overrides from
//! `GlobalOpts` (--host, --port, --mode, --password-env, --timeout).

use std::path::PathBuf;

use web888_config::{Config, ConfigError, Profile};
use web888_core::MonitorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config` or the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(web888_config::config_path)
}

pub fn load_config(global: &GlobalOpts) -> Result<Config, ConfigError> {
    web888_config::load_config_from(&config_path(global))
}

pub fn load_config_or_default(global: &GlobalOpts) -> Config {
    load_config(global).unwrap_or_default()
}

pub fn save_config(global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    web888_config::save_config_to(cfg, &config_path(global))?;
    Ok(())
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Copy flag overrides onto a profile.
pub fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if let Some(mode) = global.mode {
        profile.mode = mode.into();
    }
    if let Some(ref env) = global.password_env {
        profile.password_env = Some(env.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

/// The receiver a command should talk to.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub config: MonitorConfig,
}

impl Resolved {
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }
}

/// Build a `MonitorConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--host` alone is enough.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config(global)?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None => match global.host {
            Some(ref host) => Profile::new(host.clone()),
            None if global.profile.is_some() => {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: cfg.profile_names(),
                });
            }
            None => {
                return Err(CliError::NoConfig {
                    path: config_path(global).display().to_string(),
                });
            }
        },
    };
    apply_overrides(&mut profile, global);

    let config = web888_config::profile_to_monitor_config(&profile, &profile_name)?;
    Ok(Resolved {
        profile_name,
        config,
    })
}
