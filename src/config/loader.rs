//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::MembraneConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {name}: {reason}")]
    Env { name: &'static str, reason: String },
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the effective configuration: defaults, then the optional file,
/// then environment overrides, then validation.
///
/// `env` looks up a variable by name so callers can supply something other
/// than the process environment.
pub fn resolve_config<F>(path: Option<&Path>, env: F) -> Result<MembraneConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => MembraneConfig::default(),
    };
    apply_env(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<MembraneConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn apply_env<F>(config: &mut MembraneConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(address) = env("GATEWAY_ADDRESS") {
        // ":9001" style addresses bind every interface
        config.gateway.bind_address = match address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => address,
        };
    }
    if let Some(address) = env("CHILD_ADDRESS") {
        config.child.address = address;
    }
    if let Some(mode) = env("MEMBRANE_MODE") {
        config.mode = mode.parse().map_err(|reason| ConfigError::Env {
            name: "MEMBRANE_MODE",
            reason,
        })?;
    }
    if let Some(secs) = env("CHILD_TIMEOUT_SECS") {
        config.child.startup_timeout_secs = secs.parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Env {
                name: "CHILD_TIMEOUT_SECS",
                reason: e.to_string(),
            }
        })?;
    }
    // INVOKE is deprecated in favour of trailing command arguments.
    if config.child.command.is_empty() {
        if let Some(invoke) = env("INVOKE") {
            let command: Vec<String> = invoke.split_whitespace().map(String::from).collect();
            if !command.is_empty() {
                config.child.command = command;
            }
        }
    }
    Ok(())
}
