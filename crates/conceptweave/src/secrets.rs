//! Resolution of the model provider credential.
//!
//! Sources are tried in priority order:
//!
//! 1. **Direct value** - for quick local testing (`apiKey` in the config)
//! 2. **File reference** - for the Docker secrets pattern (`apiKeyFile: /run/secrets/cohere`)
//! 3. **Env var reference** - for production (`apiKeyEnvVar: COHERE_API_KEY`)

use secrecy::SecretString;
use std::fs;

use crate::config::EnrichmentConfig;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No credential source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Secret from {origin} is empty")]
    Empty { origin: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from the first configured source.
///
/// Empty strings count as "not configured". A configured source that fails
/// (unreadable file, unset variable) is an error rather than a fall-through,
/// so a typo in a path is reported instead of silently using another source.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct {
        if !value.is_empty() {
            return Ok(SecretString::from(value.to_string()));
        }
    }

    if let Some(path) = file_path {
        if !path.is_empty() {
            let expanded = expand_home(path);
            let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
                path: expanded.clone(),
                source: e,
            })?;
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(SecretError::Empty { origin: expanded });
            }
            return Ok(SecretString::from(trimmed.to_string()));
        }
    }

    if let Some(var_name) = env_var {
        if !var_name.is_empty() {
            return match std::env::var(var_name) {
                Ok(value) if value.trim().is_empty() => Err(SecretError::Empty {
                    origin: var_name.to_string(),
                }),
                Ok(value) => Ok(SecretString::from(value.trim().to_string())),
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: var_name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: var_name.to_string(),
                }),
            };
        }
    }

    Err(SecretError::NoSourceProvided)
}

/// Resolves the provider API key from an enrichment config section.
pub fn resolve_api_key(config: &EnrichmentConfig) -> Result<SecretString> {
    resolve_secret(
        config.api_key.as_deref(),
        config.api_key_file.as_deref(),
        config.api_key_env_var.as_deref(),
    )
}

/// Checks if at least one secret source is configured (non-empty).
pub fn has_secret_source(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> bool {
    direct.is_some_and(|s| !s.is_empty())
        || file_path.is_some_and(|s| !s.is_empty())
        || env_var.is_some_and(|s| !s.is_empty())
}

/// Expands a leading `~` to the user's home directory.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
