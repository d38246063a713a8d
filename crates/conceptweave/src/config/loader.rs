use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

/// Upload directory override, applied after the file is parsed.
pub const UPLOAD_DIR_ENV: &str = "UPLOAD_DIR";
/// Upload size limit override in bytes.
pub const MAX_FILE_SIZE_ENV: &str = "MAX_FILE_SIZE";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let mut config: Config = serde_json::from_value(json_value)?;

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

/// Defaults plus environment overrides, for running without a config file.
pub fn default_config() -> Result<Config, ConfigError> {
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();

    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Ok(dir) = std::env::var(UPLOAD_DIR_ENV) {
        if !dir.trim().is_empty() {
            config.storage.upload_directory = dir;
        }
    }

    if let Ok(size) = std::env::var(MAX_FILE_SIZE_ENV) {
        config.storage.max_file_size =
            size.trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidOverride {
                    name: MAX_FILE_SIZE_ENV.to_string(),
                    reason: e.to_string(),
                })?;
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.storage.max_file_size == 0 {
        return Err(ConfigError::Validation {
            message: "storage.maxFileSize must be greater than zero".to_string(),
        });
    }

    if config.extraction.timeout_secs == 0 || config.enrichment.timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "timeouts must be at least one second".to_string(),
        });
    }

    if let Err(e) = reqwest::Url::parse(&config.enrichment.base_url) {
        return Err(ConfigError::Validation {
            message: format!(
                "enrichment.baseUrl '{}' is not a valid URL: {}",
                config.enrichment.base_url, e
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_load_minimal_config() {
        let config = load_config_from_str(r#"{"version": "1.0"}"#).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.extraction.min_text_length, 20);
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"version": "1.0", "storage": {{"uploadDirectory": "/srv/uploads"}}}}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.storage.upload_directory, "/srv/uploads");
    }

    #[test]
    fn test_missing_file_error() {
        let result = load_config("/nonexistent/conceptweave.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_invalid_json_error() {
        let result = load_config_from_str("{not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_schema_rejects_unknown_key() {
        let result = load_config_from_str(r#"{"version": "1.0", "port": 4000}"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_schema_rejects_wrong_version() {
        let result = load_config_from_str(r#"{"version": "2.0"}"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_schema_rejects_zero_file_size() {
        let result = load_config_from_str(r#"{"version": "1.0", "storage": {"maxFileSize": 0}}"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    #[serial]
    fn test_invalid_base_url() {
        let result =
            load_config_from_str(r#"{"version": "1.0", "enrichment": {"baseUrl": "not a url"}}"#);
        match result {
            Err(ConfigError::Validation { message }) => assert!(message.contains("baseUrl")),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var(UPLOAD_DIR_ENV, "/tmp/override-uploads");
        std::env::set_var(MAX_FILE_SIZE_ENV, "2048");

        let config = load_config_from_str(r#"{"version": "1.0"}"#).unwrap();

        std::env::remove_var(UPLOAD_DIR_ENV);
        std::env::remove_var(MAX_FILE_SIZE_ENV);

        assert_eq!(config.storage.upload_directory, "/tmp/override-uploads");
        assert_eq!(config.storage.max_file_size, 2048);
    }

    #[test]
    #[serial]
    fn test_invalid_size_override() {
        std::env::set_var(MAX_FILE_SIZE_ENV, "fifty megabytes");

        let result = default_config();

        std::env::remove_var(MAX_FILE_SIZE_ENV);

        match result {
            Err(ConfigError::InvalidOverride { name, .. }) => assert_eq!(name, MAX_FILE_SIZE_ENV),
            other => panic!("Expected InvalidOverride error, got {:?}", other),
        }
    }
}
