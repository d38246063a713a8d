use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            storage: StorageConfig::default(),
            extraction: ExtractionConfig::default(),
            enrichment: EnrichmentConfig::default(),
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default = "default_upload_directory")]
    pub upload_directory: String,
    /// Upload size limit in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_upload_directory() -> String {
    dirs::data_dir()
        .map(|p| {
            p.join("conceptweave")
                .join("uploads")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "uploads".to_string())
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_directory: default_upload_directory(),
            max_file_size: default_max_file_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// Trimmed text shorter than this (in characters) fails the job.
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_min_text_length() -> usize {
    20
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_length: default_min_text_length(),
            ocr_language: default_ocr_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Hosted text-generation model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Text beyond this many characters is not sent to the model.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Direct API key. Prefer `api_key_file` or `api_key_env_var` outside local testing.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: Option<String>,
}

fn default_base_url() -> String {
    "https://api.cohere.com".to_string()
}

fn default_model() -> String {
    "command-a-03-2025".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_max_input_chars() -> usize {
    100_000
}

fn default_api_key_env_var() -> Option<String> {
    Some("COHERE_API_KEY".to_string())
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            max_input_chars: default_max_input_chars(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
            api_key_file: None,
            api_key_env_var: default_api_key_env_var(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    /// Pause between a finished job and the next dispatch.
    #[serde(default = "default_continuation_delay_ms")]
    pub continuation_delay_ms: u64,
}

fn default_continuation_delay_ms() -> u64 {
    100
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            continuation_delay_ms: default_continuation_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
