use std::path::PathBuf;
use thiserror::Error;

use crate::enrichment::EnrichmentError;
use crate::job::TransitionError;
use crate::pipeline::PipelineError;

#[derive(Error, Debug)]
pub enum ConceptWeaveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Submission rejected: {0}")]
    Submit(#[from] SubmitError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Invalid job transition: {0}")]
    Transition(#[from] TransitionError),

    #[error("No async runtime available: {0}")]
    Runtime(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid environment override '{name}': {reason}")]
    InvalidOverride { name: String, reason: String },
}

/// Rejections raised synchronously at submission; no job is created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File type not allowed: {mime_type}")]
    UnsupportedType { mime_type: String },

    #[error("File is too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("No file content provided")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to process PDF: {0}")]
    Pdf(String),

    #[error("Failed to process PPTX: {0}")]
    Pptx(String),

    #[error("Failed to process DOCX: {0}")]
    Docx(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error(
        "Not enough readable text found in this file to generate a meaningful summary \
         ({found} characters, at least {minimum} required)"
    )]
    InsufficientContent { found: usize, minimum: usize },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read stored file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Invalid stored reference: {0}")]
    InvalidRef(String),
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to store upload: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to register job: {0}")]
    Register(#[from] TransitionError),
}

pub type Result<T> = std::result::Result<T, ConceptWeaveError>;
