pub mod config;
pub mod enrichment;
pub mod error;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod secrets;
pub mod service;
pub mod storage;
pub mod worker;

pub use config::{load_config, Config};
pub use enrichment::{ConceptMap, EnrichmentClient, EnrichmentError, TextGenerator};
pub use error::{
    ConceptWeaveError, ConfigError, ExtractionError, Result, StorageError, SubmitError,
    ValidationError,
};
pub use job::{JobSnapshot, JobStatus, JobStore, StatusQuery};
pub use pipeline::{Pipeline, PipelineError};
pub use processor::DocumentFormat;
pub use secrets::{resolve_secret, SecretError};
pub use service::{ConceptWeave, SubmitReceipt, Upload};
pub use worker::Dispatcher;
