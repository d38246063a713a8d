use thiserror::Error;

use crate::enrichment::EnrichmentError;
use crate::error::{ExtractionError, StorageError};

/// Why a job ended in `error`. The `Display` text becomes the job message.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read uploaded file: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("Summary generation failed: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("{step} timed out after {secs}s")]
    Timeout { step: &'static str, secs: u64 },

    #[error("Processing failed unexpectedly: {0}")]
    Panicked(String),
}

impl PipelineError {
    /// Maps a failed task join to an error. Cancellation only happens at
    /// runtime shutdown.
    pub fn from_join(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            PipelineError::Panicked(message)
        } else {
            PipelineError::Panicked("task was cancelled".to_string())
        }
    }
}
