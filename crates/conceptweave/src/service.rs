//! Submission facade: validates uploads, persists them, and hands jobs to the
//! dispatcher. Everything here except `wait_for_terminal` is synchronous for
//! the caller.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

use crate::config::Config;
use crate::enrichment::{CohereGenerator, EnrichmentClient, TextGenerator};
use crate::error::{Result, SubmitError, ValidationError};
use crate::job::{
    new_job_id, JobCounts, JobEvent, JobSnapshot, JobStatus, JobStore, NewJob, StatusQuery,
};
use crate::pipeline::Pipeline;
use crate::processor::{normalize_mime, ExtractorRegistry, ALLOWED_MIME_TYPES};
use crate::sanitize;
use crate::secrets::has_secret_source;
use crate::storage::{stored_file_name, ByteStore, LocalByteStore};
use crate::worker::Dispatcher;

/// One uploaded file as received from the transport.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    /// Declared MIME type.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Returned by a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub id: String,
    pub status: JobStatus,
    pub original_name: String,
    pub size: u64,
}

pub struct ConceptWeave {
    config: Config,
    byte_store: Arc<dyn ByteStore>,
    jobs: Arc<JobStore>,
    dispatcher: Dispatcher,
}

impl ConceptWeave {
    /// Builds the service with the Cohere backend described by `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let enrichment = &config.enrichment;
        if !has_secret_source(
            enrichment.api_key.as_deref(),
            enrichment.api_key_file.as_deref(),
            enrichment.api_key_env_var.as_deref(),
        ) {
            tracing::warn!("No model credential source configured; every job will fail at summary");
        }

        let generator = Arc::new(CohereGenerator::new(enrichment)?);
        Self::new(config, generator)
    }

    /// Builds the service around any text generator, storing uploads under
    /// the configured upload directory. Must be called inside a tokio runtime.
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> Result<Self> {
        let byte_store = Arc::new(LocalByteStore::new(&config.storage.upload_directory));
        Self::with_byte_store(config, generator, byte_store)
    }

    pub fn with_byte_store(
        config: Config,
        generator: Arc<dyn TextGenerator>,
        byte_store: Arc<dyn ByteStore>,
    ) -> Result<Self> {
        let extractors = Arc::new(ExtractorRegistry::new(&config.extraction));
        let enrichment = EnrichmentClient::new(generator, &config.enrichment);
        let pipeline = Arc::new(Pipeline::new(
            &config,
            Arc::clone(&byte_store),
            extractors,
            enrichment,
        ));

        let jobs = Arc::new(JobStore::new());
        let dispatcher = Dispatcher::new(Arc::clone(&jobs), pipeline, &config.worker)?;

        tracing::info!(
            upload_directory = %sanitize::redact_path(Path::new(&config.storage.upload_directory)),
            max_file_size = config.storage.max_file_size,
            "ConceptWeave service ready"
        );

        Ok(Self {
            config,
            byte_store,
            jobs,
            dispatcher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks the declared type against the allow-list, then the size.
    pub fn validate(&self, upload: &Upload) -> std::result::Result<(), ValidationError> {
        let mime_type = normalize_mime(&upload.mime_type);
        if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(ValidationError::UnsupportedType {
                mime_type: upload.mime_type.clone(),
            });
        }

        if upload.bytes.is_empty() {
            return Err(ValidationError::Empty);
        }

        let size = upload.bytes.len() as u64;
        let limit = self.config.storage.max_file_size;
        if size > limit {
            return Err(ValidationError::TooLarge { size, limit });
        }

        Ok(())
    }

    /// Validates and stores the upload, then queues a job for it. On error
    /// no job exists.
    pub fn submit(&self, upload: Upload) -> std::result::Result<SubmitReceipt, SubmitError> {
        let filename = sanitize::redact_path(Path::new(&upload.name));

        if let Err(e) = self.validate(&upload) {
            tracing::warn!(filename = %filename, error = %e, "Upload rejected");
            return Err(e.into());
        }

        let id = new_job_id();
        let stored_ref = self
            .byte_store
            .save(&upload.bytes, &stored_file_name(&id, &upload.name))?;

        let size = upload.bytes.len() as u64;
        let job = self.jobs.create(
            &id,
            NewJob {
                original_name: upload.name,
                stored_ref,
                size,
                mime_type: normalize_mime(&upload.mime_type),
            },
        )?;

        tracing::info!(
            job_id = %id,
            filename = %filename,
            size,
            mime_type = %job.mime_type(),
            "Upload accepted"
        );

        let receipt = SubmitReceipt {
            id: id.clone(),
            status: job.status(),
            original_name: job.original_name().to_string(),
            size,
        };

        self.dispatcher.enqueue(id);
        Ok(receipt)
    }

    pub fn status(&self, id: &str) -> StatusQuery {
        match self.jobs.snapshot(id) {
            Some(snapshot) => StatusQuery::Found(snapshot),
            None => StatusQuery::NotFound { id: id.to_string() },
        }
    }

    /// Waits until the job is `done` or `error`. `None` if the id is unknown
    /// or the timeout elapses first.
    pub async fn wait_for_terminal(&self, id: &str, timeout: Duration) -> Option<JobSnapshot> {
        // Subscribe before the first look so a transition in between is not missed.
        let mut events = self.jobs.subscribe();

        let snapshot = self.jobs.snapshot(id)?;
        if snapshot.status.is_terminal() {
            return Some(snapshot);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Ok(event)) => {
                    if event.job_id == id && event.status.is_terminal() {
                        return self.jobs.snapshot(id);
                    }
                }
                Ok(Err(RecvError::Lagged(skipped))) => {
                    tracing::debug!(skipped, "Job event receiver lagged, re-reading status");
                    let snapshot = self.jobs.snapshot(id)?;
                    if snapshot.status.is_terminal() {
                        return Some(snapshot);
                    }
                }
                Ok(Err(RecvError::Closed)) => {
                    return self.jobs.snapshot(id).filter(|s| s.status.is_terminal());
                }
                Err(_) => {
                    tracing::debug!(job_id = %id, "Timed out waiting for job");
                    return None;
                }
            }
        }
    }

    /// All jobs, newest first.
    pub fn jobs(&self) -> Vec<JobSnapshot> {
        self.jobs.list()
    }

    pub fn counts(&self) -> JobCounts {
        self.jobs.counts()
    }

    pub fn subscribe(&self) -> Receiver<JobEvent> {
        self.jobs.subscribe()
    }
}
