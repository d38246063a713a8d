use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info_span, Instrument};

use crate::config::Config;
use crate::enrichment::EnrichmentClient;
use crate::job::{Job, JobOutput};
use crate::processor::{DocumentFormat, ExtractedText, ExtractorRegistry};
use crate::sanitize;
use crate::storage::{ByteStore, StoredRef};

use super::error::PipelineError;

/// Extract, summarize, then map concepts for one job.
pub struct Pipeline {
    store: Arc<dyn ByteStore>,
    extractors: Arc<ExtractorRegistry>,
    enrichment: EnrichmentClient,
    extraction_timeout: Duration,
    enrichment_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        store: Arc<dyn ByteStore>,
        extractors: Arc<ExtractorRegistry>,
        enrichment: EnrichmentClient,
    ) -> Self {
        Self {
            store,
            extractors,
            enrichment,
            extraction_timeout: Duration::from_secs(config.extraction.timeout_secs),
            enrichment_timeout: Duration::from_secs(config.enrichment.timeout_secs),
        }
    }

    /// Runs every step for `job`. The concept map is best effort; any other
    /// failure is returned and becomes the job's error message.
    pub async fn run(&self, job: &Job) -> Result<JobOutput, PipelineError> {
        let filename = sanitize::redact_path(Path::new(job.original_name()));
        let span = info_span!("pipeline", job_id = %job.id(), filename = %filename);

        async move {
            // Step 1: Read stored bytes and extract text
            let extracted = self
                .step_extract(job)
                .instrument(info_span!("extract"))
                .await?;

            // Step 2: Summary (fatal on failure)
            let summary = self
                .step_summarize(&extracted.text)
                .instrument(info_span!("summarize"))
                .await?;

            // Step 3: Concept map (never fatal)
            let concept_map = self
                .step_map_concepts(&extracted.text)
                .instrument(info_span!("map_concepts"))
                .await;

            tracing::info!(
                format = ?extracted.format,
                has_concept_map = concept_map.is_some(),
                "Job processed"
            );

            Ok(JobOutput {
                summary,
                concept_map,
            })
        }
        .instrument(span)
        .await
    }

    async fn step_extract(&self, job: &Job) -> Result<ExtractedText, PipelineError> {
        let store = Arc::clone(&self.store);
        let extractors = Arc::clone(&self.extractors);
        let stored_ref: StoredRef = job.stored_ref().clone();
        let file_name = job.original_name().to_string();
        let format = DocumentFormat::detect(Some(job.mime_type()), &file_name);
        let parent = tracing::Span::current();

        // Decoding and OCR are CPU-bound; keep them off the async workers.
        let handle = tokio::task::spawn_blocking(move || {
            let _entered = parent.enter();
            let bytes = store.read(&stored_ref)?;
            let extracted = extractors.extract(&bytes, format, &file_name)?;
            Ok::<_, PipelineError>(extracted)
        });

        match tokio::time::timeout(self.extraction_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(PipelineError::from_join(join_error)),
            Err(_) => Err(PipelineError::Timeout {
                step: "Text extraction",
                secs: self.extraction_timeout.as_secs(),
            }),
        }
    }

    async fn step_summarize(&self, text: &str) -> Result<String, PipelineError> {
        match tokio::time::timeout(self.enrichment_timeout, self.enrichment.summarize(text)).await
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(PipelineError::Timeout {
                step: "Summary generation",
                secs: self.enrichment_timeout.as_secs(),
            }),
        }
    }

    async fn step_map_concepts(&self, text: &str) -> Option<crate::enrichment::ConceptMap> {
        match tokio::time::timeout(self.enrichment_timeout, self.enrichment.map_concepts(text))
            .await
        {
            Ok(map) => map,
            Err(_) => {
                tracing::warn!(
                    secs = self.enrichment_timeout.as_secs(),
                    "Concept map generation timed out"
                );
                None
            }
        }
    }
}
