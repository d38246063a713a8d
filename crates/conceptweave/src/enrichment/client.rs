use std::sync::Arc;

use crate::config::EnrichmentConfig;
use crate::enrichment::concept_map::{parse_concept_map, ConceptMap};
use crate::enrichment::error::Result;
use crate::enrichment::prompts::{concept_map_prompt, summary_prompt};
use crate::enrichment::provider::TextGenerator;

/// Turns extracted text into the two model-derived artifacts.
#[derive(Clone)]
pub struct EnrichmentClient {
    generator: Arc<dyn TextGenerator>,
    max_input_chars: usize,
}

impl EnrichmentClient {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &EnrichmentConfig) -> Self {
        Self::with_input_limit(generator, config.max_input_chars)
    }

    pub fn with_input_limit(generator: Arc<dyn TextGenerator>, max_input_chars: usize) -> Self {
        Self {
            generator,
            max_input_chars,
        }
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Study summary, returned exactly as the model wrote it.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        let content = truncate_chars(text, self.max_input_chars);
        self.generator.generate(&summary_prompt(content)).await
    }

    pub async fn try_map_concepts(&self, text: &str) -> Result<ConceptMap> {
        let content = truncate_chars(text, self.max_input_chars);
        let reply = self.generator.generate(&concept_map_prompt(content)).await?;

        parse_concept_map(&reply).inspect_err(|e| {
            tracing::debug!(error = %e, reply = %reply, "Unparseable concept map reply");
        })
    }

    /// Like [`try_map_concepts`](Self::try_map_concepts), but a failure of any
    /// kind is logged and yields `None`.
    pub async fn map_concepts(&self, text: &str) -> Option<ConceptMap> {
        match self.try_map_concepts(text).await {
            Ok(map) => Some(map),
            Err(e) => {
                tracing::warn!(error = %e, "Concept map unavailable");
                None
            }
        }
    }
}

/// The first `max_chars` characters of `text`, cut on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
