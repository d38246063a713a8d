//! Scripted text generator for deterministic tests.
//!
//! ```rust
//! use conceptweave::enrichment::mock::ScriptedGenerator;
//!
//! let generator = ScriptedGenerator::new()
//!     .with_summary("# Summary")
//!     .with_concept_map_reply(r#"{"nodes": [], "edges": []}"#);
//! assert_eq!(generator.call_count(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::enrichment::error::{EnrichmentError, Result};
use crate::enrichment::provider::TextGenerator;

/// Which of the two enrichment prompts a call carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Summary,
    ConceptMap,
}

impl PromptKind {
    fn of(prompt: &str) -> Self {
        if prompt.starts_with("Return a concept map") {
            PromptKind::ConceptMap
        } else {
            PromptKind::Summary
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: PromptKind,
    pub prompt: String,
}

#[derive(Debug, Clone)]
struct Script {
    summary: Result<String>,
    concept_map: Result<String>,
    delay: Duration,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            summary: Ok("# Summary\n\n- Mock summary".to_string()),
            concept_map: Ok(r#"{"nodes": [{"id": "A", "label": "Mock"}], "edges": []}"#.to_string()),
            delay: Duration::ZERO,
        }
    }
}

#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    script: Arc<Script>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(mut self, reply: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.script).summary = Ok(reply.into());
        self
    }

    pub fn with_summary_error(mut self, error: EnrichmentError) -> Self {
        Arc::make_mut(&mut self.script).summary = Err(error);
        self
    }

    pub fn with_concept_map_reply(mut self, reply: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.script).concept_map = Ok(reply.into());
        self
    }

    pub fn with_concept_map_error(mut self, error: EnrichmentError) -> Self {
        Arc::make_mut(&mut self.script).concept_map = Err(error);
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        Arc::make_mut(&mut self.script).delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// Highest number of calls that were ever running at once.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let kind = PromptKind::of(prompt);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                kind,
                prompt: prompt.to_string(),
            });
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.script.delay.is_zero() {
            tokio::time::sleep(self.script.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match kind {
            PromptKind::Summary => self.script.summary.clone(),
            PromptKind::ConceptMap => self.script.concept_map.clone(),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::prompts::{concept_map_prompt, summary_prompt};

    #[tokio::test]
    async fn test_routes_by_prompt_kind() {
        let generator = ScriptedGenerator::new()
            .with_summary("S")
            .with_concept_map_reply("C");

        assert_eq!(generator.generate(&summary_prompt("x")).await.unwrap(), "S");
        assert_eq!(generator.generate(&concept_map_prompt("x")).await.unwrap(), "C");

        let kinds: Vec<PromptKind> = generator.calls().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![PromptKind::Summary, PromptKind::ConceptMap]);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let generator =
            ScriptedGenerator::new().with_summary_error(EnrichmentError::Timeout(1));
        assert_eq!(
            generator.generate(&summary_prompt("x")).await.unwrap_err(),
            EnrichmentError::Timeout(1)
        );
    }
}
