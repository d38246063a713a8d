//! Test harness for isolated service execution.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use conceptweave::config::Config;
use conceptweave::enrichment::mock::ScriptedGenerator;
use conceptweave::job::JobSnapshot;
use conceptweave::service::{ConceptWeave, SubmitReceipt, Upload};

/// How long a test waits for one job before failing.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(20);

pub struct TestHarness {
    temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub generator: ScriptedGenerator,
    pub service: ConceptWeave,
}

impl TestHarness {
    /// Default config and the default scripted replies. Must be created
    /// inside a tokio runtime.
    pub fn new() -> Self {
        Self::with_generator(ScriptedGenerator::new())
    }

    pub fn with_generator(generator: ScriptedGenerator) -> Self {
        Self::with_config(generator, |_| {})
    }

    pub fn with_config(generator: ScriptedGenerator, configure: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upload_dir = temp_dir.path().join("uploads");

        let mut config = Config::default();
        config.storage.upload_directory = upload_dir.to_string_lossy().to_string();
        config.worker.continuation_delay_ms = 5;
        configure(&mut config);

        let service = ConceptWeave::new(config, Arc::new(generator.clone()))
            .expect("Failed to build service");

        Self {
            temp_dir,
            upload_dir,
            generator,
            service,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn submit(&self, name: &str, mime_type: &str, bytes: &[u8]) -> SubmitReceipt {
        self.service
            .submit(Upload::new(name, mime_type, bytes.to_vec()))
            .expect("Submission should be accepted")
    }

    pub fn submit_text(&self, name: &str, text: &str) -> SubmitReceipt {
        self.submit(name, "text/plain", text.as_bytes())
    }

    /// Waits for a terminal snapshot, failing the test on timeout.
    pub async fn wait(&self, id: &str) -> JobSnapshot {
        self.service
            .wait_for_terminal(id, JOB_TIMEOUT)
            .await
            .unwrap_or_else(|| panic!("job {} did not reach a terminal state", id))
    }

    /// Names of the files in the upload directory, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.upload_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Lecture-notes text comfortably above the minimum length.
pub const LECTURE_NOTES: &str = "Graph theory studies vertices and the edges between them. \
     Breadth-first search visits vertices level by level.";

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_uses_temp_upload_dir() {
        let harness = TestHarness::new();
        assert!(harness.upload_dir.starts_with(harness.temp_path()));
        assert!(harness.stored_files().is_empty());
    }
}
