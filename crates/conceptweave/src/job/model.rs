use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enrichment::ConceptMap;
use crate::storage::StoredRef;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Job {id} cannot move from {from} to {to}")]
    Illegal {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Job {id} not found")]
    NotFound { id: String },

    #[error("Job {id} already exists")]
    Duplicate { id: String },
}

/// Result of a successful job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobOutput {
    pub summary: String,
    /// `None` when the model's concept map could not be parsed.
    pub concept_map: Option<ConceptMap>,
}

/// Provenance of an accepted upload, recorded once at creation.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub original_name: String,
    pub stored_ref: StoredRef,
    pub size: u64,
    pub mime_type: String,
}

/// A job record. Fields change only through [`Job::start`], [`Job::complete`]
/// and [`Job::fail`], which reject anything but
/// `queued -> processing -> done | error`.
#[derive(Debug, Clone)]
pub struct Job {
    id: String,
    status: JobStatus,
    original_name: String,
    stored_ref: StoredRef,
    size: u64,
    mime_type: String,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    result: Option<JobOutput>,
    message: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<String>, new_job: NewJob, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            original_name: new_job.original_name,
            stored_ref: new_job.stored_ref,
            size: new_job.size,
            mime_type: new_job.mime_type,
            created_at,
            started_at: None,
            finished_at: None,
            result: None,
            message: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn stored_ref(&self) -> &StoredRef {
        &self.stored_ref
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn result(&self) -> Option<&JobOutput> {
        self.result.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn ensure(&self, expected: JobStatus, to: JobStatus) -> Result<(), TransitionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TransitionError::Illegal {
                id: self.id.clone(),
                from: self.status,
                to,
            })
        }
    }

    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure(JobStatus::Queued, JobStatus::Processing)?;
        self.status = JobStatus::Processing;
        self.started_at = Some(at);
        Ok(())
    }

    pub fn complete(&mut self, output: JobOutput, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure(JobStatus::Processing, JobStatus::Done)?;
        self.status = JobStatus::Done;
        self.result = Some(output);
        self.finished_at = Some(at);
        Ok(())
    }

    pub fn fail(
        &mut self,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.ensure(JobStatus::Processing, JobStatus::Error)?;
        self.status = JobStatus::Error;
        self.message = Some(message.into());
        self.finished_at = Some(at);
        Ok(())
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            status: self.status,
            original_name: self.original_name.clone(),
            size: self.size,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            result: self.result.clone(),
            message: self.message.clone(),
        }
    }
}

/// Client-facing view of a job. The stored reference is not exposed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    pub original_name: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusQuery {
    Found(JobSnapshot),
    NotFound { id: String },
}

/// Number of jobs in each state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobCounts {
    pub queued: usize,
    pub processing: usize,
    pub done: usize,
    pub error: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued_job() -> Job {
        Job::new(
            "job-1",
            NewJob {
                original_name: "notes.txt".to_string(),
                stored_ref: StoredRef::new("job-1-notes.txt"),
                size: 42,
                mime_type: "text/plain".to_string(),
            },
            Utc::now(),
        )
    }

    fn output() -> JobOutput {
        JobOutput {
            summary: "# Summary".to_string(),
            concept_map: None,
        }
    }

    #[test]
    fn test_new_job_is_queued() {
        let job = queued_job();
        assert_eq!(job.status(), JobStatus::Queued);
        assert!(job.started_at().is_none());
        assert!(job.result().is_none());
        assert!(job.message().is_none());
    }

    #[test]
    fn test_legal_success_sequence() {
        let mut job = queued_job();
        job.start(Utc::now()).unwrap();
        assert_eq!(job.status(), JobStatus::Processing);
        assert!(job.started_at().is_some());

        job.complete(output(), Utc::now()).unwrap();
        assert_eq!(job.status(), JobStatus::Done);
        assert!(job.finished_at().is_some());
        assert!(job.result().is_some());
        assert!(job.message().is_none());
    }

    #[test]
    fn test_legal_failure_sequence() {
        let mut job = queued_job();
        job.start(Utc::now()).unwrap();
        job.fail("boom", Utc::now()).unwrap();

        assert_eq!(job.status(), JobStatus::Error);
        assert_eq!(job.message(), Some("boom"));
        assert!(job.result().is_none());
    }

    #[test]
    fn test_cannot_complete_queued_job() {
        let mut job = queued_job();
        let err = job.complete(output(), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Illegal {
                id: "job-1".to_string(),
                from: JobStatus::Queued,
                to: JobStatus::Done,
            }
        );
        assert_eq!(job.status(), JobStatus::Queued);
    }

    #[test]
    fn test_terminal_job_is_immutable() {
        let mut job = queued_job();
        job.start(Utc::now()).unwrap();
        job.complete(output(), Utc::now()).unwrap();
        let finished_at = job.finished_at();

        assert!(job.start(Utc::now()).is_err());
        assert!(job.fail("late failure", Utc::now()).is_err());
        assert!(job.complete(output(), Utc::now()).is_err());

        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(job.finished_at(), finished_at);
        assert!(job.message().is_none());
    }

    #[test]
    fn test_snapshot_serialization() {
        let mut job = queued_job();
        job.start(Utc::now()).unwrap();
        job.complete(output(), Utc::now()).unwrap();

        let json = serde_json::to_value(job.snapshot()).unwrap();

        assert_eq!(json["status"], "done");
        assert_eq!(json["originalName"], "notes.txt");
        assert_eq!(json["result"]["summary"], "# Summary");
        assert!(json["result"]["conceptMap"].is_null());
        assert!(json.get("message").is_none());
        assert!(json.get("storedRef").is_none());
    }

    #[test]
    fn test_queued_snapshot_omits_optional_fields() {
        let json = serde_json::to_value(queued_job().snapshot()).unwrap();
        assert_eq!(json["status"], "queued");
        assert!(json.get("startedAt").is_none());
        assert!(json.get("finishedAt").is_none());
        assert!(json.get("result").is_none());
    }
}
