//! Job lifecycle events for in-process subscribers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::job::model::{Job, JobStatus};

/// Emitted after every job creation and successful transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub job_id: String,
    pub status: JobStatus,
    pub timestamp: DateTime<Utc>,
    /// Failure reason, set on `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobEvent {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id().to_string(),
            status: job.status(),
            timestamp: Utc::now(),
            message: job.message().map(|m| m.to_string()),
        }
    }
}

/// Broadcasts job events to any number of subscribers.
#[derive(Clone)]
pub struct JobEventBroadcaster {
    sender: Arc<broadcast::Sender<JobEvent>>,
}

impl JobEventBroadcaster {
    /// Creates a broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: JobEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}

impl Default for JobEventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
