//! In-memory job store.
//!
//! Each record sits behind its own mutex so transitions on different ids never
//! contend; the outer map lock is held only to look records up or insert them.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard};

use chrono::Utc;
use tokio::sync::broadcast;

use crate::job::events::{JobEvent, JobEventBroadcaster};
use crate::job::model::{Job, JobCounts, JobSnapshot, JobStatus, NewJob, TransitionError};

pub struct JobStore {
    jobs: RwLock<HashMap<String, Arc<Mutex<Job>>>>,
    events: JobEventBroadcaster,
}

fn lock_record(record: &Mutex<Job>) -> MutexGuard<'_, Job> {
    match record.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Job record lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self::with_events(JobEventBroadcaster::default())
    }

    pub fn with_events(events: JobEventBroadcaster) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            events,
        }
    }

    fn read_map(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Mutex<Job>>>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn record(&self, id: &str) -> Option<Arc<Mutex<Job>>> {
        self.read_map().get(id).cloned()
    }

    fn records(&self) -> Vec<Arc<Mutex<Job>>> {
        self.read_map().values().cloned().collect()
    }

    /// Inserts a new `queued` job under `id`.
    pub fn create(&self, id: &str, new_job: NewJob) -> Result<Job, TransitionError> {
        let job = Job::new(id, new_job, Utc::now());

        {
            let mut map = match self.jobs.write() {
                Ok(guard) => guard,
                Err(poisoned) => {
                    tracing::warn!("Job store lock was poisoned, recovering");
                    poisoned.into_inner()
                }
            };

            match map.entry(id.to_string()) {
                Entry::Occupied(_) => {
                    return Err(TransitionError::Duplicate { id: id.to_string() });
                }
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Mutex::new(job.clone())));
                }
            }
        }

        self.events.send(JobEvent::from_job(&job));
        Ok(job)
    }

    /// Returns a copy of the job record.
    pub fn get(&self, id: &str) -> Option<Job> {
        let record = self.record(id)?;
        let job = lock_record(&record).clone();
        Some(job)
    }

    pub fn snapshot(&self, id: &str) -> Option<JobSnapshot> {
        let record = self.record(id)?;
        let snapshot = lock_record(&record).snapshot();
        Some(snapshot)
    }

    /// Applies `f` to a copy of the record under the record's lock and
    /// publishes the copy only if `f` succeeds. Readers see the record either
    /// before or after the whole change.
    pub fn transition<F>(&self, id: &str, f: F) -> Result<Job, TransitionError>
    where
        F: FnOnce(&mut Job) -> Result<(), TransitionError>,
    {
        let record = self
            .record(id)
            .ok_or_else(|| TransitionError::NotFound { id: id.to_string() })?;

        let mut guard = lock_record(&record);
        let mut updated = guard.clone();
        f(&mut updated)?;
        *guard = updated.clone();

        // Sent under the record lock so per-job events arrive in transition order.
        self.events.send(JobEvent::from_job(&updated));
        drop(guard);

        Ok(updated)
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<JobSnapshot> {
        let mut snapshots: Vec<JobSnapshot> = self
            .records()
            .iter()
            .map(|record| lock_record(record).snapshot())
            .collect();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        snapshots
    }

    pub fn counts(&self) -> JobCounts {
        let mut counts = JobCounts::default();
        for record in self.records() {
            match lock_record(&record).status() {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Done => counts.done += 1,
                JobStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
