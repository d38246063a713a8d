//! Single-slot FIFO dispatcher.
//!
//! Jobs start strictly in enqueue order and never overlap. The slot is taken
//! when a job is popped and released after its terminal transition; the next
//! dispatch then runs on a fresh task after the continuation delay.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;

use crate::config::WorkerConfig;
use crate::error::{ConceptWeaveError, Result};
use crate::job::{Job, JobStatus, JobStore};
use crate::pipeline::{Pipeline, PipelineError};

#[derive(Default)]
struct DispatchState {
    queue: VecDeque<String>,
    busy: bool,
}

struct DispatcherInner {
    store: Arc<JobStore>,
    pipeline: Arc<Pipeline>,
    runtime: Handle,
    continuation_delay: Duration,
    state: Mutex<DispatchState>,
}

#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Captures the current tokio runtime; must be called from within one.
    pub fn new(
        store: Arc<JobStore>,
        pipeline: Arc<Pipeline>,
        config: &WorkerConfig,
    ) -> Result<Self> {
        let runtime =
            Handle::try_current().map_err(|e| ConceptWeaveError::Runtime(e.to_string()))?;
        Ok(Self::with_runtime(store, pipeline, config, runtime))
    }

    pub fn with_runtime(
        store: Arc<JobStore>,
        pipeline: Arc<Pipeline>,
        config: &WorkerConfig,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                store,
                pipeline,
                runtime,
                continuation_delay: Duration::from_millis(config.continuation_delay_ms),
                state: Mutex::new(DispatchState::default()),
            }),
        }
    }

    /// Appends a queued job id. When the slot is free a dispatch is scheduled
    /// on the runtime, so the record is still `queued` when this returns.
    pub fn enqueue(&self, id: impl Into<String>) {
        let id = id.into();
        let idle = {
            let mut state = self.inner.lock_state();
            state.queue.push_back(id.clone());
            tracing::debug!(job_id = %id, queue_len = state.queue.len(), "Job enqueued");
            !state.busy
        };

        if idle {
            let inner = Arc::clone(&self.inner);
            self.inner.runtime.spawn(async move {
                DispatcherInner::try_dispatch(&inner);
            });
        }
    }

    /// Ids waiting for the slot, in start order.
    pub fn pending(&self) -> Vec<String> {
        self.inner.lock_state().queue.iter().cloned().collect()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.lock_state().busy
    }
}

impl DispatcherInner {
    fn lock_state(&self) -> MutexGuard<'_, DispatchState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Dispatcher lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Takes the slot and starts the head of the queue. Ids that can no longer
    /// start are skipped so one bad entry never stalls the queue.
    fn try_dispatch(inner: &Arc<Self>) {
        loop {
            let id = {
                let mut state = inner.lock_state();
                if state.busy {
                    return;
                }
                let Some(id) = state.queue.pop_front() else {
                    return;
                };
                state.busy = true;
                id
            };

            match inner.store.transition(&id, |job| job.start(Utc::now())) {
                Ok(job) => {
                    tracing::info!(job_id = %id, "Job started");
                    let task_inner = Arc::clone(inner);
                    inner.runtime.spawn(async move {
                        task_inner.execute(job).await;
                    });
                    return;
                }
                Err(e) => {
                    tracing::warn!(job_id = %id, error = %e, "Skipping job that cannot start");
                    inner.lock_state().busy = false;
                }
            }
        }
    }

    async fn execute(self: Arc<Self>, job: Job) {
        let id = job.id().to_string();

        // The body runs on its own task so a panic surfaces as a JoinError
        // instead of unwinding through the dispatcher.
        let pipeline = Arc::clone(&self.pipeline);
        let body = tokio::spawn(async move { pipeline.run(&job).await });
        let outcome = match body.await {
            Ok(result) => result,
            Err(join_error) => Err(PipelineError::from_join(join_error)),
        };

        let finished = self.store.transition(&id, |job| match outcome {
            Ok(output) => job.complete(output, Utc::now()),
            Err(e) => job.fail(e.to_string(), Utc::now()),
        });

        match finished {
            Ok(job) if job.status() == JobStatus::Done => {
                tracing::info!(job_id = %id, "Job completed");
            }
            Ok(job) => {
                tracing::warn!(
                    job_id = %id,
                    reason = job.message().unwrap_or_default(),
                    "Job failed"
                );
            }
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "Failed to record job outcome");
            }
        }

        self.release();
    }

    fn release(self: Arc<Self>) {
        let pending = {
            let mut state = self.lock_state();
            state.busy = false;
            !state.queue.is_empty()
        };

        if pending {
            let delay = self.continuation_delay;
            let runtime = self.runtime.clone();
            runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                DispatcherInner::try_dispatch(&self);
            });
        }
    }
}
