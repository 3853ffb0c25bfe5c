//! Job correlator: mints operation ids and runs pipelines in the background.
//!
//! Submission writes a `Pending` marker, enqueues the job and returns the id
//! without waiting. A fixed pool of workers drains the queue; each job runs in
//! its own task so a panic is contained to that job. The terminal state,
//! success or failure, is the job's only visible side effect: one atomic put
//! into the result store.

use std::sync::Arc;
use std::time::Duration;

use macrochef_core::{JobRecord, JobState, RecipeError, RecipeRequest, Result};
use macrochef_state::ResultStore;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::JobSettings;
use crate::pipeline::Pipeline;

/// A unit of queued work.
struct Job {
    op_id: Uuid,
    request: RecipeRequest,
}

/// Front door of the asynchronous job protocol.
pub struct JobCorrelator {
    sender: mpsc::Sender<Job>,
    /// Held so the queue stays open even with no workers running.
    _queue: Arc<Mutex<mpsc::Receiver<Job>>>,
    results: Arc<dyn ResultStore>,
    settings: JobSettings,
}

impl JobCorrelator {
    /// Create the correlator and spawn its workers.
    pub fn start(
        pipeline: Arc<Pipeline>,
        results: Arc<dyn ResultStore>,
        settings: JobSettings,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(settings.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        for worker_id in 0..settings.worker_count {
            let worker = Worker {
                id: worker_id,
                receiver: receiver.clone(),
                pipeline: pipeline.clone(),
                results: results.clone(),
                result_ttl: settings.result_ttl,
                pending_ttl: settings.pending_ttl,
            };
            tokio::spawn(worker.run());
        }

        info!(
            "Job correlator started with {} workers (queue capacity {})",
            settings.worker_count, settings.queue_capacity
        );

        Self {
            sender,
            _queue: receiver,
            results,
            settings,
        }
    }

    /// Accept a validated request and return its operation id immediately.
    pub async fn submit(&self, request: RecipeRequest) -> Result<Uuid> {
        let op_id = Uuid::new_v4();

        self.results
            .put(op_id, JobState::Pending, ttl(self.settings.pending_ttl))
            .await?;

        match self.sender.try_send(Job { op_id, request }) {
            Ok(()) => {
                info!("[{}] Job submitted", op_id);
                Ok(op_id)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                let err = RecipeError::QueueFull {
                    capacity: self.settings.queue_capacity,
                };
                warn!("[{}] Rejected: {}", op_id, err);
                self.results
                    .put(op_id, JobState::failed(&err), ttl(self.settings.result_ttl))
                    .await?;
                Err(err)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(RecipeError::Internal("job queue is closed".to_string()))
            }
        }
    }

    /// Read the current state of an operation.
    pub async fn status(&self, op_id: Uuid) -> Result<Option<JobRecord>> {
        self.results.get(op_id).await
    }
}

struct Worker {
    id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    pipeline: Arc<Pipeline>,
    results: Arc<dyn ResultStore>,
    result_ttl: Duration,
    pending_ttl: Duration,
}

impl Worker {
    async fn run(self) {
        loop {
            let job = {
                let mut receiver = self.receiver.lock().await;
                receiver.recv().await
            };
            let Some(job) = job else {
                info!("Worker {} stopping: queue closed", self.id);
                break;
            };
            self.process(job).await;
        }
    }

    async fn process(&self, job: Job) {
        let Job { op_id, request } = job;
        let pipeline = self.pipeline.clone();

        // Time spent queued must not count against the pending marker.
        if let Err(err) = self
            .results
            .put(op_id, JobState::Pending, ttl(self.pending_ttl))
            .await
        {
            warn!("[{}] Could not refresh pending marker: {}", op_id, err);
        }

        let outcome = tokio::spawn(async move { pipeline.run(op_id, &request).await }).await;

        let state = match outcome {
            Ok(Ok(payload)) => {
                info!("[{}] Job completed on worker {}", op_id, self.id);
                JobState::Completed { payload }
            }
            Ok(Err(err)) => {
                warn!("[{}] Job failed ({}): {}", op_id, err.kind(), err);
                JobState::failed(&err)
            }
            Err(join_err) => {
                error!("[{}] Job pipeline aborted: {}", op_id, join_err);
                JobState::failed(&RecipeError::Internal("job pipeline panicked".to_string()))
            }
        };

        if let Err(err) = self.results.put(op_id, state, ttl(self.result_ttl)).await {
            error!("[{}] Could not store job result: {}", op_id, err);
        }
    }
}

/// Periodically remove expired records from the result store.
pub fn spawn_sweeper(results: Arc<dyn ResultStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(err) = results.purge_expired().await {
                warn!("Result sweep failed: {}", err);
            }
        }
    })
}

fn ttl(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::days(365))
}
