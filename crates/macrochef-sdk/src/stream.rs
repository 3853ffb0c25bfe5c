//! Stream of state changes for a recipe job.

use macrochef_core::{JobRecord, RecipeError};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::client::MacroChefClient;

/// How long each long-poll asks the node to hold the request.
const POLL_WAIT_MS: u64 = 10_000;

/// Update delivered by a [`JobStream`].
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// The job's state changed. Terminal states end the stream.
    State(JobRecord),
    /// The node no longer knows the job.
    Expired,
    /// Polling failed. Ends the stream.
    Error(RecipeError),
}

/// Stream of state changes for one job.
///
/// Each distinct state is delivered once. The stream closes after a
/// terminal state, an expiry, or an error.
pub struct JobStream {
    op_id: Uuid,
    receiver: mpsc::Receiver<JobEvent>,
    handle: tokio::task::JoinHandle<()>,
}

impl JobStream {
    pub(crate) fn spawn(client: MacroChefClient, op_id: Uuid) -> Self {
        let (tx, rx) = mpsc::channel(8);

        let handle = tokio::spawn(async move {
            let mut last_status: Option<&'static str> = None;

            loop {
                let wait = last_status.map(|_| POLL_WAIT_MS);
                let event = match client.fetch(op_id, wait).await {
                    Ok(Some(record)) => {
                        let status = record.state.status();
                        if last_status == Some(status) {
                            continue;
                        }
                        last_status = Some(status);
                        JobEvent::State(record)
                    }
                    Ok(None) => JobEvent::Expired,
                    Err(err) => JobEvent::Error(err),
                };

                let done = !matches!(&event, JobEvent::State(r) if !r.state.is_terminal());
                if tx.send(event).await.is_err() || done {
                    break;
                }
            }
        });

        Self {
            op_id,
            receiver: rx,
            handle,
        }
    }

    /// Get the operation id this stream follows.
    pub fn op_id(&self) -> Uuid {
        self.op_id
    }

    /// Get the next event. `None` once the stream has finished.
    pub async fn next(&mut self) -> Option<JobEvent> {
        self.receiver.recv().await
    }
}

impl Drop for JobStream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
