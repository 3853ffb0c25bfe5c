//! Completion notifications for long-polling callers.

use std::time::Duration;

use macrochef_core::JobRecord;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

/// Fan-out of terminal job writes.
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    sender: broadcast::Sender<JobRecord>,
}

impl CompletionNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to the terminal write for one operation.
    pub fn subscribe(&self, op_id: Uuid) -> CompletionSubscription {
        CompletionSubscription {
            op_id,
            receiver: BroadcastStream::new(self.sender.subscribe()),
        }
    }

    /// Publish a terminal record. No-op when nobody is listening.
    pub fn publish(&self, record: &JobRecord) {
        let _ = self.sender.send(record.clone());
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for CompletionNotifier {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// A subscription to the completion of a single operation.
pub struct CompletionSubscription {
    pub op_id: Uuid,
    receiver: BroadcastStream<JobRecord>,
}

impl CompletionSubscription {
    /// Wait for the operation's terminal record, up to `timeout`.
    ///
    /// Lagged notifications are skipped; a lagging subscriber may miss its
    /// record and will then simply time out.
    pub async fn wait(self, timeout: Duration) -> Option<JobRecord> {
        let op_id = self.op_id;
        let mut matching = self
            .receiver
            .filter_map(|item| item.ok())
            .filter(move |record| record.op_id == op_id);

        tokio::time::timeout(timeout, matching.next())
            .await
            .ok()
            .flatten()
    }
}
