//! Result store implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use macrochef_core::{JobRecord, JobState, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::subscription::{CompletionNotifier, CompletionSubscription};

/// Key-value store of job states with per-item expiry.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Write the state for an operation, replacing any previous state.
    ///
    /// The record expires `ttl` after this write. The write is a single atomic put.
    async fn put(&self, op_id: Uuid, state: JobState, ttl: Duration) -> Result<JobRecord>;

    /// Read the current, unexpired record for an operation.
    async fn get(&self, op_id: Uuid) -> Result<Option<JobRecord>>;

    /// Physically remove expired records. Returns how many were removed.
    async fn purge_expired(&self) -> Result<usize>;

    /// Number of records held, expired or not.
    async fn len(&self) -> usize;

    /// Subscribe to the next terminal write for an operation.
    fn subscribe(&self, op_id: Uuid) -> CompletionSubscription;
}

/// In-memory implementation of ResultStore.
pub struct InMemoryResultStore {
    records: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
    clock: Arc<dyn Clock>,
    notifier: CompletionNotifier,
}

impl InMemoryResultStore {
    /// Create a store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a store on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            clock,
            notifier: CompletionNotifier::default(),
        }
    }
}

impl Default for InMemoryResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn put(&self, op_id: Uuid, state: JobState, ttl: Duration) -> Result<JobRecord> {
        let now = self.clock.now();
        let terminal = state.is_terminal();

        let record = {
            let mut records = self.records.write().await;
            let created_at = records
                .get(&op_id)
                .filter(|existing| !existing.is_expired_at(now))
                .map(|existing| existing.created_at)
                .unwrap_or(now);

            let record = JobRecord {
                op_id,
                state,
                created_at,
                updated_at: now,
                expires_at: now + ttl,
            };
            records.insert(op_id, record.clone());
            record
        };

        if terminal {
            self.notifier.publish(&record);
        }

        Ok(record)
    }

    async fn get(&self, op_id: Uuid) -> Result<Option<JobRecord>> {
        let now = self.clock.now();
        let records = self.records.read().await;

        Ok(records
            .get(&op_id)
            .filter(|record| !record.is_expired_at(now))
            .cloned())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut records = self.records.write().await;

        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        let removed = before - records.len();

        if removed > 0 {
            tracing::debug!("Purged {} expired job records", removed);
        }

        Ok(removed)
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    fn subscribe(&self, op_id: Uuid) -> CompletionSubscription {
        self.notifier.subscribe(op_id)
    }
}
