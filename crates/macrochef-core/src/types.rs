//! Job state shared by the correlator, the result store and pollers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecipeError;

/// Why a job ended without a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    /// Stable error code, see [`RecipeError::kind`].
    pub kind: String,
    pub message: String,
}

impl From<&RecipeError> for JobFailure {
    fn from(err: &RecipeError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// State of a recipe-generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    /// Submitted; the background pipeline has not finished.
    Pending,
    /// Finished with a sanitized payload.
    Completed { payload: String },
    /// Finished without a result.
    Failed { error: JobFailure },
}

impl JobState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed { .. } | JobState::Failed { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Completed { .. } => "completed",
            JobState::Failed { .. } => "failed",
        }
    }

    pub fn failed(err: &RecipeError) -> Self {
        JobState::Failed { error: err.into() }
    }
}

/// A job state as stored under its operation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub op_id: Uuid,
    #[serde(flatten)]
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The store discards the record at this instant.
    pub expires_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_terminal() {
        assert!(!JobState::Pending.is_terminal());
        assert!(JobState::Completed { payload: "[]".into() }.is_terminal());
        assert!(JobState::failed(&RecipeError::Internal("boom".into())).is_terminal());
    }

    #[test]
    fn test_record_serializes_flat_status() {
        let now = Utc::now();
        let record = JobRecord {
            op_id: Uuid::new_v4(),
            state: JobState::Failed {
                error: JobFailure::from(&RecipeError::ProfileNotFound {
                    user_id: "u-9".to_string(),
                }),
            },
            created_at: now,
            updated_at: now,
            expires_at: now + chrono::Duration::minutes(5),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"]["kind"], "profile_not_found");

        let back: JobRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let record = JobRecord {
            op_id: Uuid::new_v4(),
            state: JobState::Pending,
            created_at: now,
            updated_at: now,
            expires_at: now + chrono::Duration::seconds(1),
        };
        assert!(!record.is_expired_at(now));
        assert!(record.is_expired_at(now + chrono::Duration::seconds(1)));
    }
}
