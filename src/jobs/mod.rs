//! # Job Registry
//!
//! In-memory store of job identity → lifecycle state, independent of the
//! dispatch pipeline. Backed by a `DashMap` so concurrently running
//! orchestrators get per-entry atomic insert/update/get without a global
//! lock.
//!
//! Eviction of old jobs is a collaborator concern (a periodic sweep outside
//! the core); the registry itself never drops entries.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Lifecycle state of a submitted job.
///
/// `NotFound` is a derived state: it is what a lookup of a missing job id
/// returns, and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    NotFound,
}

impl JobStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::NotFound => write!(f, "not_found"),
        }
    }
}

/// One job's current state and, once terminal, its result payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub status: JobStatus,
    /// Final provider response or an error descriptor.
    pub result: Option<Value>,
    /// Set when a job completed but the provider returned entries with every
    /// recognized field empty (provider simply has no data).
    #[serde(default)]
    pub empty_result: bool,
}

impl JobRecord {
    fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            result: None,
            empty_result: false,
        }
    }

    fn not_found() -> Self {
        Self {
            status: JobStatus::NotFound,
            result: None,
            empty_result: false,
        }
    }
}

/// Process-wide job store shared by all orchestrators.
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<String, JobRecord>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job in `pending`. Job ids are caller-minted unique tokens,
    /// so a duplicate id simply overwrites the stale record.
    pub fn create(&self, job_id: &str) {
        debug!(job_id, "📋 Job registered");
        self.jobs.insert(job_id.to_string(), JobRecord::pending());
    }

    /// Look up a job; unknown ids yield the `NotFound` sentinel, never an
    /// error.
    pub fn get(&self, job_id: &str) -> JobRecord {
        self.jobs
            .get(job_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(JobRecord::not_found)
    }

    /// Update a job's status and, when given, replace its result. No-op for
    /// unknown ids and for records already in a terminal state.
    pub fn update(&self, job_id: &str, status: JobStatus, result: Option<Value>) {
        if let Some(mut entry) = self.jobs.get_mut(job_id) {
            if entry.status.is_terminal() {
                warn!(job_id, current = %entry.status, attempted = %status, "Ignoring update to terminal job");
                return;
            }
            entry.status = status;
            if let Some(result) = result {
                entry.result = Some(result);
            }
            debug!(job_id, status = %status, "📋 Job updated");
        }
    }

    /// Flag a completed job whose payload carried no usable data.
    pub fn mark_empty_result(&self, job_id: &str) {
        if let Some(mut entry) = self.jobs.get_mut(job_id) {
            entry.empty_result = true;
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_id_returns_not_found_sentinel() {
        let registry = JobRegistry::new();
        let record = registry.get("missing");
        assert_eq!(record.status, JobStatus::NotFound);
        assert!(record.result.is_none());
    }

    #[test]
    fn test_create_starts_pending() {
        let registry = JobRegistry::new();
        registry.create("job-1");
        assert_eq!(registry.get("job-1").status, JobStatus::Pending);
    }

    #[test]
    fn test_update_sets_status_and_result() {
        let registry = JobRegistry::new();
        registry.create("job-1");
        registry.update("job-1", JobStatus::Running, None);
        assert_eq!(registry.get("job-1").status, JobStatus::Running);

        registry.update("job-1", JobStatus::Completed, Some(json!({"companies": []})));
        let record = registry.get("job-1");
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.result, Some(json!({"companies": []})));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let registry = JobRegistry::new();
        registry.update("ghost", JobStatus::Completed, Some(json!({})));
        assert_eq!(registry.get("ghost").status, JobStatus::NotFound);
    }

    #[test]
    fn test_terminal_jobs_are_never_resurrected() {
        let registry = JobRegistry::new();
        registry.create("job-1");
        registry.update("job-1", JobStatus::Failed, Some(json!({"error": "timeout"})));

        registry.update("job-1", JobStatus::Running, None);
        let record = registry.get("job-1");
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.result, Some(json!({"error": "timeout"})));
    }

    #[test]
    fn test_duplicate_create_overwrites() {
        let registry = JobRegistry::new();
        registry.create("job-1");
        registry.update("job-1", JobStatus::Completed, Some(json!({"done": true})));
        registry.create("job-1");
        let record = registry.get("job-1");
        assert_eq!(record.status, JobStatus::Pending);
        assert!(record.result.is_none());
    }
}
