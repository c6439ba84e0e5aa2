//! # Enrichment Orchestrator
//!
//! Per-job submit-then-poll state machine: `pending → running → {completed,
//! failed}`. Submission goes through the rotating dispatcher; polling bypasses
//! rotation and reuses the exact credential that carried the successful
//! submission, because the provider scopes job lookups per credential and a
//! different one yields false "not found" answers.
//!
//! The orchestrator is the last line of defense: it typically runs detached
//! from any caller, so no error may escape it — every failure path lands in
//! the job registry as a `failed` record.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::constants::{
    COMPLETED_STATUS_VALUES, CORRELATION_ID_FIELDS, IN_FLIGHT_STATUS_VALUES,
};
use crate::dispatch::{HttpTransport, OutboundRequest, RotatingDispatcher};
use crate::error::{RelayError, Result};
use crate::jobs::{JobRegistry, JobStatus};

/// Polling bounds for one enrichment job.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Maximum polling rounds before the job is failed with a timeout.
    pub max_attempts: u32,
    /// Delay before each polling round.
    pub interval: Duration,
    /// Per-poll request timeout.
    pub request_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: crate::constants::DEFAULT_POLL_MAX_ATTEMPTS,
            interval: crate::constants::DEFAULT_POLL_INTERVAL,
            request_timeout: crate::constants::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// What one poll response means for the job.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollVerdict {
    /// Result payload present, or provider reported terminal success.
    Completed { empty: bool },
    /// Provider reported a terminal status that is not a success.
    FailedTerminal,
    /// Still working (or nothing recognizable yet) — keep polling.
    InFlight,
}

/// Runs submit-and-poll enrichment jobs against the job registry.
pub struct EnrichmentOrchestrator {
    dispatcher: Arc<RotatingDispatcher>,
    transport: Arc<dyn HttpTransport>,
    jobs: Arc<JobRegistry>,
    config: PollConfig,
}

impl EnrichmentOrchestrator {
    pub fn new(
        dispatcher: Arc<RotatingDispatcher>,
        transport: Arc<dyn HttpTransport>,
        jobs: Arc<JobRegistry>,
        config: PollConfig,
    ) -> Self {
        Self {
            dispatcher,
            transport,
            jobs,
            config,
        }
    }

    /// Run one enrichment job to a terminal state. Never propagates an
    /// error: any internal failure is recorded as a `failed` job.
    pub async fn run(
        &self,
        job_id: &str,
        start_path: &str,
        status_path_template: &str,
        payload: Value,
    ) {
        info!(job_id, start_path, "🚀 Enrichment job started");
        if let Err(e) = self
            .run_inner(job_id, start_path, status_path_template, payload)
            .await
        {
            error!(job_id, error = %e, "💥 Enrichment job failed");
            self.jobs.update(
                job_id,
                JobStatus::Failed,
                Some(json!({ "error": e.to_string() })),
            );
        }
    }

    async fn run_inner(
        &self,
        job_id: &str,
        start_path: &str,
        status_path_template: &str,
        payload: Value,
    ) -> Result<()> {
        self.jobs.update(job_id, JobStatus::Running, None);

        let submission = self
            .dispatcher
            .dispatch(OutboundRequest::post(start_path, payload), None)
            .await;

        if !submission.outcome.is_success_status() && submission.outcome.error.is_some() {
            let message = submission
                .outcome
                .error
                .clone()
                .unwrap_or_else(|| "no response from provider".to_string());
            return Err(RelayError::OrchestrationError(format!(
                "submission failed: {message}"
            )));
        }

        let Some(correlation_id) = extract_correlation_id(&submission.outcome.body) else {
            return Err(RelayError::OrchestrationError(format!(
                "provider did not return a correlation id (response: {})",
                submission.outcome.body
            )));
        };

        // Pin the credential that carried the successful submission; every
        // poll below bypasses rotation and reuses it.
        let Some(lease) = submission.credential else {
            return Err(RelayError::OrchestrationError(
                "submission succeeded but no credential was recorded".to_string(),
            ));
        };

        let status_path = status_path_template.replace("{id}", &correlation_id);
        info!(
            job_id,
            correlation_id = %correlation_id,
            credential = %lease.masked(),
            "🔁 Polling with pinned credential"
        );

        for attempt in 1..=self.config.max_attempts {
            tokio::time::sleep(self.config.interval).await;

            let poll = self
                .transport
                .execute(
                    OutboundRequest::get(&status_path).with_timeout(self.config.request_timeout),
                    lease.secret(),
                )
                .await;

            if poll.status.is_none() && poll.body.is_null() {
                // A single missed poll is not fatal.
                warn!(
                    job_id,
                    attempt,
                    error = poll.error.as_deref().unwrap_or("no response"),
                    "📭 Poll yielded no response, continuing"
                );
                continue;
            }

            debug!(job_id, attempt, "📬 Poll response received");

            match evaluate_poll(&poll.body) {
                PollVerdict::Completed { empty } => {
                    self.jobs
                        .update(job_id, JobStatus::Completed, Some(poll.body));
                    if empty {
                        self.jobs.mark_empty_result(job_id);
                        warn!(job_id, "📦 Completed with empty result payload");
                    } else {
                        info!(job_id, attempt, "✅ Enrichment job completed");
                    }
                    return Ok(());
                }
                PollVerdict::FailedTerminal => {
                    self.jobs.update(job_id, JobStatus::Failed, Some(poll.body));
                    warn!(job_id, attempt, "❌ Provider reported terminal failure");
                    return Ok(());
                }
                PollVerdict::InFlight => {}
            }
        }

        self.jobs.update(
            job_id,
            JobStatus::Failed,
            Some(json!({
                "error": format!(
                    "enrichment timed out after {} polling attempts",
                    self.config.max_attempts
                )
            })),
        );
        warn!(job_id, attempts = self.config.max_attempts, "⏰ Enrichment job timed out");
        Ok(())
    }
}

/// Pull the provider-assigned correlation id out of a submission response,
/// checking the known field names in order.
pub fn extract_correlation_id(body: &Value) -> Option<String> {
    for field in CORRELATION_ID_FIELDS {
        match body.get(field) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Decide what a poll response means for the job.
fn evaluate_poll(body: &Value) -> PollVerdict {
    // A result payload wins over any status field.
    if let Some(companies) = body.get("companies").and_then(Value::as_array) {
        return PollVerdict::Completed {
            empty: !entries_have_data(companies),
        };
    }
    for key in ["organizations", "people"] {
        if body.get(key).is_some() {
            return PollVerdict::Completed { empty: false };
        }
    }

    if let Some(status) = body.get("status").and_then(Value::as_str) {
        let status = status.to_uppercase();
        if IN_FLIGHT_STATUS_VALUES.contains(&status.as_str()) {
            return PollVerdict::InFlight;
        }
        if COMPLETED_STATUS_VALUES.contains(&status.as_str()) {
            return PollVerdict::Completed { empty: false };
        }
        return PollVerdict::FailedTerminal;
    }

    PollVerdict::InFlight
}

/// Whether any returned entry carries a recognized non-empty field.
fn entries_have_data(entries: &[Value]) -> bool {
    entries.iter().any(|entry| {
        ["name", "description", "website"].iter().any(|field| {
            entry
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty())
        })
    })
}
