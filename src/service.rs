//! # Relay Service Facade
//!
//! The surface the core exposes to its collaborators (HTTP routes, dashboard
//! stores, settings handlers): fire-and-forget job submission, job status
//! lookup, one-shot dispatch, and diagnostic read-outs.
//!
//! One `RelayService` owns the process-wide credential registry and job
//! registry; collaborators receive it by handle (`Arc`) and never touch the
//! registries directly.

use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::credentials::{CredentialStats, RotationManager};
use crate::dispatch::{
    CallOutcome, DispatchConfig, DispatchStats, HttpTransport, OutboundRequest, ReqwestTransport,
    RotatingDispatcher,
};
use crate::error::{RelayError, Result};
use crate::jobs::{JobRecord, JobRegistry};
use crate::orchestration::{EnrichmentOrchestrator, PollConfig};

/// Process-wide relay core: rotation-aware dispatch plus asynchronous job
/// orchestration.
pub struct RelayService {
    rotation: Arc<RotationManager>,
    dispatcher: Arc<RotatingDispatcher>,
    orchestrator: Arc<EnrichmentOrchestrator>,
    jobs: Arc<JobRegistry>,
}

impl RelayService {
    /// Build the service with the production `reqwest` transport.
    ///
    /// Zero configured secrets is a configuration error — the one condition
    /// under which construction fails rather than degrading.
    pub fn new(config: RelayConfig, secrets: Vec<String>) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(
            config.base_url.clone(),
            config.request_timeout(),
        ));
        Self::with_transport(config, secrets, transport)
    }

    /// Build the service around an injected transport (tests, embedding).
    pub fn with_transport(
        config: RelayConfig,
        secrets: Vec<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        config.validate()?;
        if secrets.is_empty() {
            return Err(RelayError::ConfigurationError(
                "at least one credential secret is required".to_string(),
            ));
        }

        let rotation = Arc::new(RotationManager::new(secrets));
        let dispatcher = Arc::new(RotatingDispatcher::new(
            Arc::clone(&rotation),
            Arc::clone(&transport),
            DispatchConfig {
                retry_delay: config.retry_delay(),
                quota_cooldown: config.quota_cooldown(),
                rate_limit_cooldown: config.rate_limit_cooldown(),
                transient_cooldown: config.transient_cooldown(),
                max_backoff_exponent: config.max_backoff_exponent,
            },
        ));
        let jobs = Arc::new(JobRegistry::new());
        let orchestrator = Arc::new(EnrichmentOrchestrator::new(
            Arc::clone(&dispatcher),
            Arc::clone(&transport),
            Arc::clone(&jobs),
            PollConfig {
                max_attempts: config.poll_max_attempts,
                interval: config.poll_interval(),
                request_timeout: config.request_timeout(),
            },
        ));

        info!(
            credentials = rotation.len(),
            base_url = %config.base_url,
            "🚀 Relay service initialized"
        );

        Ok(Self {
            rotation,
            dispatcher,
            orchestrator,
            jobs,
        })
    }

    /// Build from `RELAY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = RelayConfig::from_env()?;
        let secrets = crate::config::load_credential_secrets();
        Self::new(config, secrets)
    }

    /// Mint a fresh caller-side job id.
    pub fn mint_job_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Register a job and start its orchestrator detached (fire-and-forget;
    /// there is no cancellation handle). The caller observes progress only
    /// through [`RelayService::get_job_status`].
    pub fn submit_job(
        &self,
        job_id: &str,
        start_path: &str,
        status_path_template: &str,
        payload: Value,
    ) {
        self.jobs.create(job_id);

        let orchestrator = Arc::clone(&self.orchestrator);
        let job_id = job_id.to_string();
        let start_path = start_path.to_string();
        let status_path_template = status_path_template.to_string();

        tokio::spawn(async move {
            orchestrator
                .run(&job_id, &start_path, &status_path_template, payload)
                .await;
        });
    }

    /// Current state of a job; unknown ids yield the `not_found` sentinel.
    pub fn get_job_status(&self, job_id: &str) -> JobRecord {
        self.jobs.get(job_id)
    }

    /// One-shot rotated call with no job tracking.
    pub async fn dispatch(
        &self,
        request: OutboundRequest,
        max_attempts: Option<usize>,
    ) -> CallOutcome {
        self.dispatcher.dispatch(request, max_attempts).await.outcome
    }

    /// Per-credential diagnostics, masked.
    pub fn credential_stats(&self) -> Vec<CredentialStats> {
        self.rotation.stats()
    }

    /// Aggregate dispatcher counters.
    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Administrative reset of every credential disable and cooldown.
    pub fn reset_cooldowns(&self) {
        self.rotation.reset_cooldowns();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_secrets_is_a_configuration_error() {
        let result = RelayService::new(RelayConfig::default(), vec![]);
        assert!(matches!(result, Err(RelayError::ConfigurationError(_))));
    }

    #[test]
    fn test_mint_job_id_is_unique() {
        assert_ne!(RelayService::mint_job_id(), RelayService::mint_job_id());
    }
}
