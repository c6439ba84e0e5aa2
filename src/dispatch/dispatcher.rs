//! # Rotating Dispatcher
//!
//! Drives the rotation manager and the outbound executor through a bounded
//! number of attempts per logical request, recording every outcome back into
//! the credential registry and pacing retries with capped exponential
//! backoff.
//!
//! Attempts within one `dispatch` call are strictly sequential — there is no
//! speculative parallel credential trial. Independent `dispatch` calls
//! interleave freely and share the registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::credentials::{CredentialLease, RotationManager};
use crate::dispatch::classifier::{classify, AttemptDisposition, ClassifierPolicy, RetryPacing};
use crate::dispatch::executor::{CallOutcome, HttpTransport, OutboundRequest};

/// Retry and cooldown knobs for the dispatch loop.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Base delay between attempts.
    pub retry_delay: Duration,
    /// Cooldown assigned on a quota signal (403 + vocabulary).
    pub quota_cooldown: Duration,
    /// Cooldown assigned on a rate-limit signal (429).
    pub rate_limit_cooldown: Duration,
    /// Short penalty applied on generic transient failures.
    pub transient_cooldown: Duration,
    /// Exponent cap: delay = retry_delay * 2^min(attempt, cap).
    pub max_backoff_exponent: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            retry_delay: crate::constants::DEFAULT_RETRY_DELAY,
            quota_cooldown: crate::constants::cooldown::QUOTA_EXCEEDED,
            rate_limit_cooldown: crate::constants::cooldown::RATE_LIMITED,
            transient_cooldown: crate::constants::cooldown::TRANSIENT_FAILURE,
            max_backoff_exponent: crate::constants::MAX_BACKOFF_EXPONENT,
        }
    }
}

/// Aggregate dispatcher counters for diagnostics. Not part of the
/// correctness contract.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct DispatchStats {
    /// Logical `dispatch` invocations.
    pub requests: u64,
    /// Individual attempts that reached the transport.
    pub attempts: u64,
    /// Attempts classified as success.
    pub successes: u64,
}

/// Result of one dispatch invocation: the final call outcome plus the
/// credential used on the most recent attempt (session affinity for callers
/// that must poll with the same credential).
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub outcome: CallOutcome,
    pub credential: Option<CredentialLease>,
}

/// Orchestrates rotation, execution, classification, and backoff.
pub struct RotatingDispatcher {
    rotation: Arc<RotationManager>,
    transport: Arc<dyn HttpTransport>,
    config: DispatchConfig,
    requests: AtomicU64,
    attempts: AtomicU64,
    successes: AtomicU64,
}

impl RotatingDispatcher {
    pub fn new(
        rotation: Arc<RotationManager>,
        transport: Arc<dyn HttpTransport>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            rotation,
            transport,
            config,
            requests: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
            successes: AtomicU64::new(0),
        }
    }

    /// Issue one logical request, rotating across credentials for up to
    /// `max_attempts` tries (default: twice the registry size).
    ///
    /// Never returns `Err`: remote failures come back as structured
    /// [`CallOutcome`] data, exhaustion as a synthetic failure outcome.
    pub async fn dispatch(
        &self,
        request: OutboundRequest,
        max_attempts: Option<usize>,
    ) -> DispatchOutcome {
        if self.rotation.is_empty() {
            warn!("Dispatch requested with an empty credential registry");
            return DispatchOutcome {
                outcome: CallOutcome::no_credentials(),
                credential: None,
            };
        }

        self.requests.fetch_add(1, Ordering::Relaxed);
        let budget = max_attempts.unwrap_or_else(|| self.rotation.len() * 2);
        let policy = ClassifierPolicy {
            quota_cooldown: self.config.quota_cooldown,
            rate_limit_cooldown: self.config.rate_limit_cooldown,
        };

        let mut last_credential: Option<CredentialLease> = None;

        for attempt in 0..budget {
            let Some(lease) = self.rotation.next_available() else {
                // Everything is cooling down; wait without burning network I/O.
                let delay = self.backoff_delay(attempt);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "😴 No usable credential, backing off"
                );
                tokio::time::sleep(delay).await;
                continue;
            };

            self.attempts.fetch_add(1, Ordering::Relaxed);
            debug!(
                attempt,
                credential = %lease.masked(),
                path = %request.path,
                "📡 Dispatch attempt"
            );

            let outcome = self
                .transport
                .execute(request.clone(), lease.secret())
                .await;
            let disposition = classify(&outcome, &policy);
            last_credential = Some(lease.clone());

            match disposition {
                AttemptDisposition::Success => {
                    self.rotation.record_success(lease.id);
                    self.successes.fetch_add(1, Ordering::Relaxed);
                    return DispatchOutcome {
                        outcome,
                        credential: Some(lease),
                    };
                }
                AttemptDisposition::PermanentCredentialFailure => {
                    warn!(credential = %lease.masked(), "⛔ 401 from provider, disabling credential");
                    self.rotation.record_permanent_failure(lease.id);
                    return DispatchOutcome {
                        outcome,
                        credential: Some(lease),
                    };
                }
                AttemptDisposition::QuotaCooldown { cooldown, pacing } => {
                    self.rotation.record_quota_exceeded(lease.id, cooldown);
                    let delay = match pacing {
                        RetryPacing::Fixed => self.config.retry_delay,
                        RetryPacing::Exponential => self.backoff_delay(attempt),
                    };
                    tokio::time::sleep(delay).await;
                }
                AttemptDisposition::TransientRetry => {
                    self.rotation
                        .record_transient_failure(lease.id, self.config.transient_cooldown);
                    tokio::time::sleep(self.backoff_delay(attempt)).await;
                }
                AttemptDisposition::TransientReturn => {
                    self.rotation
                        .record_transient_failure(lease.id, self.config.transient_cooldown);
                    return DispatchOutcome {
                        outcome,
                        credential: Some(lease),
                    };
                }
            }
        }

        info!(budget, "🧯 Dispatch budget exhausted");
        DispatchOutcome {
            outcome: CallOutcome::exhausted(),
            credential: last_credential,
        }
    }

    /// Capped exponential backoff for the given zero-based attempt index.
    /// Saturates instead of overflowing, so a misconfigured cap degrades to
    /// a long wait rather than a panic in a detached dispatch task.
    fn backoff_delay(&self, attempt: usize) -> Duration {
        let exponent = (attempt as u32).min(self.config.max_backoff_exponent);
        self.config
            .retry_delay
            .saturating_mul(2u32.saturating_pow(exponent))
    }

    /// Snapshot of the aggregate counters.
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            requests: self.requests.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
        }
    }
}
