//! # Credential Rotation Manager
//!
//! Round-robin selection over the credential registry with cooldown-aware
//! skipping, plus outcome recording that feeds health state back into the
//! registry.
//!
//! ## Fairness
//!
//! `next_available` scans at most N records starting at the cursor and
//! advances the cursor by one per examined record regardless of outcome, so
//! over N consecutive calls every non-disabled credential is offered at most
//! once extra.
//!
//! ## Concurrency
//!
//! The scan-and-update sequence runs inside a single `parking_lot::Mutex`
//! critical section and never suspends, so the manager is safe to share
//! across concurrently running dispatchers and orchestrators.

use chrono::Utc;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{CredentialId, CredentialRecord, CredentialStats};

/// A credential handed out by rotation: the registry id plus a copy of the
/// secret, usable without holding the registry lock.
#[derive(Clone)]
pub struct CredentialLease {
    pub id: CredentialId,
    secret: String,
}

impl CredentialLease {
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn masked(&self) -> String {
        super::mask_secret(&self.secret)
    }
}

impl std::fmt::Debug for CredentialLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialLease")
            .field("id", &self.id)
            .field("secret", &self.masked())
            .finish()
    }
}

struct RotationState {
    records: Vec<CredentialRecord>,
    cursor: usize,
}

/// Manages round-robin credential selection and outcome recording.
pub struct RotationManager {
    inner: Mutex<RotationState>,
}

impl RotationManager {
    /// Build a registry from configured secrets, preserving insertion order.
    pub fn new(secrets: Vec<String>) -> Self {
        let records: Vec<CredentialRecord> =
            secrets.into_iter().map(CredentialRecord::new).collect();
        for record in &records {
            info!(credential = %record.masked(), "🔑 Registered outbound credential");
        }
        Self {
            inner: Mutex::new(RotationState { records, cursor: 0 }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Hand out the next usable credential in round-robin order.
    ///
    /// Credentials whose cooldown window has passed are re-enabled on
    /// examination. Returns `None` when a full scan finds nothing usable.
    pub fn next_available(&self) -> Option<CredentialLease> {
        let mut state = self.inner.lock();
        if state.records.is_empty() {
            return None;
        }

        let len = state.records.len();
        let now = Utc::now();

        for _ in 0..len {
            let idx = state.cursor;
            state.cursor = (state.cursor + 1) % len;

            let record = &mut state.records[idx];
            if record.disabled && record.cooldown_expired(now) {
                record.disabled = false;
                record.cooldown_until = None;
                info!(credential = %record.masked(), "♻️ Cooldown expired, credential re-enabled");
            }

            if !record.disabled {
                record.last_used_at = Some(now);
                record.total_attempts += 1;
                return Some(CredentialLease {
                    id: CredentialId(idx),
                    secret: record.secret().to_string(),
                });
            }
        }

        debug!("No usable credential after full registry scan");
        None
    }

    /// Record a successful call. A success is proof of health: it clears any
    /// prior disable, including a permanent one.
    pub fn record_success(&self, id: CredentialId) {
        let mut state = self.inner.lock();
        if let Some(record) = state.records.get_mut(id.0) {
            record.successful_attempts += 1;
            if record.disabled {
                record.disabled = false;
                record.cooldown_until = None;
                info!(credential = %record.masked(), "♻️ Success cleared prior disable");
            }
        }
    }

    /// Disable a credential for the given cooldown window after a quota or
    /// rate-limit signal.
    pub fn record_quota_exceeded(&self, id: CredentialId, cooldown: Duration) {
        let mut state = self.inner.lock();
        if let Some(record) = state.records.get_mut(id.0) {
            record.disabled = true;
            record.cooldown_until =
                Some(Utc::now() + chrono::Duration::from_std(cooldown).unwrap_or_else(|_| chrono::Duration::zero()));
            record.failed_attempts += 1;
            warn!(
                credential = %record.masked(),
                cooldown_secs = cooldown.as_secs(),
                "🚫 Credential disabled on quota signal"
            );
        }
    }

    /// Disable a credential indefinitely. Only `record_success` (optimistic
    /// recovery) or an explicit `reset_cooldowns` can bring it back.
    pub fn record_permanent_failure(&self, id: CredentialId) {
        let mut state = self.inner.lock();
        if let Some(record) = state.records.get_mut(id.0) {
            record.disabled = true;
            record.cooldown_until = None;
            record.failed_attempts += 1;
            warn!(credential = %record.masked(), "⛔ Credential permanently disabled");
        }
    }

    /// Record a generic failure: a short cooldown rather than a long disable,
    /// used when the outcome is not a confirmed quota or auth problem.
    pub fn record_transient_failure(&self, id: CredentialId, cooldown: Duration) {
        let mut state = self.inner.lock();
        if let Some(record) = state.records.get_mut(id.0) {
            record.failed_attempts += 1;
            record.disabled = true;
            record.cooldown_until =
                Some(Utc::now() + chrono::Duration::from_std(cooldown).unwrap_or_else(|_| chrono::Duration::zero()));
            debug!(
                credential = %record.masked(),
                cooldown_secs = cooldown.as_secs(),
                "⚠️ Transient failure recorded"
            );
        }
    }

    /// Administrative reset: clear every disable and cooldown.
    pub fn reset_cooldowns(&self) {
        let mut state = self.inner.lock();
        for record in &mut state.records {
            record.disabled = false;
            record.cooldown_until = None;
        }
        info!("♻️ All credential cooldowns reset");
    }

    /// Diagnostic snapshot of every credential, masked.
    pub fn stats(&self) -> Vec<CredentialStats> {
        let state = self.inner.lock();
        state
            .records
            .iter()
            .map(|record| CredentialStats {
                masked_secret: record.masked(),
                total_attempts: record.total_attempts,
                successful_attempts: record.successful_attempts,
                failed_attempts: record.failed_attempts,
                disabled: record.disabled,
                cooldown_until: record.cooldown_until,
            })
            .collect()
    }

    /// Number of credentials currently usable (not disabled, ignoring expired
    /// cooldowns that have not yet been observed).
    pub fn available_count(&self) -> usize {
        let state = self.inner.lock();
        state.records.iter().filter(|r| !r.disabled).count()
    }
}
