//! # Credential Registry
//!
//! Per-credential health and usage state for outbound calls to the external
//! provider. Records live in insertion order — that order defines the
//! round-robin rotation sequence — and are never removed by the core.
//!
//! Secrets are opaque and never appear in full in logs or diagnostics; only a
//! fixed-length suffix is ever exposed (`...XXXXX`).

pub mod rotation;

pub use rotation::{CredentialLease, RotationManager};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::SECRET_MASK_SUFFIX_LEN;

/// Stable identifier for a credential within the registry.
///
/// Wraps the record's registry index; valid for the process lifetime because
/// records are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(pub(crate) usize);

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "credential#{}", self.0)
    }
}

/// Health and usage bookkeeping for a single outbound credential.
#[derive(Clone, Serialize)]
pub struct CredentialRecord {
    #[serde(skip_serializing)]
    secret: String,

    /// When this credential was last handed out by rotation.
    pub last_used_at: Option<DateTime<Utc>>,

    /// End of the current cooldown window. `None` while disabled means a
    /// permanent disable that only an explicit reset can clear.
    pub cooldown_until: Option<DateTime<Utc>>,

    /// Whether this credential is currently excluded from rotation.
    pub disabled: bool,

    /// Attempts that ended in a recorded failure.
    pub failed_attempts: u64,

    /// Times this credential was handed out by rotation.
    pub total_attempts: u64,

    /// Attempts that ended in a recorded success.
    pub successful_attempts: u64,
}

impl CredentialRecord {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            last_used_at: None,
            cooldown_until: None,
            disabled: false,
            failed_attempts: 0,
            total_attempts: 0,
            successful_attempts: 0,
        }
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }

    /// Masked identifier safe for logs and diagnostics.
    pub fn masked(&self) -> String {
        mask_secret(&self.secret)
    }

    /// Whether the cooldown window has passed relative to `now`.
    pub(crate) fn cooldown_expired(&self, now: DateTime<Utc>) -> bool {
        match self.cooldown_until {
            Some(until) => now > until,
            None => false,
        }
    }
}

// Manual Debug so a full secret can never leak through `{:?}`.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("secret", &self.masked())
            .field("disabled", &self.disabled)
            .field("cooldown_until", &self.cooldown_until)
            .field("failed_attempts", &self.failed_attempts)
            .field("total_attempts", &self.total_attempts)
            .field("successful_attempts", &self.successful_attempts)
            .finish()
    }
}

/// Diagnostic snapshot of one credential, exposed to monitoring collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialStats {
    pub masked_secret: String,
    pub total_attempts: u64,
    pub successful_attempts: u64,
    pub failed_attempts: u64,
    pub disabled: bool,
    pub cooldown_until: Option<DateTime<Utc>>,
}

/// Mask an opaque secret down to its trailing suffix.
pub fn mask_secret(secret: &str) -> String {
    let suffix: String = secret
        .chars()
        .rev()
        .take(SECRET_MASK_SUFFIX_LEN)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret_exposes_only_suffix() {
        assert_eq!(mask_secret("sk-live-abcdef12345"), "...12345");
        assert_eq!(mask_secret("abc"), "...abc");
    }

    #[test]
    fn test_debug_output_masks_secret() {
        let record = CredentialRecord::new("super-secret-key-99999".to_string());
        let rendered = format!("{record:?}");
        assert!(rendered.contains("...99999"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_cooldown_expired() {
        let mut record = CredentialRecord::new("key".to_string());
        assert!(!record.cooldown_expired(Utc::now()));

        record.cooldown_until = Some(Utc::now() - chrono::Duration::seconds(1));
        assert!(record.cooldown_expired(Utc::now()));

        record.cooldown_until = Some(Utc::now() + chrono::Duration::seconds(60));
        assert!(!record.cooldown_expired(Utc::now()));
    }
}
