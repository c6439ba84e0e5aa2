//! # Attempt Outcome Classification
//!
//! Pure classification of a single call outcome into the action the dispatch
//! loop must take. Keeping this as a standalone function lets the policy be
//! unit-tested and swapped independently of the retry loop.
//!
//! ## Policy
//!
//! | Outcome | Disposition |
//! |---|---|
//! | 2xx | success, return |
//! | 401 | disable credential permanently, return |
//! | 403 + quota vocabulary | quota cooldown (long), retry after fixed delay |
//! | 403 otherwise | transient, return |
//! | 429 | quota cooldown (short), retry with exponential backoff |
//! | 500/502/503/504 | transient, retry with exponential backoff |
//! | no status, business-data body | success (the call plainly worked) |
//! | no status otherwise | transient, return |
//! | anything else | transient, return |

use serde_json::Value;
use std::time::Duration;

use crate::constants::{BUSINESS_DATA_KEYS, QUOTA_VOCABULARY, RETRYABLE_SERVER_STATUSES};
use crate::dispatch::executor::CallOutcome;

/// Delay behavior for a retryable disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPacing {
    /// Sleep the base retry delay once.
    Fixed,
    /// Sleep base delay scaled by 2^min(attempt, cap).
    Exponential,
}

/// What the dispatch loop should do with one attempt's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDisposition {
    /// Record success and return the result immediately.
    Success,

    /// 401: the credential itself is unusable. Disable it permanently and
    /// return without retrying.
    PermanentCredentialFailure,

    /// Quota or rate-limit signal: cool the credential down and move on to
    /// the next one.
    QuotaCooldown {
        cooldown: Duration,
        pacing: RetryPacing,
    },

    /// Server-side transient failure: short credential penalty, back off,
    /// try again.
    TransientRetry,

    /// Non-retryable failure: record it and surface the result unchanged.
    TransientReturn,
}

/// Cooldown windows the classifier assigns; sourced from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierPolicy {
    pub quota_cooldown: Duration,
    pub rate_limit_cooldown: Duration,
}

/// Classify one call outcome. Pure: no I/O, no registry access.
pub fn classify(outcome: &CallOutcome, policy: &ClassifierPolicy) -> AttemptDisposition {
    match outcome.status {
        Some(code) if (200..300).contains(&code) => AttemptDisposition::Success,
        Some(401) => AttemptDisposition::PermanentCredentialFailure,
        Some(403) => {
            if mentions_quota(outcome.error.as_deref().unwrap_or_default()) {
                AttemptDisposition::QuotaCooldown {
                    cooldown: policy.quota_cooldown,
                    pacing: RetryPacing::Fixed,
                }
            } else {
                AttemptDisposition::TransientReturn
            }
        }
        Some(429) => AttemptDisposition::QuotaCooldown {
            cooldown: policy.rate_limit_cooldown,
            pacing: RetryPacing::Exponential,
        },
        Some(code) if RETRYABLE_SERVER_STATUSES.contains(&code) => {
            AttemptDisposition::TransientRetry
        }
        Some(_) => AttemptDisposition::TransientReturn,
        None => {
            if has_business_data(&outcome.body) {
                AttemptDisposition::Success
            } else {
                // Ambiguous transport failure: do not loop forever on it.
                AttemptDisposition::TransientReturn
            }
        }
    }
}

/// Whether error text matches the provider's quota/rate-limit vocabulary.
pub fn mentions_quota(text: &str) -> bool {
    let lowered = text.to_lowercase();
    QUOTA_VOCABULARY.iter().any(|word| lowered.contains(word))
}

/// Whether a body carries a recognizable business-data key — a genuine
/// result payload rather than an error envelope.
pub fn has_business_data(body: &Value) -> bool {
    match body {
        Value::Object(map) => BUSINESS_DATA_KEYS.iter().any(|key| map.contains_key(*key)),
        _ => false,
    }
}
