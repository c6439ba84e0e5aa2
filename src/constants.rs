//! # System Constants
//!
//! Classification vocabularies, cooldown windows, and orchestration bounds that
//! define the operational boundaries of the relay core.
//!
//! These values mirror the behavior of the upstream enrichment provider: quota
//! exhaustion heals on a one-hour window, rate limits recover within minutes,
//! and enrichment jobs resolve well inside twenty polling rounds.

use std::time::Duration;

/// Default per-call timeout for outbound requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Base delay between dispatch attempts before exponential scaling.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Exponent cap for exponential backoff (delay = base * 2^min(attempt, cap)).
pub const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Cooldown windows applied to credentials by outcome class.
pub mod cooldown {
    use std::time::Duration;

    /// Quota exhaustion (403 with quota vocabulary) — long window, quotas
    /// reset on provider billing cycles.
    pub const QUOTA_EXCEEDED: Duration = Duration::from_secs(60 * 60);

    /// Rate limiting (429) — short window, rate limits self-heal quickly.
    pub const RATE_LIMITED: Duration = Duration::from_secs(5 * 60);

    /// Generic transient failure — brief penalty without a full disable.
    pub const TRANSIENT_FAILURE: Duration = Duration::from_secs(2 * 60);
}

/// Status codes treated as transient server failures worth retrying.
pub const RETRYABLE_SERVER_STATUSES: &[u16] = &[500, 502, 503, 504];

/// Error-text vocabulary that marks a 403 as a quota problem rather than a
/// plain authorization refusal.
pub const QUOTA_VOCABULARY: &[&str] = &["quota", "rate", "limit", "throttle", "usage"];

/// Top-level body keys recognized as genuine business data. A response
/// carrying one of these is a result payload, not an error envelope.
pub const BUSINESS_DATA_KEYS: &[&str] = &[
    "companies",
    "organizations",
    "people",
    "results",
    "records",
    "total",
    "nextPageToken",
];

/// Ordered field names checked for the provider-assigned correlation id in a
/// submission response.
pub const CORRELATION_ID_FIELDS: &[&str] = &["enrichmentID", "id"];

/// Provider status values that mean "still working" during polling.
pub const IN_FLIGHT_STATUS_VALUES: &[&str] = &["IN_PROGRESS", "PENDING", "UNKNOWN"];

/// Provider terminal status values mapped to a completed job; any other
/// terminal value maps to failed.
pub const COMPLETED_STATUS_VALUES: &[&str] =
    &["COMPLETED", "DONE", "FINISHED", "SUCCESS", "SUCCEEDED"];

/// Maximum polling rounds per enrichment job.
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 20;

/// Delay before each polling round.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Number of trailing secret characters exposed in masked identifiers.
pub const SECRET_MASK_SUFFIX_LEN: usize = 5;
