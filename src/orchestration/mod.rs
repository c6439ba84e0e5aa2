//! # Job Orchestration
//!
//! Asynchronous submit-and-poll orchestration built on top of the dispatch
//! pipeline and the job registry.

pub mod enrichment;

pub use enrichment::{extract_correlation_id, EnrichmentOrchestrator, PollConfig};
