#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Relay Core
//!
//! Rust core of a backend relay that accepts enrichment/search jobs,
//! forwards them to a rate-limited, quota-bearing external API, and reports
//! asynchronous completion.
//!
//! ## Overview
//!
//! The heart of the crate is the outbound credential-rotation dispatcher and
//! the asynchronous submit-then-poll orchestrator built on top of it.
//! Inbound HTTP routes, schema validation, and dashboard persistence are
//! collaborator concerns; they reach the core through a small facade:
//! submit a job, read its status, or issue a one-shot rotated call.
//!
//! ## Module Organization
//!
//! - [`credentials`] - Credential registry and round-robin rotation manager
//! - [`dispatch`] - Outbound call executor, outcome classifier, and the
//!   rotating dispatcher
//! - [`jobs`] - In-memory job lifecycle registry
//! - [`orchestration`] - Submit-and-poll enrichment orchestration
//! - [`service`] - Process-wide facade wiring the above together
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging initialization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay_core::config::RelayConfig;
//! use relay_core::service::RelayService;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! relay_core::logging::init_structured_logging();
//!
//! let service = RelayService::new(
//!     RelayConfig::default(),
//!     vec!["api-key-one".into(), "api-key-two".into()],
//! )?;
//!
//! let job_id = RelayService::mint_job_id();
//! service.submit_job(
//!     &job_id,
//!     "/v2/companies/enrich",
//!     "/v2/companies/enrich/{id}",
//!     json!({"companies": [{"domain": "example.com"}]}),
//! );
//!
//! // Later: poll service.get_job_status(&job_id) for the terminal state.
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! Single tokio runtime, cooperative suspension at every outbound call and
//! sleep. The credential registry's scan-and-update sequence and the job
//! registry's insert/update sequence are non-suspending critical sections
//! (`parking_lot::Mutex`, `DashMap`), so concurrently running orchestrators
//! share them safely.

pub mod config;
pub mod constants;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod orchestration;
pub mod service;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use service::RelayService;
