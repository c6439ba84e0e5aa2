//! # Outbound Dispatch
//!
//! The credential-rotation dispatch pipeline: a transport seam that performs
//! single HTTP calls ([`executor`]), a pure outcome classifier
//! ([`classifier`]), and the retrying rotation loop that ties them to the
//! credential registry ([`dispatcher`]).

pub mod classifier;
pub mod dispatcher;
pub mod executor;

pub use classifier::{classify, AttemptDisposition, ClassifierPolicy, RetryPacing};
pub use dispatcher::{DispatchConfig, DispatchOutcome, DispatchStats, RotatingDispatcher};
pub use executor::{CallOutcome, HttpTransport, OutboundRequest, ReqwestTransport};
