//! Shared test support: a scripted transport that replays canned call
//! outcomes in order and records every call it receives.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;

use relay_core::dispatch::{CallOutcome, HttpTransport, OutboundRequest};

/// One call observed by the scripted transport.
#[derive(Debug, Clone)]
#[allow(dead_code)] // not every test binary reads every field
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub secret: String,
}

/// Transport double that pops one scripted outcome per call.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<CallOutcome>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<CallOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: OutboundRequest, secret: &str) -> CallOutcome {
        self.calls.lock().push(RecordedCall {
            method: request.method.to_string(),
            path: request.path.clone(),
            secret: secret.to_string(),
        });
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| CallOutcome::transport_failure("script exhausted"))
    }
}

/// A 200 outcome with the given JSON body.
pub fn ok(body: Value) -> CallOutcome {
    CallOutcome {
        body,
        status: Some(200),
        error: None,
    }
}

/// An HTTP error outcome with the given status and message.
pub fn http_error(status: u16, message: &str) -> CallOutcome {
    CallOutcome {
        body: json!({ "message": message }),
        status: Some(status),
        error: Some(message.to_string()),
    }
}
