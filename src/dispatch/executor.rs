//! # Outbound Call Executor
//!
//! Performs exactly one HTTP request/response cycle against the external
//! provider with a specific credential, reducing every outcome to the uniform
//! [`CallOutcome`] shape.
//!
//! ## Contract
//!
//! Ordinary HTTP error statuses (4xx/5xx) are returned as data with `status`
//! set — they are never surfaced as `Err`. Only transport-level problems
//! (connection failure, timeout expiry, unreadable response body) produce an
//! outcome with `status` absent. The executor does not touch the credential
//! registry; outcome recording belongs to the dispatcher.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// One outbound request, independent of the credential that will carry it.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Path relative to the configured base URL, e.g. `/v2/companies/enrich`.
    pub path: String,
    pub body: Option<Value>,
    pub params: Vec<(String, String)>,
    /// Per-call timeout; the transport default applies when `None`.
    pub timeout: Option<Duration>,
}

impl OutboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            params: Vec::new(),
            timeout: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
            params: Vec::new(),
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }
}

/// Uniform result shape for a single outbound call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CallOutcome {
    /// Parsed JSON body, or the raw text as a JSON string when the body was
    /// not valid JSON, or `Null` when nothing came back.
    pub body: Value,

    /// HTTP status code; absent for transport-level failures.
    pub status: Option<u16>,

    /// Populated for any non-2xx status or transport failure.
    pub error: Option<String>,
}

impl CallOutcome {
    pub fn is_success_status(&self) -> bool {
        matches!(self.status, Some(code) if (200..300).contains(&code))
    }

    /// Transport-level failure: no status code was ever observed.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            body: Value::Null,
            status: None,
            error: Some(message.into()),
        }
    }

    /// Synthetic failure for an exhausted dispatch budget.
    pub fn exhausted() -> Self {
        Self::transport_failure("all dispatch attempts exhausted")
    }

    /// Synthetic failure for dispatch against an empty registry.
    pub fn no_credentials() -> Self {
        Self::transport_failure("no credentials configured")
    }
}

/// Transport seam for outbound calls.
///
/// Production uses [`ReqwestTransport`]; tests substitute scripted fakes.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: OutboundRequest, secret: &str) -> CallOutcome;
}

/// `reqwest`-backed transport speaking bearer-token JSON to the provider.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    default_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, default_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(default_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "HTTP client builder failed, falling back to a default client");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.into(),
            default_timeout,
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: OutboundRequest, secret: &str) -> CallOutcome {
        let url = self.url_for(&request.path);
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        debug!(method = %request.method, url = %url, "🌐 Outbound call");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .bearer_auth(secret)
            .header("Content-Type", "application/json")
            .timeout(timeout);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(url = %url, timeout_secs = timeout.as_secs(), "⏱️ Outbound call timed out");
                return CallOutcome::transport_failure(format!(
                    "request timed out after {} seconds",
                    timeout.as_secs()
                ));
            }
            Err(e) if e.is_connect() => {
                warn!(url = %url, error = %e, "🔌 Connection failure");
                return CallOutcome::transport_failure(format!("connection failed: {e}"));
            }
            Err(e) => {
                warn!(url = %url, error = %e, "🔌 Transport failure");
                return CallOutcome::transport_failure(format!("request failed: {e}"));
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return CallOutcome::transport_failure(format!("unreadable response body: {e}"));
            }
        };

        let parsed: Option<Value> = serde_json::from_str(&text).ok();

        if (200..300).contains(&status) {
            match parsed {
                Some(body) => CallOutcome {
                    body,
                    status: Some(status),
                    error: None,
                },
                None => CallOutcome {
                    body: Value::String(text),
                    status: Some(status),
                    error: Some("response body was not valid JSON".to_string()),
                },
            }
        } else {
            // Error statuses are data: surface the provider's own message
            // when the body parses, the raw text otherwise.
            let (body, error) = match parsed {
                Some(body) => {
                    let message = body
                        .get("message")
                        .or_else(|| body.get("error"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| body.to_string());
                    (body, message)
                }
                None => (Value::String(text.clone()), text),
            };
            CallOutcome {
                body,
                status: Some(status),
                error: Some(error),
            }
        }
    }
}
