//! Integration tests for the rotating dispatcher: classification-driven
//! retries, credential health recording, and exhaustion behavior.

mod common;

use std::sync::Arc;

use relay_core::config::RelayConfig;
use relay_core::credentials::RotationManager;
use relay_core::dispatch::{
    DispatchConfig, HttpTransport, OutboundRequest, RotatingDispatcher,
};
use serde_json::json;

use common::{http_error, ok, ScriptedTransport};

fn dispatcher_with(
    secrets: &[&str],
    transport: Arc<ScriptedTransport>,
) -> (Arc<RotationManager>, RotatingDispatcher) {
    let rotation = Arc::new(RotationManager::new(
        secrets.iter().map(|s| s.to_string()).collect(),
    ));
    let dispatcher = RotatingDispatcher::new(
        Arc::clone(&rotation),
        transport,
        DispatchConfig::default(),
    );
    (rotation, dispatcher)
}

#[tokio::test(start_paused = true)]
async fn success_on_later_attempt_stops_retrying() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        http_error(503, "service unavailable"),
        ok(json!({"companies": [{"name": "Example Co"}]})),
    ]));
    let (_, dispatcher) = dispatcher_with(&["key-aaaaa", "key-bbbbb"], Arc::clone(&transport));

    let result = dispatcher
        .dispatch(OutboundRequest::get("/v2/companies/search"), None)
        .await;

    assert_eq!(result.outcome.status, Some(200));
    assert_eq!(result.outcome.body["companies"][0]["name"], "Example Co");
    // Success on attempt 2 of a budget of 4: no further attempts issued.
    assert_eq!(transport.calls().len(), 2);

    let stats = dispatcher.stats();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.attempts, 2);
    assert_eq!(stats.successes, 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_credentials_cool_down_then_rotation_succeeds() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        http_error(429, "too many requests"),
        http_error(429, "too many requests"),
        ok(json!({"enrichmentID": "abc123"})),
    ]));
    let (rotation, dispatcher) =
        dispatcher_with(&["key-11111", "key-22222", "key-33333"], Arc::clone(&transport));

    let result = dispatcher
        .dispatch(
            OutboundRequest::post("/v2/companies/enrich", json!({"domain": "example.com"})),
            None,
        )
        .await;

    assert_eq!(result.outcome.status, Some(200));
    assert_eq!(result.outcome.body["enrichmentID"], "abc123");

    // Round robin: three distinct credentials carried the three attempts.
    let secrets: Vec<String> = transport.calls().iter().map(|c| c.secret.clone()).collect();
    assert_eq!(secrets, vec!["key-11111", "key-22222", "key-33333"]);

    // The rate-limited credentials got a cooldown window, not a permanent
    // disable.
    let stats = rotation.stats();
    assert!(stats[0].disabled);
    assert!(stats[0].cooldown_until.is_some());
    assert!(stats[1].disabled);
    assert!(stats[1].cooldown_until.is_some());
    assert!(!stats[2].disabled);
    assert_eq!(stats[2].successful_attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn unauthorized_disables_credential_permanently_without_retry() {
    let transport = Arc::new(ScriptedTransport::new(vec![http_error(
        401,
        "invalid api key",
    )]));
    let (rotation, dispatcher) = dispatcher_with(&["key-aaaaa", "key-bbbbb"], Arc::clone(&transport));

    let result = dispatcher
        .dispatch(OutboundRequest::get("/v2/credits"), None)
        .await;

    assert_eq!(result.outcome.status, Some(401));
    assert_eq!(transport.calls().len(), 1);

    let stats = rotation.stats();
    assert!(stats[0].disabled);
    // Permanent: no cooldown window to expire.
    assert!(stats[0].cooldown_until.is_none());
}

#[tokio::test(start_paused = true)]
async fn quota_vocabulary_on_403_rotates_to_next_credential() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        http_error(403, "monthly quota exceeded"),
        ok(json!({"people": []})),
    ]));
    let (rotation, dispatcher) = dispatcher_with(&["key-aaaaa", "key-bbbbb"], Arc::clone(&transport));

    let result = dispatcher
        .dispatch(OutboundRequest::get("/v2/people/search"), None)
        .await;

    assert_eq!(result.outcome.status, Some(200));
    assert_eq!(transport.calls().len(), 2);
    assert!(rotation.stats()[0].disabled);
    assert!(rotation.stats()[0].cooldown_until.is_some());
}

#[tokio::test(start_paused = true)]
async fn plain_403_surfaces_immediately() {
    let transport = Arc::new(ScriptedTransport::new(vec![http_error(
        403,
        "forbidden resource",
    )]));
    let (_, dispatcher) = dispatcher_with(&["key-aaaaa", "key-bbbbb"], Arc::clone(&transport));

    let result = dispatcher
        .dispatch(OutboundRequest::get("/v2/people/search"), None)
        .await;

    assert_eq!(result.outcome.status, Some(403));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_returns_synthetic_failure_without_panicking() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        http_error(500, "internal error"),
        http_error(500, "internal error"),
    ]));
    let (_, dispatcher) = dispatcher_with(&["key-aaaaa", "key-bbbbb"], Arc::clone(&transport));

    let result = dispatcher
        .dispatch(OutboundRequest::get("/v2/companies/search"), None)
        .await;

    assert!(result.outcome.status.is_none());
    assert_eq!(
        result.outcome.error.as_deref(),
        Some("all dispatch attempts exhausted")
    );
    // Both credentials enter cooldown after one 500 each; the remaining
    // budget is spent waiting on rotation, not on network I/O.
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn oversized_backoff_cap_degrades_to_exhaustion_not_panic() {
    // A cap past the u32 exponent range must saturate the delay; the
    // dispatch task still ends in the synthetic exhaustion outcome.
    let transport = Arc::new(ScriptedTransport::new(vec![
        http_error(429, "too many requests");
        40
    ]));
    let rotation = Arc::new(RotationManager::new(vec!["key-aaaaa".to_string()]));
    let dispatcher = RotatingDispatcher::new(
        Arc::clone(&rotation),
        Arc::clone(&transport) as Arc<dyn HttpTransport>,
        DispatchConfig {
            max_backoff_exponent: 40,
            ..DispatchConfig::default()
        },
    );

    let result = dispatcher
        .dispatch(OutboundRequest::get("/v2/companies/search"), Some(40))
        .await;

    assert!(result.outcome.status.is_none());
    assert_eq!(
        result.outcome.error.as_deref(),
        Some("all dispatch attempts exhausted")
    );
    // The lone credential cools down after the first 429; the rest of the
    // budget is spent in (saturated) backoff waits.
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn caller_can_override_attempt_budget() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        http_error(502, "bad gateway"),
        http_error(502, "bad gateway"),
    ]));
    let (_, dispatcher) = dispatcher_with(&["key-aaaaa", "key-bbbbb"], Arc::clone(&transport));

    let result = dispatcher
        .dispatch(OutboundRequest::get("/v2/companies/search"), Some(1))
        .await;

    assert!(result.outcome.status.is_none());
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_status_with_business_data_counts_as_success() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        relay_core::dispatch::CallOutcome {
            body: json!({"results": [{"id": 1}]}),
            status: None,
            error: None,
        },
    ]));
    let (rotation, dispatcher) = dispatcher_with(&["key-aaaaa"], Arc::clone(&transport));

    let result = dispatcher
        .dispatch(OutboundRequest::get("/v2/companies/search"), None)
        .await;

    assert!(result.outcome.status.is_none());
    assert!(result.outcome.error.is_none());
    assert_eq!(rotation.stats()[0].successful_attempts, 1);
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn one_shot_dispatch_through_service_facade() {
    let transport = Arc::new(ScriptedTransport::new(vec![ok(json!({"total": 42}))]));
    let service = relay_core::RelayService::with_transport(
        RelayConfig::default(),
        vec!["key-aaaaa".to_string()],
        transport,
    )
    .expect("service builds");

    let outcome = service
        .dispatch(OutboundRequest::get("/v2/companies/search"), None)
        .await;
    assert_eq!(outcome.status, Some(200));
    assert_eq!(outcome.body["total"], 42);

    let stats = service.dispatch_stats();
    assert_eq!(stats.successes, 1);
}
