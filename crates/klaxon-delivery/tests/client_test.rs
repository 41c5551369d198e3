//! Integration tests for the webhook delivery client.
//!
//! Drives the retry state machine against scripted HTTP responses:
//! backoff sequences, rate-limit handling, permanent failures, and
//! payload clamping on the wire.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::{sync::Arc, time::Duration};

use klaxon_delivery::{
    clock::TestClock, ClientConfig, DeliveryClient, DeliveryError, Embed, OutboundPayload,
};
use wiremock::{
    matchers::{header, header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
};

const BASE_BACKOFF: Duration = Duration::from_millis(50);

fn test_config(url: String) -> ClientConfig {
    ClientConfig { base_backoff: BASE_BACKOFF, ..ClientConfig::new(url) }
}

fn test_client(server: &MockServer) -> (DeliveryClient, TestClock) {
    let clock = TestClock::new();
    let config = test_config(format!("{}/webhook", server.uri()));
    let client = DeliveryClient::with_clock(config, Arc::new(clock.clone()))
        .expect("failed to create client");
    (client, clock)
}

#[tokio::test]
async fn delivers_payload_successfully() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, clock) = test_client(&server);
    let result = client.send(OutboundPayload::text("disk space low")).await;

    assert!(result.is_ok());
    assert!(clock.sleeps().is_empty());

    let requests = server.received_requests().await.expect("requests recorded");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["content"], "disk space low");
}

#[tokio::test]
async fn succeeds_after_server_errors_with_doubling_backoff() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, clock) = test_client(&server);
    let result = client.send(OutboundPayload::text("recovers eventually")).await;

    assert!(result.is_ok());
    assert_eq!(clock.sleeps(), vec![BASE_BACKOFF, BASE_BACKOFF * 2]);
}

#[tokio::test]
async fn retry_after_hint_overrides_computed_backoff() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(
            ResponseTemplate::new(429)
                .append_header("Retry-After", "1.5")
                .set_body_string("rate limited"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, clock) = test_client(&server);
    let result = client.send(OutboundPayload::text("throttled once")).await;

    assert!(result.is_ok());
    // 1.5s from the header, not a multiple of the 50ms base backoff.
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(1500)]);
}

#[tokio::test]
async fn rate_limiting_does_not_consume_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let config = ClientConfig {
        max_retries: 1, // fewer retries than 429 responses
        ..test_config(format!("{}/webhook", server.uri()))
    };
    let client =
        DeliveryClient::with_clock(config, Arc::new(clock.clone())).expect("failed to create");

    let result = client.send(OutboundPayload::text("persistently throttled")).await;

    assert!(result.is_ok());
    // Without a Retry-After hint the 429 branch still walks the
    // exponential sequence, starting at 2^0.
    assert_eq!(clock.sleeps(), vec![BASE_BACKOFF, BASE_BACKOFF * 2, BASE_BACKOFF * 4]);
}

#[tokio::test]
async fn permanent_client_error_fails_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(404).set_body_string("unknown webhook"))
        .expect(1)
        .mount(&server)
        .await;

    let (client, clock) = test_client(&server);
    let result = client.send(OutboundPayload::text("dead endpoint")).await;

    match result {
        Err(DeliveryError::Permanent { status, reason, body }) => {
            assert_eq!(status, 404);
            assert_eq!(reason, "Not Found");
            assert_eq!(body, "unknown webhook");
        },
        other => panic!("expected permanent error, got {other:?}"),
    }
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn exhausts_retry_budget_on_persistent_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(4) // initial attempt + 3 retries
        .mount(&server)
        .await;

    let (client, clock) = test_client(&server);
    let result = client.send(OutboundPayload::text("down for good")).await;

    match result {
        Err(DeliveryError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 4);
            assert!(matches!(*last, DeliveryError::ServerError { status: 503, .. }));
        },
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    assert_eq!(clock.sleeps(), vec![BASE_BACKOFF, BASE_BACKOFF * 2, BASE_BACKOFF * 4]);
}

#[tokio::test]
async fn empty_payload_makes_no_network_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let (client, clock) = test_client(&server);

    assert!(client.send(OutboundPayload::default()).await.is_ok());
    assert!(client.send(OutboundPayload::text("")).await.is_ok());
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn oversized_payload_clamped_on_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _clock) = test_client(&server);
    let payload = OutboundPayload {
        content: Some("x".repeat(2500)),
        embeds: (0..12).map(|i| Embed::new(format!("embed-{i}"), "body", 0)).collect(),
    };

    client.send(payload).await.expect("delivery should succeed");

    let requests = server.received_requests().await.expect("requests recorded");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();

    assert_eq!(body["content"].as_str().unwrap().chars().count(), 2000);
    let embeds = body["embeds"].as_array().unwrap();
    assert_eq!(embeds.len(), 10);
    assert_eq!(embeds[0]["title"], "embed-0");
    assert_eq!(embeds[9]["title"], "embed-9");
}

#[tokio::test]
async fn requests_carry_identifying_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _clock) = test_client(&server);
    let user_agent = client.config().user_agent.clone();
    assert!(user_agent.starts_with("Klaxon-Webhook-Relay/"));

    client.send(OutboundPayload::text("hello")).await.expect("delivery should succeed");

    let requests = server.received_requests().await.expect("requests recorded");
    assert_eq!(requests[0].headers.get("user-agent").unwrap().to_str().unwrap(), user_agent);
}

#[tokio::test]
async fn timeout_is_retried_as_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(400)))
        .expect(2)
        .mount(&server)
        .await;

    let clock = TestClock::new();
    let config = ClientConfig {
        timeout: Duration::from_millis(100),
        max_retries: 1,
        ..test_config(format!("{}/webhook", server.uri()))
    };
    let client =
        DeliveryClient::with_clock(config, Arc::new(clock.clone())).expect("failed to create");

    let result = client.send(OutboundPayload::text("slow endpoint")).await;

    match result {
        Err(DeliveryError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, DeliveryError::Timeout { .. }));
        },
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    assert_eq!(clock.sleeps(), vec![BASE_BACKOFF]);
}

#[tokio::test]
async fn unexpected_status_fails_immediately() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;

    let (client, clock) = test_client(&server);
    let result = client.send(OutboundPayload::text("odd status")).await;

    assert!(matches!(result, Err(DeliveryError::UnexpectedStatus { status: 304 })));
    assert!(clock.sleeps().is_empty());
}
