use std::time::Duration;

use axum::http::StatusCode;
use lib_spectrum::{ActionOutcome, ActionTrigger, ApiClient};
use project_tests::{MockBackend, MockOptions};

#[tokio::test]
async fn test_required_action_is_sent_once() {
    let backend = MockBackend::start(MockOptions::default()).await.unwrap();
    let trigger = ActionTrigger::for_backend(&backend.http_base).unwrap();

    assert!(trigger.is_enabled(true));
    let outcome = trigger.trigger(true).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Completed { status: 200 });
    assert_eq!(backend.act_hits(), 1);
    assert!(!trigger.is_in_flight());
}

#[tokio::test]
async fn test_not_required_sends_nothing() {
    let backend = MockBackend::start(MockOptions::default()).await.unwrap();
    let trigger = ActionTrigger::for_backend(&backend.http_base).unwrap();

    assert!(!trigger.is_enabled(false));
    assert_eq!(trigger.trigger(false).await.unwrap(), ActionOutcome::NotRequired);
    assert_eq!(backend.act_hits(), 0);
}

#[tokio::test]
async fn test_second_trigger_while_in_flight_is_ignored() {
    let backend = MockBackend::start(MockOptions {
        act_delay: Duration::from_millis(300),
        ..Default::default()
    })
    .await
    .unwrap();
    let trigger = ActionTrigger::for_backend(&backend.http_base).unwrap();

    let first = {
        let trigger = trigger.clone();
        tokio::spawn(async move { trigger.trigger(true).await })
    };

    while !trigger.is_in_flight() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!trigger.is_enabled(true));
    assert_eq!(trigger.trigger(true).await.unwrap(), ActionOutcome::AlreadyInFlight);

    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome, ActionOutcome::Completed { status: 200 });
    assert!(!trigger.is_in_flight());
    assert!(trigger.is_enabled(true));
    assert_eq!(backend.act_hits(), 1);
}

#[tokio::test]
async fn test_rejection_carries_status_and_body() {
    let backend = MockBackend::start(MockOptions {
        act_status: StatusCode::CONFLICT,
        act_body: "no anomaly pending".to_string(),
        ..Default::default()
    })
    .await
    .unwrap();
    let trigger = ActionTrigger::for_backend(&backend.http_base).unwrap();

    let outcome = trigger.trigger(true).await.unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::Rejected {
            status: 409,
            body: Some("no anomaly pending".to_string())
        }
    );
    assert!(!trigger.is_in_flight());
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let backend = MockBackend::start(MockOptions {
        act_status: StatusCode::INTERNAL_SERVER_ERROR,
        ..Default::default()
    })
    .await
    .unwrap();
    let trigger = ActionTrigger::for_backend(&backend.http_base).unwrap();

    let outcome = trigger.trigger(true).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Rejected { status: 500, body: None });
    assert_eq!(backend.act_hits(), 1);
}

#[tokio::test]
async fn test_custom_endpoint() {
    let backend = MockBackend::start(MockOptions::default()).await.unwrap();
    let client = ApiClient::new(&backend.http_base, None).unwrap();
    let trigger = ActionTrigger::new(client, "SpectrumStatus");

    assert_eq!(trigger.endpoint(), "SpectrumStatus");
    assert_eq!(trigger.trigger(true).await.unwrap(), ActionOutcome::Completed { status: 200 });
    assert_eq!(backend.act_hits(), 0);
}
