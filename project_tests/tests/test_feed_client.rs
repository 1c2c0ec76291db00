use std::time::Duration;

use lib_spectrum::{FeedConfig, FeedError, FeedEvent, FeedState, ReconnectPolicy, SpectrumFeed};
use project_tests::{MockBackend, MockOptions, state_frame};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn next(sub: &mut lib_spectrum::FeedSubscription) -> Option<FeedEvent> {
    timeout(WAIT, sub.next_event()).await.expect("timed out waiting for a feed event")
}

#[tokio::test]
async fn test_snapshots_replace_latest_and_clear_errors() {
    let backend = MockBackend::start(MockOptions {
        frames: vec![
            state_frame(10.0, "Liftoff", false),
            "{ not json".to_string(),
            state_frame(20.0, "Ascent nominal", true),
        ],
        ..Default::default()
    })
    .await
    .unwrap();

    let mut sub = SpectrumFeed::subscribe(FeedConfig::new(&backend.ws_base)).unwrap();

    assert!(matches!(next(&mut sub).await, Some(FeedEvent::State(s)) if s.status_message == "Liftoff"));

    assert!(matches!(next(&mut sub).await, Some(FeedEvent::Error(FeedError::Parse(_)))));
    assert!(matches!(sub.last_error(), Some(FeedError::Parse(_))));
    // A parse error leaves the previous snapshot in place.
    assert_eq!(sub.latest().map(|s| s.velocity), Some(10.0));
    assert_eq!(sub.state(), FeedState::Streaming);

    match next(&mut sub).await {
        Some(FeedEvent::State(state)) => {
            assert_eq!(state.velocity, 20.0);
            assert!(state.is_action_required);
        }
        other => panic!("expected a snapshot, got {other:?}"),
    }
    assert!(sub.last_error().is_none());
    assert_eq!(sub.latest().map(|s| s.status_message), Some("Ascent nominal".to_string()));

    sub.shutdown().await;
}

#[tokio::test]
async fn test_latest_keeps_up_when_events_are_not_drained() {
    let frames: Vec<String> = (0..200).map(|i| state_frame(i as f64, "Ascent", false)).collect();
    let backend = MockBackend::start(MockOptions {
        frames,
        ..Default::default()
    })
    .await
    .unwrap();

    let mut config = FeedConfig::new(&backend.ws_base);
    config.channel_capacity = 8;
    let mut sub = SpectrumFeed::subscribe(config).unwrap();

    timeout(WAIT, async {
        while sub.latest().map(|s| s.velocity) != Some(199.0) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("latest snapshot stopped following the feed");

    assert_eq!(sub.state(), FeedState::Streaming);
    assert_eq!(sub.dropped_events(), 192);

    // The buffered events are the oldest ones.
    for expected in 0..8 {
        assert!(matches!(next(&mut sub).await, Some(FeedEvent::State(s)) if s.velocity == expected as f64));
    }

    sub.shutdown().await;
}

#[tokio::test]
async fn test_wrong_shape_is_a_parse_error() {
    let camel = r#"{"velocity":1,"altitude":2,"temperature":3,"statusMessage":"x","isAscending":true,"isActionRequired":false}"#;
    let missing = r#"{"Velocity":1,"Altitude":2,"Temperature":3,"StatusMessage":"x","IsAscending":true}"#;
    let extra = r#"{"Velocity":1,"Altitude":2,"Temperature":3,"StatusMessage":"x","IsAscending":true,"IsActionRequired":false,"Stage":2}"#;

    let backend = MockBackend::start(MockOptions {
        frames: vec![camel.to_string(), missing.to_string(), extra.to_string()],
        ..Default::default()
    })
    .await
    .unwrap();

    let mut sub = SpectrumFeed::subscribe(FeedConfig::new(&backend.ws_base)).unwrap();
    assert!(matches!(next(&mut sub).await, Some(FeedEvent::Error(FeedError::Parse(_)))));
    assert!(matches!(next(&mut sub).await, Some(FeedEvent::Error(FeedError::Parse(_)))));
    assert!(matches!(next(&mut sub).await, Some(FeedEvent::State(_))));
    sub.cancel();
}

#[tokio::test]
async fn test_remote_close_is_a_terminal_connection_error() {
    let backend = MockBackend::start(MockOptions {
        frames: vec![state_frame(5.0, "Nominal", false)],
        close_after_frames: true,
        ..Default::default()
    })
    .await
    .unwrap();

    let mut sub = SpectrumFeed::subscribe(FeedConfig::new(&backend.ws_base)).unwrap();
    assert!(matches!(next(&mut sub).await, Some(FeedEvent::State(_))));
    assert!(matches!(next(&mut sub).await, Some(FeedEvent::Error(FeedError::Connection(_)))));
    assert_eq!(next(&mut sub).await, None);

    assert_eq!(sub.state(), FeedState::Errored);
    assert!(matches!(sub.last_error(), Some(FeedError::Connection(_))));
    // The last good snapshot survives the failure.
    assert_eq!(sub.latest().map(|s| s.velocity), Some(5.0));
    assert_eq!(backend.ws_connections(), 1);
}

#[tokio::test]
async fn test_cancel_is_idempotent_and_closes_the_feed() {
    let backend = MockBackend::start(MockOptions {
        frames: vec![state_frame(1.0, "Nominal", false)],
        ..Default::default()
    })
    .await
    .unwrap();

    let mut sub = SpectrumFeed::subscribe(FeedConfig::new(&backend.ws_base)).unwrap();
    let mut states = sub.watch_state();
    assert!(matches!(next(&mut sub).await, Some(FeedEvent::State(_))));

    sub.cancel();
    sub.cancel();
    assert!(sub.is_cancelled());

    timeout(WAIT, states.wait_for(|s| *s == FeedState::Closed))
        .await
        .expect("feed did not close")
        .unwrap();
    assert_eq!(next(&mut sub).await, None);
    sub.cancel();
}

#[tokio::test]
async fn test_backoff_policy_reconnects_after_close() {
    let backend = MockBackend::start(MockOptions {
        frames: vec![state_frame(7.0, "Nominal", false)],
        close_after_frames: true,
        ..Default::default()
    })
    .await
    .unwrap();

    let config = FeedConfig::new(&backend.ws_base).with_reconnect(ReconnectPolicy::ExponentialBackoff {
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        max_retries: 5,
        jitter: true,
    });
    let mut sub = SpectrumFeed::subscribe(config).unwrap();

    assert!(matches!(next(&mut sub).await, Some(FeedEvent::State(_))));
    assert!(matches!(next(&mut sub).await, Some(FeedEvent::Error(FeedError::Connection(_)))));
    // Second connection replays the frame.
    assert!(matches!(next(&mut sub).await, Some(FeedEvent::State(_))));
    assert!(backend.ws_connections() >= 2);

    sub.shutdown().await;
}

#[tokio::test]
async fn test_retries_are_bounded() {
    // Nothing listens on this port.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = FeedConfig::new(format!("ws://127.0.0.1:{port}")).with_reconnect(ReconnectPolicy::ExponentialBackoff {
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        max_retries: 2,
        jitter: false,
    });
    let mut sub = SpectrumFeed::subscribe(config).unwrap();

    let mut failures = 0;
    while let Some(event) = next(&mut sub).await {
        assert!(matches!(event, FeedEvent::Error(FeedError::Connection(_))));
        failures += 1;
    }
    // First attempt plus two retries.
    assert_eq!(failures, 3);
    assert_eq!(sub.state(), FeedState::Errored);
}

#[test]
fn test_invalid_base_url_is_rejected_up_front() {
    let err = FeedConfig::new("not a url").feed_url().unwrap_err();
    assert!(matches!(err, FeedError::InvalidUrl { .. }));
}
