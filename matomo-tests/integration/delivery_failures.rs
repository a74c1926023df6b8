//! Transport failures and error observer delivery

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use matomo_core::config::NetworkConfig;
use matomo_core::{MatomoTracker, TrackerError};
use matomo_sim::{EndpointConfig, MockTrackingEndpoint, StatusCode};
use tokio::sync::mpsc;

fn short_timeout(timeout: Duration) -> NetworkConfig {
    NetworkConfig {
        request_timeout: timeout,
        ..Default::default()
    }
}

/// Bound then released port, so connections are refused.
async fn unreachable_tracker_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/matomo.php")
}

#[tokio::test]
async fn test_timeout_reported_to_caller_and_observer() {
    let endpoint = MockTrackingEndpoint::start_with_config(EndpointConfig {
        response_delay: Duration::from_secs(2),
        ..Default::default()
    })
    .await
    .unwrap();

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let tracker = MatomoTracker::builder(1, endpoint.tracker_url())
        .network_config(short_timeout(Duration::from_millis(100)))
        .on_error(move |error| {
            let _ = sender.send(error.clone());
        })
        .build()
        .unwrap();

    let result = tracker.track("http://example.com/slow").await;
    assert!(matches!(result, Err(TrackerError::RequestTimeout { .. })));

    let observed = receiver.recv().await.unwrap();
    assert_eq!(observed, result.unwrap_err());
    assert_eq!(endpoint.hit_count(), 1);
}

#[tokio::test]
async fn test_spawned_failure_only_reaches_observer() {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let tracker = MatomoTracker::builder(1, unreachable_tracker_url().await)
        .network_config(short_timeout(Duration::from_secs(2)))
        .on_error(move |error| {
            let _ = sender.send(error.clone());
        })
        .build()
        .unwrap();

    // Handle dropped: fire and forget
    drop(tracker.spawn_track("http://example.com/lost").unwrap());

    let observed = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(observed.is_transport());
    assert!(matches!(
        observed,
        TrackerError::RequestFailed { url, .. } if url.ends_with("/matomo.php")
    ));
}

#[tokio::test]
async fn test_failure_without_observer_is_returned() {
    let tracker = MatomoTracker::builder(1, unreachable_tracker_url().await)
        .network_config(short_timeout(Duration::from_secs(2)))
        .build()
        .unwrap();

    let result = tracker.track("http://example.com/").await;
    assert!(result.unwrap_err().is_transport());
}

#[tokio::test]
async fn test_error_status_is_not_inspected() {
    let endpoint = MockTrackingEndpoint::start_with_config(EndpointConfig {
        status: StatusCode::SERVICE_UNAVAILABLE,
        ..Default::default()
    })
    .await
    .unwrap();

    let failures = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&failures);
    let tracker = MatomoTracker::builder(1, endpoint.tracker_url())
        .on_error(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    tracker.track("http://example.com/").await.unwrap();
    assert_eq!(endpoint.hit_count(), 1);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}
