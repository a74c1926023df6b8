//! Wire format of single tracking hits
//!
//! Verifies the query a Matomo endpoint receives for page URLs, parameter
//! mappings, overridden mandatory fields, and rejected calls.

use std::sync::Arc;
use std::time::Duration;

use matomo_core::config::MatomoConfig;
use matomo_core::{MatomoTracker, TrackRequest, TrackerError, TrackingClient, TrackingParams};
use matomo_sim::{EndpointConfig, MockTrackingEndpoint};

async fn endpoint_and_tracker(site_id: u64) -> (MockTrackingEndpoint, MatomoTracker) {
    let endpoint = MockTrackingEndpoint::start().await.unwrap();
    let tracker = MatomoTracker::builder(site_id, endpoint.tracker_url())
        .network_config(MatomoConfig::for_testing().network)
        .build()
        .unwrap();
    (endpoint, tracker)
}

#[tokio::test]
async fn test_page_url_hit_wire_format() {
    let (endpoint, tracker) = endpoint_and_tracker(1).await;

    tracker.track("http://example.com/page").await.unwrap();

    let hits = endpoint.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].raw_query,
        "idsite=1&rec=1&url=http%3A%2F%2Fexample.com%2Fpage"
    );
}

#[tokio::test]
async fn test_extra_params_pass_through() {
    let (endpoint, tracker) = endpoint_and_tracker(1).await;
    let params = TrackingParams::new()
        .url("http://example.com/page")
        .action_name("Home");

    tracker.track_event(params).await.unwrap();

    let hits = endpoint.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].param("action_name"), Some("Home"));
    assert_eq!(hits[0].param("idsite"), Some("1"));
    assert_eq!(hits[0].param("rec"), Some("1"));
    assert_eq!(hits[0].param("url"), Some("http://example.com/page"));
}

#[tokio::test]
async fn test_caller_idsite_is_overridden() {
    let (endpoint, tracker) = endpoint_and_tracker(1).await;
    let params = TrackingParams::new()
        .with("idsite", 999)
        .url("http://example.com/page");

    tracker.track(params).await.unwrap();

    let hits = endpoint.hits();
    assert_eq!(hits.len(), 1);
    let idsite_values: Vec<_> = hits[0]
        .params
        .iter()
        .filter(|(key, _)| key == "idsite")
        .collect();
    assert_eq!(idsite_values.len(), 1);
    assert_eq!(hits[0].param("idsite"), Some("1"));
}

#[tokio::test]
async fn test_missing_url_sends_nothing() {
    let (endpoint, tracker) = endpoint_and_tracker(1).await;

    let result = tracker.track(TrackingParams::new()).await;
    assert!(matches!(result, Err(TrackerError::MissingTrackedUrl)));

    let result = tracker.track(None::<TrackingParams>).await;
    assert!(matches!(result, Err(TrackerError::MissingTrackedUrl)));

    assert!(!endpoint.wait_for_hits(1, Duration::from_millis(50)).await);
    assert_eq!(endpoint.hit_count(), 0);

    tracker.track_url("http://example.com/after").await.unwrap();
    assert_eq!(endpoint.hit_count(), 1);
}

#[tokio::test]
async fn test_renamed_endpoint_with_check_disabled() {
    let endpoint = MockTrackingEndpoint::start_with_config(EndpointConfig {
        path: "/collect/hit.php".to_string(),
        ..Default::default()
    })
    .await
    .unwrap();

    let result = MatomoTracker::new(4, endpoint.tracker_url());
    assert!(matches!(
        result,
        Err(TrackerError::UnrecognizedEndpointName { .. })
    ));

    let tracker = MatomoTracker::builder(4, endpoint.tracker_url())
        .require_standard_endpoint_name(false)
        .build()
        .unwrap();
    tracker.track("http://example.com/").await.unwrap();

    assert_eq!(endpoint.hits()[0].param("idsite"), Some("4"));
}

#[tokio::test]
async fn test_configured_user_agent_is_sent() {
    let (endpoint, tracker) = endpoint_and_tracker(1).await;

    tracker.track("http://example.com/").await.unwrap();

    assert_eq!(
        endpoint.hits()[0].user_agent.as_deref(),
        Some("matomo-tracker/test")
    );
}

#[tokio::test]
async fn test_detached_tracker_resolves_binding() {
    let (endpoint, tracker) = endpoint_and_tracker(8).await;

    let track = {
        let tracker = tracker.clone();
        move |url: &'static str| {
            let tracker = tracker.clone();
            async move { tracker.track(url).await }
        }
    };
    drop(tracker);

    tokio::spawn(track("http://example.com/detached"))
        .await
        .unwrap()
        .unwrap();

    let hits = endpoint.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].param("idsite"), Some("8"));
    assert_eq!(hits[0].param("url"), Some("http://example.com/detached"));
}

#[tokio::test]
async fn test_trait_object_client() {
    let (endpoint, tracker) = endpoint_and_tracker(3).await;
    let client: Arc<dyn TrackingClient> = Arc::new(tracker);

    client
        .track(TrackRequest::from("http://example.com/dyn"))
        .await
        .unwrap();

    assert_eq!(client.tracker_url().as_str(), endpoint.tracker_url());
    assert_eq!(endpoint.hits()[0].param("idsite"), Some("3"));
}
