//! Concurrent tracking calls against one client

use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;
use matomo_core::{MatomoTracker, TrackingParams};
use matomo_sim::{EndpointConfig, MockTrackingEndpoint};

async fn slow_endpoint() -> MockTrackingEndpoint {
    MockTrackingEndpoint::start_with_config(EndpointConfig {
        response_delay: Duration::from_millis(20),
        ..Default::default()
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_two_concurrent_hits_do_not_mix_params() {
    let endpoint = slow_endpoint().await;
    let tracker = MatomoTracker::new(1, endpoint.tracker_url()).unwrap();

    let first = TrackingParams::new()
        .url("http://example.com/first")
        .action_name("First");
    let second = TrackingParams::new().url("http://example.com/second");

    let (a, b) = tokio::join!(tracker.track(first), tracker.track(second));
    a.unwrap();
    b.unwrap();

    let hits = endpoint.hits();
    assert_eq!(hits.len(), 2);

    let first_hit = hits
        .iter()
        .find(|hit| hit.param("url") == Some("http://example.com/first"))
        .unwrap();
    let second_hit = hits
        .iter()
        .find(|hit| hit.param("url") == Some("http://example.com/second"))
        .unwrap();

    assert_eq!(first_hit.param("action_name"), Some("First"));
    assert_eq!(second_hit.param("action_name"), None);
    assert_eq!(first_hit.params.len(), 4);
    assert_eq!(second_hit.params.len(), 3);
}

#[tokio::test]
async fn test_many_spawned_hits_each_arrive_once() {
    let endpoint = slow_endpoint().await;
    let tracker = MatomoTracker::new(6, endpoint.tracker_url()).unwrap();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            tracker
                .spawn_track(format!("http://example.com/page/{i}"))
                .unwrap()
        })
        .collect();

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    let hits = endpoint.hits();
    assert_eq!(hits.len(), 32);

    let urls: HashSet<_> = hits
        .iter()
        .map(|hit| hit.param("url").unwrap().to_string())
        .collect();
    assert_eq!(urls.len(), 32);
    assert!(hits.iter().all(|hit| hit.param("idsite") == Some("6")));
    assert!(tracker.tracker_url().query().is_none());
}
