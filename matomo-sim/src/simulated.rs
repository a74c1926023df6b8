//! Simulated tracking client for deterministic testing

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use matomo_core::tracker::{MatomoTracker, SiteId, TrackRequest, TrackerError, TrackingClient};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use url::Url;

/// Configuration for simulated delivery.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Simulate transport failures with this probability (0.0 to 1.0)
    pub failure_rate: f64,
    /// Seed for reproducible failure sequences
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.0,
            seed: 42,
        }
    }
}

/// Tracking client that records hit URLs instead of sending them.
///
/// Hit URLs are built by a real [`MatomoTracker`], so validation, parameter
/// injection and encoding match production exactly.
pub struct SimulatedTrackingClient {
    tracker: MatomoTracker,
    config: SimulationConfig,
    rng: Mutex<ChaCha8Rng>,
    hits: Mutex<Vec<Url>>,
    failure_count: AtomicU32,
}

impl SimulatedTrackingClient {
    /// Wraps a tracker with default simulation settings.
    pub fn new(tracker: MatomoTracker) -> Self {
        Self::with_config(tracker, SimulationConfig::default())
    }

    pub fn with_config(tracker: MatomoTracker, config: SimulationConfig) -> Self {
        Self {
            tracker,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(config.seed)),
            config,
            hits: Mutex::new(Vec::new()),
            failure_count: AtomicU32::new(0),
        }
    }

    /// Makes every following hit fail.
    pub fn simulate_failure(&mut self) {
        self.config.failure_rate = 1.0;
    }

    /// Resets to normal delivery after a simulated failure.
    pub fn reset_to_normal(&mut self) {
        self.config.failure_rate = 0.0;
    }

    /// Returns URLs of all successfully delivered hits.
    pub fn hits(&self) -> Vec<Url> {
        self.hits.lock().clone()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.lock().len()
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Relaxed)
    }

    fn should_fail(&self) -> bool {
        let rate = if self.config.failure_rate.is_nan() {
            0.0
        } else {
            self.config.failure_rate.clamp(0.0, 1.0)
        };
        self.rng.lock().random_bool(rate)
    }
}

#[async_trait]
impl TrackingClient for SimulatedTrackingClient {
    async fn track(&self, request: TrackRequest) -> Result<(), TrackerError> {
        let hit_url = self.tracker.build_request_url(request)?;

        if self.should_fail() {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Simulated delivery failure for {}", self.tracker.tracker_url());
            return Err(TrackerError::RequestFailed {
                url: self.tracker.tracker_url().to_string(),
                reason: "simulated failure".to_string(),
            });
        }

        self.hits.lock().push(hit_url);
        Ok(())
    }

    fn tracker_url(&self) -> &Url {
        self.tracker.tracker_url()
    }

    fn site_id(&self) -> &SiteId {
        self.tracker.site_id()
    }
}
