//! Mock Matomo tracking endpoint for offline testing
//!
//! Serves `GET /matomo.php` on an ephemeral local port and records the
//! decoded query of every hit, so tests can assert on exactly what a real
//! tracker would have received.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::routing::get;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::SimulationError;

/// Behavior of the mock endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Path the tracking API is served under
    pub path: String,
    /// Status returned for every hit
    pub status: StatusCode,
    /// Delay before answering, for timeout tests
    pub response_delay: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            path: "/matomo.php".to_string(),
            status: StatusCode::NO_CONTENT,
            response_delay: Duration::ZERO,
        }
    }
}

/// One tracking request as received by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedHit {
    /// Decoded query pairs in wire order, duplicates preserved
    pub params: Vec<(String, String)>,
    /// Raw query string as received
    pub raw_query: String,
    pub user_agent: Option<String>,
}

impl RecordedHit {
    /// Returns the first value sent for `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone)]
struct EndpointState {
    hits: Arc<Mutex<Vec<RecordedHit>>>,
    config: EndpointConfig,
}

/// Local HTTP server standing in for a Matomo deployment.
///
/// Shuts down when dropped.
pub struct MockTrackingEndpoint {
    address: SocketAddr,
    config: EndpointConfig,
    hits: Arc<Mutex<Vec<RecordedHit>>>,
    shutdown_sender: Option<oneshot::Sender<()>>,
}

impl MockTrackingEndpoint {
    /// Starts an endpoint with default configuration.
    ///
    /// # Errors
    /// - `SimulationError::BindFailed` - No local port could be bound
    pub async fn start() -> Result<Self, SimulationError> {
        Self::start_with_config(EndpointConfig::default()).await
    }

    /// Starts an endpoint and returns once it accepts connections.
    ///
    /// # Errors
    /// - `SimulationError::BindFailed` - No local port could be bound
    pub async fn start_with_config(config: EndpointConfig) -> Result<Self, SimulationError> {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let state = EndpointState {
            hits: Arc::clone(&hits),
            config: config.clone(),
        };

        let app = Router::new()
            .route(&config.path, get(record_hit))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| SimulationError::BindFailed {
                reason: e.to_string(),
            })?;
        let address = listener
            .local_addr()
            .map_err(|e| SimulationError::BindFailed {
                reason: e.to_string(),
            })?;

        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_receiver.await;
            });
            if let Err(e) = server.await {
                tracing::error!("Mock tracking endpoint error: {}", e);
            }
        });

        tracing::debug!("Mock tracking endpoint listening on {}", address);

        Ok(Self {
            address,
            config,
            hits,
            shutdown_sender: Some(shutdown_sender),
        })
    }

    /// Returns the URL a tracker should be pointed at.
    pub fn tracker_url(&self) -> String {
        format!("http://{}{}", self.address, self.config.path)
    }

    /// Returns a snapshot of all hits received so far.
    pub fn hits(&self) -> Vec<RecordedHit> {
        self.hits.lock().clone()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.lock().len()
    }

    /// Waits until at least `count` hits arrived or `timeout` elapsed.
    ///
    /// Returns whether the count was reached.
    pub async fn wait_for_hits(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.hit_count() < count {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        true
    }
}

impl Drop for MockTrackingEndpoint {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown_sender.take() {
            let _ = sender.send(());
        }
    }
}

async fn record_hit(State(state): State<EndpointState>, uri: Uri, headers: HeaderMap) -> StatusCode {
    let raw_query = uri.query().unwrap_or_default().to_string();
    let params = url::form_urlencoded::parse(raw_query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    tracing::debug!("Mock endpoint received hit: {}", raw_query);
    state.hits.lock().push(RecordedHit {
        params,
        raw_query,
        user_agent,
    });

    if !state.config.response_delay.is_zero() {
        tokio::time::sleep(state.config.response_delay).await;
    }
    state.config.status
}
