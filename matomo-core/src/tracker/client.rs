//! HTTP tracker client with construction validation and hit dispatch

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use url::Url;

use super::TrackerError;
use super::endpoint::TrackerUrl;
use super::params::{ParamValue, TrackingParams, names};
use super::types::{ErrorObserver, SiteId, TrackRequest, TrackingClient};
use crate::MatomoError;
use crate::config::{MatomoConfig, NetworkConfig};

/// HTTP client bound to one site on one Matomo deployment.
///
/// Cheap to clone: clones share the underlying connection pool and error
/// observer. Every hit works on its own copy of the base URL, so concurrent
/// calls never see each other's parameters.
#[derive(Clone)]
pub struct MatomoTracker {
    site_id: SiteId,
    tracker_url: Url,
    client: reqwest::Client,
    error_observer: Option<ErrorObserver>,
}

/// Builder for [`MatomoTracker`].
pub struct MatomoTrackerBuilder {
    site_id: SiteId,
    tracker_url: TrackerUrl,
    require_standard_endpoint_name: bool,
    network: NetworkConfig,
    http_client: Option<reqwest::Client>,
    error_observer: Option<ErrorObserver>,
}

impl MatomoTrackerBuilder {
    fn new(site_id: SiteId, tracker_url: TrackerUrl) -> Self {
        Self {
            site_id,
            tracker_url,
            require_standard_endpoint_name: true,
            network: NetworkConfig::default(),
            http_client: None,
            error_observer: None,
        }
    }

    /// Controls whether the URL path must end in `matomo.php` or `piwik.php`.
    ///
    /// Disable for deployments that renamed the tracking endpoint.
    pub fn require_standard_endpoint_name(mut self, require: bool) -> Self {
        self.require_standard_endpoint_name = require;
        self
    }

    pub fn network_config(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    /// Uses a preconfigured HTTP client instead of building one from the network config.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Registers a callback receiving transport failures.
    pub fn on_error<F>(mut self, observer: F) -> Self
    where
        F: Fn(&TrackerError) + Send + Sync + 'static,
    {
        self.error_observer = Some(Arc::new(observer));
        self
    }

    /// Validates the configuration and builds the tracker.
    ///
    /// Checks run in order: site id, tracker URL, endpoint name.
    ///
    /// # Errors
    /// - `TrackerError::InvalidSiteId` - Zero or empty site id
    /// - `TrackerError::InvalidTrackerUrl` - Empty, unparseable or relative URL
    /// - `TrackerError::UnrecognizedEndpointName` - Non-standard endpoint path
    /// - `TrackerError::ClientBuild` - HTTP client could not be created
    pub fn build(self) -> Result<MatomoTracker, TrackerError> {
        if !self.site_id.is_valid() {
            return Err(TrackerError::InvalidSiteId);
        }

        let tracker_url = self
            .tracker_url
            .into_validated(self.require_standard_endpoint_name)?;

        let client = match self.http_client {
            Some(client) => client,
            None => build_http_client(&self.network)?,
        };

        tracing::debug!(
            "Created Matomo tracker for site {} at {}",
            self.site_id,
            tracker_url
        );

        Ok(MatomoTracker {
            site_id: self.site_id,
            tracker_url,
            client,
            error_observer: self.error_observer,
        })
    }
}

fn build_http_client(config: &NetworkConfig) -> Result<reqwest::Client, TrackerError> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()
        .map_err(|e| TrackerError::ClientBuild {
            reason: e.to_string(),
        })
}

impl MatomoTracker {
    /// Creates a tracker requiring a standard endpoint name and default network settings.
    ///
    /// # Errors
    /// See [`MatomoTrackerBuilder::build`].
    pub fn new(
        site_id: impl Into<SiteId>,
        tracker_url: impl Into<TrackerUrl>,
    ) -> Result<Self, TrackerError> {
        Self::builder(site_id, tracker_url).build()
    }

    pub fn builder(
        site_id: impl Into<SiteId>,
        tracker_url: impl Into<TrackerUrl>,
    ) -> MatomoTrackerBuilder {
        MatomoTrackerBuilder::new(site_id.into(), tracker_url.into())
    }

    /// Creates a tracker from the site and network sections of the configuration.
    ///
    /// # Errors
    /// - `MatomoError::Configuration` - Site id or tracker URL not configured
    /// - `MatomoError::Tracker` - Configured values failed validation
    pub fn from_config(config: &MatomoConfig) -> Result<Self, MatomoError> {
        let site_id = config
            .site
            .site_id
            .clone()
            .ok_or_else(|| MatomoError::Configuration {
                reason: "site id is not set".to_string(),
            })?;
        let tracker_url =
            config
                .site
                .tracker_url
                .clone()
                .ok_or_else(|| MatomoError::Configuration {
                    reason: "tracker URL is not set".to_string(),
                })?;

        let tracker = Self::builder(site_id, tracker_url)
            .require_standard_endpoint_name(config.site.require_standard_endpoint_name)
            .network_config(config.network.clone())
            .build()?;
        Ok(tracker)
    }

    pub fn site_id(&self) -> &SiteId {
        &self.site_id
    }

    /// Returns the base tracker URL, without any per-hit query.
    pub fn tracker_url(&self) -> &Url {
        &self.tracker_url
    }

    /// Records a tracking hit and waits for the HTTP layer to resolve it.
    ///
    /// Response status and body are not inspected.
    ///
    /// # Errors
    /// - `TrackerError::MissingTrackedUrl` - No truthy `url`, nothing was sent
    /// - `TrackerError::RequestTimeout` - Transport timed out
    /// - `TrackerError::RequestFailed` - Transport failure
    pub async fn track(&self, request: impl Into<TrackRequest>) -> Result<(), TrackerError> {
        let hit_url = self.build_request_url(request)?;
        self.send_hit(hit_url).await
    }

    /// Records a page view of `url`.
    ///
    /// # Errors
    /// See [`MatomoTracker::track`].
    pub async fn track_url(&self, url: impl Into<String>) -> Result<(), TrackerError> {
        self.track(TrackRequest::Url(url.into())).await
    }

    /// Records a hit described by tracking API parameters, which must include `url`.
    ///
    /// # Errors
    /// See [`MatomoTracker::track`].
    pub async fn track_event(&self, params: TrackingParams) -> Result<(), TrackerError> {
        self.track(TrackRequest::Params(params)).await
    }

    /// Validates the request and dispatches it on the current tokio runtime.
    ///
    /// Validation failures are returned immediately. Transport failures are
    /// delivered to the error observer and to the returned handle, which may
    /// be dropped. Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// - `TrackerError::MissingTrackedUrl` - No truthy `url`, nothing was spawned
    pub fn spawn_track(
        &self,
        request: impl Into<TrackRequest>,
    ) -> Result<JoinHandle<Result<(), TrackerError>>, TrackerError> {
        let hit_url = self.build_request_url(request)?;
        let tracker = self.clone();
        Ok(tokio::spawn(async move { tracker.send_hit(hit_url).await }))
    }

    /// Builds the full hit URL without sending it.
    ///
    /// Injects `idsite` and `rec=1`, overriding caller values, then replaces
    /// the query of a copy of the base URL with the form-encoded parameters.
    ///
    /// # Errors
    /// - `TrackerError::MissingTrackedUrl` - No truthy `url` after normalization
    pub fn build_request_url(&self, request: impl Into<TrackRequest>) -> Result<Url, TrackerError> {
        let params = self.prepare_params(request.into())?;

        let mut hit_url = self.tracker_url.clone();
        hit_url.set_query(Some(&params.to_query_string()));

        Ok(hit_url)
    }

    fn prepare_params(&self, request: TrackRequest) -> Result<TrackingParams, TrackerError> {
        let mut params = request.into_params();
        params.insert(names::IDSITE, ParamValue::from(&self.site_id));
        params.insert(names::REC, 1);

        match params.get(names::URL) {
            Some(url) if url.is_truthy() => Ok(params),
            _ => Err(TrackerError::MissingTrackedUrl),
        }
    }

    async fn send_hit(&self, hit_url: Url) -> Result<(), TrackerError> {
        tracing::debug!(
            "Sending tracking hit for site {} to {}",
            self.site_id,
            self.tracker_url
        );

        match self.client.get(hit_url).send().await {
            Ok(response) => {
                tracing::debug!(
                    "Tracker {} answered with status {}",
                    self.tracker_url,
                    response.status()
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Tracking request to {} failed: {}", self.tracker_url, e);

                let error = if e.is_timeout() {
                    TrackerError::RequestTimeout {
                        url: self.tracker_url.to_string(),
                    }
                } else {
                    TrackerError::RequestFailed {
                        url: self.tracker_url.to_string(),
                        reason: e.to_string(),
                    }
                };

                if let Some(observer) = &self.error_observer {
                    observer(&error);
                }
                Err(error)
            }
        }
    }
}

impl fmt::Debug for MatomoTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatomoTracker")
            .field("site_id", &self.site_id)
            .field("tracker_url", &self.tracker_url.as_str())
            .field("has_error_observer", &self.error_observer.is_some())
            .finish()
    }
}

#[async_trait]
impl TrackingClient for MatomoTracker {
    async fn track(&self, request: TrackRequest) -> Result<(), TrackerError> {
        let hit_url = self.build_request_url(request)?;
        self.send_hit(hit_url).await
    }

    fn tracker_url(&self) -> &Url {
        &self.tracker_url
    }

    fn site_id(&self) -> &SiteId {
        &self.site_id
    }
}
