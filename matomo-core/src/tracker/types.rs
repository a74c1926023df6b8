//! Core types for Matomo tracking communication

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::TrackerError;
use super::params::{ParamValue, TrackingParams, names};

/// Callback receiving transport failures of tracking hits.
pub type ErrorObserver = Arc<dyn Fn(&TrackerError) + Send + Sync>;

/// Identifier of the Matomo site a tracker is bound to.
///
/// Sent as `idsite` on every hit. Matomo accepts both numeric ids and
/// string ids, so both are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SiteId {
    Numeric(u64),
    /// Negative numeric id
    Signed(i64),
    Text(String),
}

impl SiteId {
    /// Returns true for non-zero numeric ids and non-empty text ids.
    pub fn is_valid(&self) -> bool {
        match self {
            SiteId::Numeric(id) => *id != 0,
            SiteId::Signed(id) => *id != 0,
            SiteId::Text(id) => !id.is_empty(),
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteId::Numeric(id) => write!(f, "{id}"),
            SiteId::Signed(id) => write!(f, "{id}"),
            SiteId::Text(id) => f.write_str(id),
        }
    }
}

impl From<u64> for SiteId {
    fn from(id: u64) -> Self {
        SiteId::Numeric(id)
    }
}

/// Non-negative ids normalize to [`SiteId::Numeric`].
impl From<i64> for SiteId {
    fn from(id: i64) -> Self {
        u64::try_from(id).map_or(SiteId::Signed(id), SiteId::Numeric)
    }
}

impl From<i32> for SiteId {
    fn from(id: i32) -> Self {
        SiteId::from(i64::from(id))
    }
}

impl From<&str> for SiteId {
    fn from(id: &str) -> Self {
        SiteId::Text(id.to_string())
    }
}

impl From<String> for SiteId {
    fn from(id: String) -> Self {
        SiteId::Text(id)
    }
}

impl From<&SiteId> for ParamValue {
    fn from(site_id: &SiteId) -> Self {
        match site_id {
            SiteId::Numeric(id) => ParamValue::from(*id),
            SiteId::Signed(id) => ParamValue::Integer(*id),
            SiteId::Text(id) => ParamValue::Text(id.clone()),
        }
    }
}

/// Input of a single tracking call.
///
/// Either the bare page URL to record, or a full parameter mapping that
/// must itself carry a `url` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackRequest {
    /// Page URL to record as a plain page view
    Url(String),
    /// Tracking API parameters passed through verbatim
    Params(TrackingParams),
}

impl TrackRequest {
    /// Normalizes the request into a parameter mapping.
    pub fn into_params(self) -> TrackingParams {
        match self {
            TrackRequest::Url(url) => {
                let mut params = TrackingParams::new();
                params.insert(names::URL, url);
                params
            }
            TrackRequest::Params(params) => params,
        }
    }
}

impl From<&str> for TrackRequest {
    fn from(url: &str) -> Self {
        TrackRequest::Url(url.to_string())
    }
}

impl From<String> for TrackRequest {
    fn from(url: String) -> Self {
        TrackRequest::Url(url)
    }
}

impl From<TrackingParams> for TrackRequest {
    fn from(params: TrackingParams) -> Self {
        TrackRequest::Params(params)
    }
}

impl From<Option<TrackingParams>> for TrackRequest {
    fn from(params: Option<TrackingParams>) -> Self {
        TrackRequest::Params(params.unwrap_or_default())
    }
}

/// Abstract interface for recording Matomo tracking hits.
///
/// Implemented by the HTTP client and by simulated clients used in tests,
/// so callers can hold a `dyn TrackingClient` without caring how hits
/// are delivered.
#[async_trait]
pub trait TrackingClient: Send + Sync {
    /// Records one tracking hit.
    ///
    /// # Errors
    ///
    /// - `TrackerError::MissingTrackedUrl` - Request has no truthy `url`
    /// - `TrackerError::RequestFailed` - Transport failure while sending
    /// - `TrackerError::RequestTimeout` - Transport timed out
    async fn track(&self, request: TrackRequest) -> Result<(), TrackerError>;

    /// Returns the base tracker URL for debugging and logging purposes.
    fn tracker_url(&self) -> &Url;

    /// Returns the site id injected into every hit.
    fn site_id(&self) -> &SiteId;
}
