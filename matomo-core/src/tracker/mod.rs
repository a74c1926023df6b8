//! Matomo tracking API client.
//!
//! Records tracking hits by issuing one HTTP GET per hit against a
//! `matomo.php` (or legacy `piwik.php`) endpoint. Handles construction
//! validation, mandatory parameter injection, and query serialization.

pub mod client;
pub mod endpoint;
pub mod params;
pub mod types;

// Re-export public API
pub use client::{MatomoTracker, MatomoTrackerBuilder};
pub use endpoint::TrackerUrl;
pub use params::{ParamValue, TrackingParams};
pub use types::{ErrorObserver, SiteId, TrackRequest, TrackingClient};

/// Errors that can occur while configuring a tracker or recording a hit.
///
/// Construction and call validation failures are returned before any
/// network activity. Transport failures carry the base tracker URL only,
/// never the per-hit query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("Site id must be a non-zero number or a non-empty string")]
    InvalidSiteId,

    #[error("Invalid tracker URL '{url}': {reason}")]
    InvalidTrackerUrl { url: String, reason: String },

    #[error("Tracker URL path '{path}' must end with \"matomo.php\" or \"piwik.php\"")]
    UnrecognizedEndpointName { path: String },

    #[error("URL to be tracked must be specified")]
    MissingTrackedUrl,

    #[error("Failed to build HTTP client: {reason}")]
    ClientBuild { reason: String },

    #[error("Tracking request to {url} timed out")]
    RequestTimeout { url: String },

    #[error("Tracking request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },
}

impl TrackerError {
    /// Returns true for failures raised before any network attempt.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TrackerError::InvalidSiteId
                | TrackerError::InvalidTrackerUrl { .. }
                | TrackerError::UnrecognizedEndpointName { .. }
                | TrackerError::MissingTrackedUrl
        )
    }

    /// Returns true for failures of the HTTP transport.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TrackerError::RequestTimeout { .. } | TrackerError::RequestFailed { .. }
        )
    }
}

#[cfg(test)]
mod tracker_error_tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(TrackerError::InvalidSiteId.is_validation());
        assert!(TrackerError::MissingTrackedUrl.is_validation());
        assert!(!TrackerError::MissingTrackedUrl.is_transport());

        let timeout = TrackerError::RequestTimeout {
            url: "http://example.com/matomo.php".to_string(),
        };
        assert!(timeout.is_transport());
        assert!(!timeout.is_validation());

        let build = TrackerError::ClientBuild {
            reason: "tls backend".to_string(),
        };
        assert!(!build.is_transport());
        assert!(!build.is_validation());
    }

    #[test]
    fn test_error_messages() {
        let error = TrackerError::UnrecognizedEndpointName {
            path: "/tracker.php".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Tracker URL path '/tracker.php' must end with \"matomo.php\" or \"piwik.php\""
        );
        assert_eq!(
            TrackerError::MissingTrackedUrl.to_string(),
            "URL to be tracked must be specified"
        );
    }
}
