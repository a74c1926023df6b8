//! Matomo Core - Client for the Matomo tracking HTTP API
//!
//! This crate provides the building blocks for recording analytics hits
//! against a Matomo deployment: the tracker client, the tracking parameter
//! model, configuration, and tracing setup.

pub mod config;
pub mod tracing_setup;
pub mod tracker;

// Re-export main types for convenient access
pub use config::MatomoConfig;
pub use tracker::{
    MatomoTracker, ParamValue, SiteId, TrackRequest, TrackerError, TrackingClient, TrackingParams,
};

/// Errors that can bubble up from any Matomo client subsystem.
#[derive(Debug, thiserror::Error)]
pub enum MatomoError {
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Invalid tracking parameters: {0}")]
    Params(#[from] serde_json::Error),
}

impl MatomoError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            MatomoError::Tracker(e) => match e {
                TrackerError::InvalidSiteId => "Site id must be a non-zero number or text".to_string(),
                TrackerError::InvalidTrackerUrl { url, .. } => {
                    format!("Invalid tracker URL: {url}")
                }
                TrackerError::UnrecognizedEndpointName { .. } => {
                    "Tracker URL must end with matomo.php or piwik.php".to_string()
                }
                TrackerError::MissingTrackedUrl => "A URL to track is required".to_string(),
                TrackerError::RequestTimeout { url } => format!("Tracker {url} timed out"),
                TrackerError::RequestFailed { url, .. } => {
                    format!("Could not reach tracker: {url}")
                }
                TrackerError::ClientBuild { .. } => "HTTP client setup failed".to_string(),
            },
            MatomoError::Configuration { reason } => format!("Configuration error: {reason}"),
            MatomoError::Params(_) => "Tracking parameters must be a flat JSON object".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        match self {
            MatomoError::Tracker(e) => e.is_validation(),
            MatomoError::Configuration { .. } | MatomoError::Params(_) => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, MatomoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_user_errors() {
        let error = MatomoError::from(TrackerError::MissingTrackedUrl);
        assert!(error.is_user_error());
        assert_eq!(error.user_message(), "A URL to track is required");

        let error = MatomoError::Configuration {
            reason: "missing site id".to_string(),
        };
        assert!(error.is_user_error());
    }

    #[test]
    fn test_transport_errors_are_not_user_errors() {
        let error = MatomoError::from(TrackerError::RequestTimeout {
            url: "http://stats.example.com/matomo.php".to_string(),
        });
        assert!(!error.is_user_error());
        assert_eq!(
            error.user_message(),
            "Tracker http://stats.example.com/matomo.php timed out"
        );
    }
}
