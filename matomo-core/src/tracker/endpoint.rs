//! Tracker endpoint URL parsing and validation

use url::Url;

use super::TrackerError;

/// Tracking endpoint protocol constants
pub mod constants {
    /// File names a standard Matomo deployment serves the tracking API under
    pub const STANDARD_ENDPOINT_NAMES: [&str; 2] = ["matomo.php", "piwik.php"];
}

/// Tracker base URL as handed to the client, raw or already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerUrl {
    Raw(String),
    Parsed(Url),
}

impl TrackerUrl {
    /// Parses and validates the URL.
    ///
    /// # Errors
    /// - `TrackerError::InvalidTrackerUrl` - Empty, unparseable or relative URL
    /// - `TrackerError::UnrecognizedEndpointName` - Path does not end in a standard
    ///   endpoint name while `require_standard_endpoint_name` is set
    pub fn into_validated(self, require_standard_endpoint_name: bool) -> Result<Url, TrackerError> {
        let url = match self {
            TrackerUrl::Raw(raw) => parse_tracker_url(&raw)?,
            TrackerUrl::Parsed(url) => url,
        };

        if require_standard_endpoint_name && !has_standard_endpoint_name(&url) {
            return Err(TrackerError::UnrecognizedEndpointName {
                path: url.path().to_string(),
            });
        }

        Ok(url)
    }
}

impl From<&str> for TrackerUrl {
    fn from(raw: &str) -> Self {
        TrackerUrl::Raw(raw.to_string())
    }
}

impl From<String> for TrackerUrl {
    fn from(raw: String) -> Self {
        TrackerUrl::Raw(raw)
    }
}

impl From<Url> for TrackerUrl {
    fn from(url: Url) -> Self {
        TrackerUrl::Parsed(url)
    }
}

/// Checks whether the URL path ends in `matomo.php` or `piwik.php`.
pub fn has_standard_endpoint_name(url: &Url) -> bool {
    let path = url.path();
    constants::STANDARD_ENDPOINT_NAMES
        .iter()
        .any(|name| path.ends_with(name))
}

fn parse_tracker_url(raw: &str) -> Result<Url, TrackerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::InvalidTrackerUrl {
            url: raw.to_string(),
            reason: "tracker URL is empty".to_string(),
        });
    }

    Url::parse(trimmed).map_err(|e| TrackerError::InvalidTrackerUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod endpoint_tests {
    use super::*;

    #[test]
    fn test_standard_endpoint_names_accepted() {
        for raw in [
            "http://stats.example.com/matomo.php",
            "https://stats.example.com/analytics/piwik.php",
            "https://stats.example.com/matomo.php?existing=query",
        ] {
            let url = TrackerUrl::from(raw).into_validated(true).unwrap();
            assert!(has_standard_endpoint_name(&url), "{raw}");
        }
    }

    #[test]
    fn test_nonstandard_endpoint_rejected_when_required() {
        let result = TrackerUrl::from("http://x/tracker.php").into_validated(true);
        assert!(matches!(
            result,
            Err(TrackerError::UnrecognizedEndpointName { path }) if path == "/tracker.php"
        ));

        let url = TrackerUrl::from("http://x/tracker.php")
            .into_validated(false)
            .unwrap();
        assert_eq!(url.path(), "/tracker.php");
    }

    #[test]
    fn test_query_does_not_satisfy_endpoint_check() {
        let result = TrackerUrl::from("http://x/track?file=matomo.php").into_validated(true);
        assert!(matches!(
            result,
            Err(TrackerError::UnrecognizedEndpointName { .. })
        ));
    }

    #[test]
    fn test_invalid_urls_rejected() {
        for raw in ["", "   ", "not a url", "/matomo.php", "matomo.php"] {
            let result = TrackerUrl::from(raw).into_validated(false);
            assert!(
                matches!(result, Err(TrackerError::InvalidTrackerUrl { .. })),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn test_any_absolute_url_scheme_accepted() {
        let url = TrackerUrl::from("ftp://files.example.com/matomo.php")
            .into_validated(true)
            .unwrap();
        assert_eq!(url.scheme(), "ftp");

        let url = TrackerUrl::from("mailto:stats@example.com")
            .into_validated(false)
            .unwrap();
        assert_eq!(url.scheme(), "mailto");
    }

    #[test]
    fn test_parsed_url_accepted_as_is() {
        let parsed = Url::parse("https://stats.example.com/matomo.php").unwrap();
        let url = TrackerUrl::from(parsed.clone()).into_validated(true).unwrap();
        assert_eq!(url, parsed);
    }
}
