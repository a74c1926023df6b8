//! Centralized configuration for the Matomo tracker client.
//!
//! All tunable parameters are defined here so the CLI and library
//! consumers share the same defaults.

use std::time::Duration;

/// Central configuration for the tracker client.
///
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct MatomoConfig {
    pub site: SiteConfig,
    pub network: NetworkConfig,
}

/// Binding of the client to one site on one Matomo deployment.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Site id sent as `idsite`
    pub site_id: Option<String>,
    /// Absolute URL of the tracking endpoint
    pub tracker_url: Option<String>,
    /// Reject tracker URLs not ending in `matomo.php` or `piwik.php`
    pub require_standard_endpoint_name: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_id: None,
            tracker_url: None,
            require_standard_endpoint_name: true,
        }
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Timeout applied to each tracking request
    pub request_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("matomo-tracker/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 3,
        }
    }
}

impl MatomoConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparseable values are logged and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(site_id) = std::env::var("MATOMO_SITE_ID") {
            config.site.site_id = Some(site_id);
        }

        if let Ok(tracker_url) = std::env::var("MATOMO_TRACKER_URL") {
            config.site.tracker_url = Some(tracker_url);
        }

        if let Ok(skip) = std::env::var("MATOMO_SKIP_ENDPOINT_CHECK") {
            match parse_flag(&skip) {
                Some(enabled) => config.site.require_standard_endpoint_name = !enabled,
                None => {
                    tracing::warn!("Ignoring invalid MATOMO_SKIP_ENDPOINT_CHECK '{}'", skip);
                }
            }
        }

        if let Ok(timeout) = std::env::var("MATOMO_REQUEST_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(seconds) => config.network.request_timeout = Duration::from_secs(seconds),
                Err(_) => {
                    tracing::warn!("Ignoring invalid MATOMO_REQUEST_TIMEOUT '{}'", timeout);
                }
            }
        }

        if let Ok(user_agent) = std::env::var("MATOMO_USER_AGENT") {
            config.network.user_agent = user_agent;
        }

        config
    }

    /// Creates a configuration optimized for testing.
    pub fn for_testing() -> Self {
        Self {
            network: NetworkConfig {
                request_timeout: Duration::from_secs(2),
                user_agent: "matomo-tracker/test".to_string(),
                max_redirects: 0,
            },
            ..Default::default()
        }
    }
}

/// Parses a boolean environment flag, case-insensitively.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = MatomoConfig::default();

        assert!(config.site.site_id.is_none());
        assert!(config.site.tracker_url.is_none());
        assert!(config.site.require_standard_endpoint_name);
        assert_eq!(config.network.request_timeout, Duration::from_secs(30));
        assert_eq!(config.network.max_redirects, 3);
        assert!(config.network.user_agent.starts_with("matomo-tracker/"));
    }

    #[test]
    fn test_testing_preset() {
        let config = MatomoConfig::for_testing();

        assert_eq!(config.network.request_timeout, Duration::from_secs(2));
        assert_eq!(config.network.user_agent, "matomo-tracker/test");
        assert!(config.site.require_standard_endpoint_name);
    }

    #[test]
    fn test_parse_flag() {
        for value in ["1", "true", "TRUE", "Yes", " on "] {
            assert_eq!(parse_flag(value), Some(true), "{value:?}");
        }
        for value in ["0", "false", "No", "off", ""] {
            assert_eq!(parse_flag(value), Some(false), "{value:?}");
        }
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("MATOMO_SITE_ID", "12");
            std::env::set_var("MATOMO_TRACKER_URL", "https://stats.example.com/collect");
            std::env::set_var("MATOMO_SKIP_ENDPOINT_CHECK", "1");
            std::env::set_var("MATOMO_REQUEST_TIMEOUT", "7");
            std::env::set_var("MATOMO_USER_AGENT", "shop-backend/2.1");
        }

        let config = MatomoConfig::from_env();

        assert_eq!(config.site.site_id.as_deref(), Some("12"));
        assert_eq!(
            config.site.tracker_url.as_deref(),
            Some("https://stats.example.com/collect")
        );
        assert!(!config.site.require_standard_endpoint_name);
        assert_eq!(config.network.request_timeout, Duration::from_secs(7));
        assert_eq!(config.network.user_agent, "shop-backend/2.1");

        // Invalid values keep the defaults
        unsafe {
            std::env::set_var("MATOMO_SKIP_ENDPOINT_CHECK", "sometimes");
            std::env::set_var("MATOMO_REQUEST_TIMEOUT", "soon");
        }

        let config = MatomoConfig::from_env();

        assert!(config.site.require_standard_endpoint_name);
        assert_eq!(config.network.request_timeout, Duration::from_secs(30));

        // Cleanup
        unsafe {
            std::env::remove_var("MATOMO_SITE_ID");
            std::env::remove_var("MATOMO_TRACKER_URL");
            std::env::remove_var("MATOMO_SKIP_ENDPOINT_CHECK");
            std::env::remove_var("MATOMO_REQUEST_TIMEOUT");
            std::env::remove_var("MATOMO_USER_AGENT");
        }
    }
}
