//! CLI command implementations

use std::time::Duration;

use clap::{Args, Subcommand};
use matomo_core::config::MatomoConfig;
use matomo_core::{MatomoError, MatomoTracker, Result, TrackingParams};

/// Connection options shared by all commands.
///
/// Each flag overrides the matching `MATOMO_*` environment variable.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Site id sent as `idsite`
    #[arg(long, global = true)]
    pub site_id: Option<String>,

    /// Tracker endpoint, e.g. https://stats.example.com/matomo.php
    #[arg(long, global = true)]
    pub tracker_url: Option<String>,

    /// Accept tracker URLs not ending in matomo.php or piwik.php
    #[arg(long, global = true)]
    pub skip_endpoint_check: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Print the hit URL instead of sending it
    #[arg(long, global = true)]
    pub dry_run: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a page view
    Page {
        /// URL of the viewed page
        url: String,
        /// Page title
        #[arg(short, long)]
        action_name: Option<String>,
        /// Referrer URL
        #[arg(short, long)]
        referrer: Option<String>,
        /// Extra tracking parameter as key=value, repeatable
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Record an event
    Event {
        /// URL the event happened on
        url: String,
        /// Event category, e.g. Videos
        #[arg(short, long)]
        category: String,
        /// Event action, e.g. Play
        #[arg(short, long)]
        action: String,
        /// Event name
        #[arg(short, long)]
        name: Option<String>,
        /// Numeric event value
        #[arg(short, long)]
        value: Option<f64>,
    },
    /// Record a hit from a flat JSON object of tracking parameters
    Raw {
        /// JSON object, must contain "url"
        json: String,
    },
}

/// Handle the CLI command
///
/// # Errors
/// - `MatomoError::Configuration` - Site id or tracker URL missing
/// - `MatomoError::Params` - Raw JSON is not a flat object
/// - `MatomoError::Tracker` - Validation or transport failure
pub async fn handle_command(global: &GlobalArgs, command: Commands) -> Result<()> {
    let config = resolve_config(MatomoConfig::from_env(), global);
    let tracker = MatomoTracker::from_config(&config)?;
    let params = build_params(command)?;

    if global.dry_run {
        let hit_url = tracker.build_request_url(params)?;
        println!("{hit_url}");
        return Ok(());
    }

    tracker.track(params).await?;
    println!("Recorded hit for site {}", tracker.site_id());
    Ok(())
}

/// Applies command-line overrides on top of the environment configuration.
fn resolve_config(mut config: MatomoConfig, global: &GlobalArgs) -> MatomoConfig {
    if let Some(site_id) = &global.site_id {
        config.site.site_id = Some(site_id.clone());
    }
    if let Some(tracker_url) = &global.tracker_url {
        config.site.tracker_url = Some(tracker_url.clone());
    }
    if global.skip_endpoint_check {
        config.site.require_standard_endpoint_name = false;
    }
    if let Some(seconds) = global.timeout {
        config.network.request_timeout = Duration::from_secs(seconds);
    }
    config
}

/// Converts a command into tracking parameters.
///
/// # Errors
/// - `MatomoError::Params` - Raw JSON is not a flat object of scalars
fn build_params(command: Commands) -> Result<TrackingParams> {
    let params = match command {
        Commands::Page {
            url,
            action_name,
            referrer,
            params,
        } => {
            let mut tracking = TrackingParams::new().url(url);
            if let Some(name) = action_name {
                tracking = tracking.action_name(name);
            }
            if let Some(referrer) = referrer {
                tracking = tracking.referrer(referrer);
            }
            for (key, value) in params {
                tracking.insert(key, value);
            }
            tracking
        }
        Commands::Event {
            url,
            category,
            action,
            name,
            value,
        } => {
            let mut tracking = TrackingParams::new().url(url).event(category, action);
            if let Some(name) = name {
                tracking = tracking.event_name(name);
            }
            if let Some(value) = value {
                tracking = tracking.event_value(value);
            }
            tracking
        }
        Commands::Raw { json } => serde_json::from_str(&json).map_err(MatomoError::from)?,
    };
    Ok(params)
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}
