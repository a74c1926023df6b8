//! Matomo Sim - Test doubles for Matomo tracking
//!
//! Provides a local HTTP endpoint that records tracking hits, and an
//! in-memory tracking client with deterministic failure injection.

pub mod endpoint;
pub mod simulated;

pub use axum::http::StatusCode;
pub use endpoint::{EndpointConfig, MockTrackingEndpoint, RecordedHit};
pub use simulated::{SimulatedTrackingClient, SimulationConfig};

/// Errors raised while setting up simulation infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Failed to bind mock endpoint: {reason}")]
    BindFailed { reason: String },
}
