//! Integration tests for the Matomo tracker client
//!
//! These tests run the real HTTP client against a local mock tracking
//! endpoint and assert on exactly what arrives on the wire.

#[path = "integration/tracking_hits.rs"]
mod tracking_hits;

#[path = "integration/concurrent_hits.rs"]
mod concurrent_hits;

#[path = "integration/delivery_failures.rs"]
mod delivery_failures;
