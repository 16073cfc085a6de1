//! Shared test utilities for capkit.

pub mod fixtures;

pub use fixtures::{CapkitFixture, ROUTE_MANIFEST, WEBSERVICE_MANIFEST, core_cluster};
