pub mod app;
pub mod appfile;
pub mod capability;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod installer;
pub mod registry;
pub mod store;
pub mod test_utils;
pub mod utils;

pub use error::{CapError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
