//! Capability centers: where definitions come from and how they are cached.

mod centers;
mod client;
mod config;
pub mod github;
pub mod manifest;
mod transport;

pub use centers::CenterService;
pub use client::{RegistryClient, SyncReport};
pub(crate) use client::{load_definition, resolve_resource_kind};
pub use config::{CenterConfig, CenterRegistry};
pub use manifest::{DefinitionManifest, definition_object};
pub use transport::{
    DefaultTransports, LocalDirTransport, RawManifest, RegistryTransport, TransportFactory,
};
