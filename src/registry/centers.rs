//! Registering, syncing and removing capability centers.

use std::path::PathBuf;

use tracing::info;

use super::client::{RegistryClient, SyncReport};
use super::config::{CenterConfig, CenterRegistry};
use super::transport::TransportFactory;
use crate::cluster::Discovery;
use crate::error::{CapError, Result};
use crate::store::CapabilityStore;
use crate::utils::fs::check_segment;

pub struct CenterService<'a> {
    registry_path: PathBuf,
    store: &'a dyn CapabilityStore,
    discovery: &'a dyn Discovery,
    transports: &'a dyn TransportFactory,
}

impl<'a> CenterService<'a> {
    pub fn new(
        registry_path: impl Into<PathBuf>,
        store: &'a dyn CapabilityStore,
        discovery: &'a dyn Discovery,
        transports: &'a dyn TransportFactory,
    ) -> Self {
        Self {
            registry_path: registry_path.into(),
            store,
            discovery,
            transports,
        }
    }

    pub fn registry(&self) -> Result<CenterRegistry> {
        CenterRegistry::load_from(&self.registry_path)
    }

    /// Register (or replace) a center, then sync it.
    ///
    /// The registration is kept even when the sync fails.
    pub fn add(&self, center: CenterConfig) -> Result<SyncReport> {
        check_segment("center", &center.name)?;
        let mut registry = self.registry()?;
        registry.upsert(center.clone());
        registry.save_to(&self.registry_path)?;
        info!(center = %center.name, address = %center.address, "center registered");
        self.sync_one(&center)
    }

    pub fn list(&self) -> Result<Vec<CenterConfig>> {
        Ok(self.registry()?.centers)
    }

    /// Sync one named center, or every registered center.
    pub fn sync(&self, name: Option<&str>) -> Result<Vec<SyncReport>> {
        let registry = self.registry()?;
        if registry.is_empty() {
            return Err(CapError::NoCenterConfigured);
        }
        match name {
            Some(name) => {
                let center = registry
                    .get(name)
                    .ok_or_else(|| CapError::CenterNotFound(name.to_string()))?;
                Ok(vec![self.sync_one(center)?])
            }
            None => registry
                .centers
                .iter()
                .map(|center| self.sync_one(center))
                .collect(),
        }
    }

    /// Drop a center's cache and its registration.
    pub fn remove(&self, name: &str) -> Result<()> {
        check_segment("center", name)?;
        self.store.remove_center(name)?;
        let mut registry = self.registry()?;
        registry.remove(name);
        registry.save_to(&self.registry_path)?;
        info!(center = name, "center removed");
        Ok(())
    }

    fn sync_one(&self, center: &CenterConfig) -> Result<SyncReport> {
        let transport = self.transports.transport_for(center)?;
        RegistryClient::new(center.clone(), transport, self.discovery, self.store).sync()
    }
}
