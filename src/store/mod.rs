//! Local capability store.
//!
//! Two separate areas: a per-center cache of synced capabilities and a flat
//! installed set partitioned by kind. Everything that reads or writes local
//! capability state goes through [`CapabilityStore`].

mod fs;

use std::path::PathBuf;

pub use fs::FsStore;

use crate::capability::{Capability, CapabilityKind};
use crate::error::Result;

pub trait CapabilityStore {
    /// All capabilities synced from `center`. A never-synced center is empty.
    fn load_center(&self, center: &str) -> Result<Vec<Capability>>;

    /// Store one synced capability in the center cache, replacing any copy.
    fn save_center_capability(&self, center: &str, capability: &Capability) -> Result<()>;

    /// Persist a template body for `name` and return where it landed.
    ///
    /// `None` places it beside the installed set, for definitions read
    /// straight from the cluster.
    fn write_template(&self, center: Option<&str>, name: &str, body: &str) -> Result<PathBuf>;

    /// Create the cache area of a center, marking it synced even when empty.
    fn init_center(&self, center: &str) -> Result<()>;

    /// Names of centers that have a cache area.
    fn list_centers(&self) -> Result<Vec<String>>;

    /// Drop the cache area of a center. Fails with `NotFound` if it has none.
    fn remove_center(&self, center: &str) -> Result<()>;

    fn load_installed(&self, kind: CapabilityKind) -> Result<Vec<Capability>>;

    /// Installed capability of `kind` named `name`, or `CapabilityNotFound`.
    fn find_installed(&self, kind: CapabilityKind, name: &str) -> Result<Capability>;

    /// Write capabilities into the installed set, overwriting same-named
    /// entries. Returns how many were committed.
    fn commit_installed(&self, capabilities: &[Capability]) -> Result<usize>;

    fn remove_installed(&self, kind: CapabilityKind, name: &str) -> Result<()>;

    /// Installed capabilities of every kind, workloads first.
    fn load_all_installed(&self) -> Result<Vec<Capability>> {
        let mut all = Vec::new();
        for kind in CapabilityKind::ALL {
            all.extend(self.load_installed(kind)?);
        }
        Ok(all)
    }

    /// Look a name up across kinds in workload, trait, scope order.
    fn find_installed_any(&self, name: &str) -> Result<Capability> {
        for kind in CapabilityKind::ALL {
            match self.find_installed(kind, name) {
                Ok(found) => return Ok(found),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }
        Err(crate::error::CapError::CapabilityNotFound(name.to_string()))
    }
}
