//! Cluster-side collaborators.
//!
//! The installer only needs three verbs on definition objects, a discovery
//! lookup and a chart provisioner. Real implementations shell out to
//! `kubectl` and `helm`; [`MockCluster`] keeps everything in memory.

mod helm;
mod kubectl;
mod mock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use helm::HelmProvisioner;
pub use kubectl::{ApiResource, KubectlClient, parse_api_resources};
pub use mock::{ClusterOp, ErrorInjection, MockCluster};

use crate::capability::{CapabilityKind, InstallDescriptor, ResourceKindInfo};
use crate::error::{CapError, Result};

/// A definition object as submitted to, or listed from, the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionObject {
    pub kind: CapabilityKind,
    pub name: String,
    pub namespace: String,
    /// Full object body, including apiVersion/kind/metadata/spec.
    pub manifest: serde_json::Value,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Discovery has no resource for the reference.
    #[error("no matches for {0}")]
    NoMatch(String),

    #[error("{0}")]
    Api(String),
}

impl From<ClusterError> for CapError {
    fn from(err: ClusterError) -> Self {
        match err {
            ClusterError::NotFound(name) => Self::NotFound(name),
            other => Self::Cluster(other.to_string()),
        }
    }
}

pub type ClusterResult<T> = std::result::Result<T, ClusterError>;

/// Create/list/delete on definition objects.
pub trait ClusterClient {
    fn list(
        &self,
        kind: CapabilityKind,
        namespace: &str,
        selector: Option<&str>,
    ) -> ClusterResult<Vec<DefinitionObject>>;

    fn create(&self, object: &DefinitionObject) -> ClusterResult<()>;

    fn delete(&self, kind: CapabilityKind, name: &str, namespace: &str) -> ClusterResult<()>;
}

/// Resolve a `plural.group` reference to the kind the cluster serves.
pub trait Discovery {
    fn resolve_kind(&self, reference: &str) -> ClusterResult<ResourceKindInfo>;
}

/// Installs the chart a capability depends on.
pub trait ChartProvisioner {
    fn install(&self, chart: &InstallDescriptor) -> Result<()>;

    /// `release_label` names the capability the release belongs to.
    fn uninstall(&self, name: &str, namespace: &str, release_label: &str) -> Result<()>;
}
