//! In-memory cluster for tests.
//!
//! [`MockCluster`] implements all three cluster traits against plain maps,
//! records every call, and can be told to fail specific operations.
//!
//! ```rust,ignore
//! let cluster = MockCluster::new().serving("apps/v1", "Deployment");
//! cluster.inject_error(ErrorInjection::Create(ClusterError::Api("boom".into())));
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use super::kubectl::{ApiResource, find_resource};
use super::{
    ChartProvisioner, ClusterClient, ClusterError, ClusterResult, DefinitionObject, Discovery,
};
use crate::capability::applicability::pluralize_kind;
use crate::capability::{CapabilityKind, InstallDescriptor, ResourceKindInfo};
use crate::error::{CapError, Result};

/// A call observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterOp {
    List(CapabilityKind),
    Create(String),
    Delete(String),
    ResolveKind(String),
    ChartInstall(String),
    ChartUninstall {
        name: String,
        namespace: String,
        release: String,
    },
}

/// Failure returned by every matching call until cleared.
#[derive(Debug, Clone)]
pub enum ErrorInjection {
    List(ClusterError),
    Create(ClusterError),
    Delete(ClusterError),
    Resolve(ClusterError),
    ChartInstall(String),
    ChartUninstall(String),
}

#[derive(Debug, Default)]
pub struct MockCluster {
    definitions: RefCell<BTreeMap<(CapabilityKind, String), DefinitionObject>>,
    resources: RefCell<Vec<ApiResource>>,
    charts: RefCell<BTreeSet<String>>,
    ops: RefCell<Vec<ClusterOp>>,
    errors: RefCell<Vec<ErrorInjection>>,
}

impl MockCluster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make discovery serve `kind` under `api_version`.
    #[must_use]
    pub fn serving(self, api_version: &str, kind: &str) -> Self {
        self.serve(api_version, kind);
        self
    }

    pub fn serve(&self, api_version: &str, kind: &str) {
        self.resources.borrow_mut().push(ApiResource {
            name: pluralize_kind(kind),
            api_version: api_version.to_string(),
            namespaced: true,
            kind: kind.to_string(),
        });
    }

    /// Pre-register a definition object, as if created out of band.
    pub fn insert_definition(&self, object: DefinitionObject) {
        self.definitions
            .borrow_mut()
            .insert((object.kind, object.name.clone()), object);
    }

    #[must_use]
    pub fn definition(&self, kind: CapabilityKind, name: &str) -> Option<DefinitionObject> {
        self.definitions
            .borrow()
            .get(&(kind, name.to_string()))
            .cloned()
    }

    #[must_use]
    pub fn installed_charts(&self) -> Vec<String> {
        self.charts.borrow().iter().cloned().collect()
    }

    #[must_use]
    pub fn ops(&self) -> Vec<ClusterOp> {
        self.ops.borrow().clone()
    }

    pub fn inject_error(&self, injection: ErrorInjection) {
        self.errors.borrow_mut().push(injection);
    }

    pub fn clear_errors(&self) {
        self.errors.borrow_mut().clear();
    }

    fn record(&self, op: ClusterOp) {
        self.ops.borrow_mut().push(op);
    }

    fn injected<T>(&self, pick: impl Fn(&ErrorInjection) -> Option<T>) -> Option<T> {
        let errors = self.errors.borrow();
        errors.iter().find_map(pick)
    }
}

fn labels_match(manifest: &serde_json::Value, selector: &str) -> bool {
    selector
        .split(',')
        .filter(|term| !term.trim().is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => {
                manifest["metadata"]["labels"][key.trim()].as_str() == Some(value.trim())
            }
            None => !manifest["metadata"]["labels"][term.trim()].is_null(),
        })
}

impl ClusterClient for MockCluster {
    fn list(
        &self,
        kind: CapabilityKind,
        namespace: &str,
        selector: Option<&str>,
    ) -> ClusterResult<Vec<DefinitionObject>> {
        self.record(ClusterOp::List(kind));
        if let Some(err) = self.injected(|e| match e {
            ErrorInjection::List(err) => Some(err.clone()),
            _ => None,
        }) {
            return Err(err);
        }
        Ok(self
            .definitions
            .borrow()
            .values()
            .filter(|obj| obj.kind == kind && obj.namespace == namespace)
            .filter(|obj| selector.is_none_or(|sel| labels_match(&obj.manifest, sel)))
            .cloned()
            .collect())
    }

    fn create(&self, object: &DefinitionObject) -> ClusterResult<()> {
        self.record(ClusterOp::Create(object.name.clone()));
        if let Some(err) = self.injected(|e| match e {
            ErrorInjection::Create(err) => Some(err.clone()),
            _ => None,
        }) {
            return Err(err);
        }
        let mut definitions = self.definitions.borrow_mut();
        let key = (object.kind, object.name.clone());
        if definitions.contains_key(&key) {
            return Err(ClusterError::AlreadyExists(object.name.clone()));
        }
        definitions.insert(key, object.clone());
        Ok(())
    }

    fn delete(&self, kind: CapabilityKind, name: &str, _namespace: &str) -> ClusterResult<()> {
        self.record(ClusterOp::Delete(name.to_string()));
        if let Some(err) = self.injected(|e| match e {
            ErrorInjection::Delete(err) => Some(err.clone()),
            _ => None,
        }) {
            return Err(err);
        }
        self.definitions
            .borrow_mut()
            .remove(&(kind, name.to_string()))
            .map(|_| ())
            .ok_or_else(|| ClusterError::NotFound(name.to_string()))
    }
}

impl Discovery for MockCluster {
    fn resolve_kind(&self, reference: &str) -> ClusterResult<ResourceKindInfo> {
        self.record(ClusterOp::ResolveKind(reference.to_string()));
        if let Some(err) = self.injected(|e| match e {
            ErrorInjection::Resolve(err) => Some(err.clone()),
            _ => None,
        }) {
            return Err(err);
        }
        find_resource(&self.resources.borrow(), reference)
    }
}

impl ChartProvisioner for MockCluster {
    fn install(&self, chart: &InstallDescriptor) -> Result<()> {
        self.record(ClusterOp::ChartInstall(chart.name.clone()));
        if let Some(msg) = self.injected(|e| match e {
            ErrorInjection::ChartInstall(msg) => Some(msg.clone()),
            _ => None,
        }) {
            return Err(CapError::Provision(format!(
                "unable to install helm chart dependency {}: {msg}",
                chart.name
            )));
        }
        self.charts.borrow_mut().insert(chart.name.clone());
        Ok(())
    }

    fn uninstall(&self, name: &str, namespace: &str, release_label: &str) -> Result<()> {
        self.record(ClusterOp::ChartUninstall {
            name: name.to_string(),
            namespace: namespace.to_string(),
            release: release_label.to_string(),
        });
        if let Some(msg) = self.injected(|e| match e {
            ErrorInjection::ChartUninstall(msg) => Some(msg.clone()),
            _ => None,
        }) {
            return Err(CapError::Provision(msg));
        }
        self.charts.borrow_mut().remove(name);
        Ok(())
    }
}
