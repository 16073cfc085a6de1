//! Installing capabilities into a cluster and removing them again.
//!
//! Install walks: lookup in the center cache, optional chart provisioning,
//! resource-kind discovery, registration with the cluster, commit to the
//! installed set. Registration that finds the definition already present is
//! treated as success, which makes a retried install safe.

mod report;

use serde::Serialize;
use tracing::{info, warn};

pub use report::{OperationReport, Step, StepFailure, StepOutcome, StepRecord};

use crate::capability::catalog::parse_center_address;
use crate::capability::{CapabilityKind, InstallStatus, Source};
use crate::cluster::{ChartProvisioner, ClusterClient, ClusterError, Discovery};
use crate::error::{CapError, Result};
use crate::registry::{
    DefinitionManifest, RegistryTransport, definition_object, load_definition,
    resolve_resource_kind,
};
use crate::store::CapabilityStore;

pub struct Installer<'a> {
    store: &'a dyn CapabilityStore,
    cluster: &'a dyn ClusterClient,
    discovery: &'a dyn Discovery,
    charts: &'a dyn ChartProvisioner,
    namespace: String,
}

/// Outcome of pulling definitions straight from the cluster.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterSyncReport {
    pub committed: Vec<String>,
    pub errors: Vec<String>,
}

impl<'a> Installer<'a> {
    pub fn new(
        store: &'a dyn CapabilityStore,
        cluster: &'a dyn ClusterClient,
        discovery: &'a dyn Discovery,
        charts: &'a dyn ChartProvisioner,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cluster,
            discovery,
            charts,
            namespace: namespace.into(),
        }
    }

    /// Install from a `<center>/<name>` address.
    pub fn install_target(&self, target: &str) -> Result<OperationReport> {
        let (center, name) = parse_center_address(target)?;
        Ok(self.install(center, name))
    }

    pub fn install(&self, center: &str, name: &str) -> OperationReport {
        let mut report = OperationReport::new(name);

        let lookup = self
            .store
            .load_center(center)
            .and_then(|caps| {
                caps.into_iter()
                    .find(|c| c.name == name)
                    .ok_or_else(|| CapError::CapabilityNotFound(format!("{center}/{name}")))
            });
        let mut capability = match lookup {
            Ok(capability) => capability,
            Err(err) => return report.fail(Step::Lookup, err),
        };
        report.record(Step::Lookup, StepOutcome::Done);

        let mut source = capability.source.take().unwrap_or_default();
        source.center_name = Some(center.to_string());

        match &capability.install {
            Some(chart) => {
                info!(capability = name, chart = %chart.name, "provisioning chart");
                if let Err(err) = self.charts.install(chart) {
                    return report.fail(Step::ProvisionChart, err);
                }
                source.chart_name = Some(chart.name.clone());
                report.record(Step::ProvisionChart, StepOutcome::Done);
            }
            None => report.record(Step::ProvisionChart, StepOutcome::Skipped),
        }
        capability.source = Some(source);

        if capability.kind == CapabilityKind::Scope {
            // Scopes are committed locally only.
            report.record(Step::ResolveKind, StepOutcome::Skipped);
            report.record(Step::Register, StepOutcome::Skipped);
        } else {
            match resolve_resource_kind(self.discovery, &capability) {
                Ok(resource_kind) => capability.resource_kind = Some(resource_kind),
                Err(err) => return report.fail(Step::ResolveKind, err),
            }
            report.record(Step::ResolveKind, StepOutcome::Done);

            let object = definition_object(&capability, &self.namespace);
            match self.cluster.create(&object) {
                Ok(()) => report.record(Step::Register, StepOutcome::Done),
                Err(ClusterError::AlreadyExists(_)) => {
                    info!(capability = name, "definition already registered");
                    report.record(Step::Register, StepOutcome::AlreadyExisted);
                }
                Err(err) => return report.fail(Step::Register, err.into()),
            }
        }

        capability.center = Some(center.to_string());
        capability.status = Some(InstallStatus::Installed);
        if let Err(err) = self.store.commit_installed(std::slice::from_ref(&capability)) {
            return report.fail(Step::Commit, err);
        }
        report.record(Step::Commit, StepOutcome::Done);
        info!(capability = name, center, kind = %capability.kind, "capability installed");

        report.installed = Some(capability);
        report
    }

    /// Remove an installed capability from the cluster and the local set.
    ///
    /// There is no rollback: a failure leaves earlier steps applied.
    pub fn uninstall(&self, name: &str) -> OperationReport {
        let mut report = OperationReport::new(name);

        let capability = match self.store.find_installed_any(name) {
            Ok(capability) => capability,
            Err(err) => return report.fail(Step::Lookup, err),
        };
        report.record(Step::Lookup, StepOutcome::Done);

        if capability.kind == CapabilityKind::Scope {
            return report.fail(
                Step::DeleteDefinition,
                CapError::Unsupported("uninstall scope capability is not supported".to_string()),
            );
        }

        match self.cluster.delete(capability.kind, name, &self.namespace) {
            Ok(()) => report.record(Step::DeleteDefinition, StepOutcome::Done),
            Err(ClusterError::NotFound(_)) => {
                warn!(capability = name, "definition was already gone from the cluster");
                report.record(Step::DeleteDefinition, StepOutcome::AlreadyAbsent);
            }
            Err(err) => return report.fail(Step::DeleteDefinition, err.into()),
        }

        match capability.chart_name() {
            Some(chart) => {
                let namespace = capability
                    .install
                    .as_ref()
                    .and_then(|i| i.namespace.as_deref())
                    .filter(|ns| !ns.is_empty())
                    .unwrap_or(&self.namespace);
                if let Err(err) = self.charts.uninstall(chart, namespace, name) {
                    return report.fail(Step::UninstallChart, err);
                }
                report.record(Step::UninstallChart, StepOutcome::Done);
            }
            None => report.record(Step::UninstallChart, StepOutcome::Skipped),
        }

        if let Err(err) = self.store.remove_installed(capability.kind, name) {
            return report.fail(Step::RemoveLocal, err);
        }
        report.record(Step::RemoveLocal, StepOutcome::Done);
        info!(capability = name, "capability uninstalled");
        report
    }

    /// Rebuild the installed set of `kind` from definitions already in the
    /// cluster.
    ///
    /// Template problems are collected per definition. Chart and discovery
    /// failures abort the call before anything is committed.
    pub fn sync_from_cluster(
        &self,
        kind: CapabilityKind,
        selector: Option<&str>,
        transport: &dyn RegistryTransport,
    ) -> Result<ClusterSyncReport> {
        if kind == CapabilityKind::Scope {
            return Err(CapError::Unsupported(
                "syncing scope capabilities from the cluster is not supported".to_string(),
            ));
        }
        let objects = self.cluster.list(kind, &self.namespace, selector)?;
        let mut report = ClusterSyncReport::default();
        let mut capabilities = Vec::new();

        for object in objects {
            let loaded = DefinitionManifest::from_json(object.manifest)
                .and_then(|manifest| load_definition(manifest, transport, self.store, None));
            let mut capability = match loaded {
                Ok(capability) => capability,
                Err(err) => {
                    warn!(definition = %object.name, error = %err, "skipping definition");
                    report.errors.push(err.to_string());
                    continue;
                }
            };

            if let Some(chart) = &capability.install {
                self.charts.install(chart)?;
                capability.source = Some(Source {
                    center_name: None,
                    chart_name: Some(chart.name.clone()),
                });
            }
            capability.resource_kind = Some(resolve_resource_kind(self.discovery, &capability)?);
            capability.status = Some(InstallStatus::Installed);
            capabilities.push(capability);
        }

        self.store.commit_installed(&capabilities)?;
        report.committed = capabilities.into_iter().map(|c| c.name).collect();
        info!(%kind, committed = report.committed.len(), errors = report.errors.len(), "synced from cluster");
        Ok(report)
    }
}
