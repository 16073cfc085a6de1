//! Syncing one center into the local cache.

use serde::Serialize;
use tracing::{info, warn};

use super::config::CenterConfig;
use super::manifest::{DefinitionManifest, TemplateSource};
use super::transport::RegistryTransport;
use crate::capability::template::parse_parameters;
use crate::capability::{Capability, ResourceKindInfo};
use crate::cluster::{ClusterError, Discovery};
use crate::error::{CapError, Result};
use crate::store::CapabilityStore;

/// Outcome of syncing one center.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub center: String,
    /// Capabilities written to the cache, in manifest order.
    pub synced: Vec<String>,
    /// Manifests skipped because their template could not be handled.
    pub errors: Vec<String>,
}

impl SyncReport {
    #[must_use]
    pub fn count(&self) -> usize {
        self.synced.len()
    }
}

pub struct RegistryClient<'a> {
    center: CenterConfig,
    transport: Box<dyn RegistryTransport>,
    discovery: &'a dyn Discovery,
    store: &'a dyn CapabilityStore,
}

impl<'a> RegistryClient<'a> {
    pub fn new(
        center: CenterConfig,
        transport: Box<dyn RegistryTransport>,
        discovery: &'a dyn Discovery,
        store: &'a dyn CapabilityStore,
    ) -> Self {
        Self {
            center,
            transport,
            discovery,
            store,
        }
    }

    /// Fetch every manifest of the center and cache the ones that parse.
    ///
    /// A manifest whose template cannot be fetched or parsed is recorded in
    /// [`SyncReport::errors`] and skipped. A capability whose resource kind
    /// cannot be resolved fails the whole call.
    pub fn sync(&self) -> Result<SyncReport> {
        let name = self.center.name.as_str();
        let raws = self
            .transport
            .fetch_manifests(&self.center.address, self.center.token.as_deref())?;
        info!(center = name, manifests = raws.len(), "syncing center");

        let mut report = SyncReport {
            center: name.to_string(),
            ..SyncReport::default()
        };
        self.store.init_center(name)?;

        for raw in raws {
            let raw = match raw {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(center = name, error = %err, "skipping manifest");
                    report.errors.push(err.to_string());
                    continue;
                }
            };
            let manifest = match DefinitionManifest::from_yaml(&raw.bytes) {
                Ok(manifest) => manifest,
                Err(err) => {
                    warn!(center = name, source = %raw.source, error = %err, "skipping manifest");
                    report.errors.push(format!("{}: {err}", raw.source));
                    continue;
                }
            };
            let mut capability =
                match load_definition(manifest, self.transport.as_ref(), self.store, Some(name)) {
                    Ok(capability) => capability,
                    Err(err) => {
                        warn!(center = name, source = %raw.source, error = %err, "skipping manifest");
                        report.errors.push(err.to_string());
                        continue;
                    }
                };

            capability.resource_kind = Some(resolve_resource_kind(self.discovery, &capability)?);
            capability.center = Some(name.to_string());
            self.store.save_center_capability(name, &capability)?;
            report.synced.push(capability.name);
        }

        info!(
            center = name,
            synced = report.count(),
            errors = report.errors.len(),
            "center synced"
        );
        Ok(report)
    }
}

/// Turn a manifest into a capability: fetch its template, write it to the
/// store and read the parameter list from it.
pub(crate) fn load_definition(
    manifest: DefinitionManifest,
    transport: &dyn RegistryTransport,
    store: &dyn CapabilityStore,
    center: Option<&str>,
) -> Result<Capability> {
    let name = manifest.name().to_string();
    let kind = manifest.capability_kind()?;
    let wrap = |err: CapError| {
        CapError::InvalidCapability(format!("handle {kind} template `{name}` failed: {err}"))
    };

    let body = match manifest.template_source().map_err(wrap)? {
        TemplateSource::Inline(body) => body,
        TemplateSource::Uri(uri) => {
            let bytes = transport.fetch_body(&uri).map_err(wrap)?;
            String::from_utf8(bytes).map_err(|err| {
                wrap(CapError::InvalidCapability(format!(
                    "template at {uri} is not UTF-8: {err}"
                )))
            })?
        }
    };

    let template_path = store.write_template(center, &name, &body)?;
    let parameters = parse_parameters(&body).map_err(wrap)?;
    let mut capability = manifest.into_capability(body).map_err(wrap)?;
    capability.template_path = template_path;
    capability.parameters = parameters;
    Ok(capability)
}

/// Ask discovery for the kind behind `capability.crd_name`.
///
/// An absent API group becomes a "missing provider" error naming what the
/// cluster would need to serve.
pub(crate) fn resolve_resource_kind(
    discovery: &dyn Discovery,
    capability: &Capability,
) -> Result<ResourceKindInfo> {
    discovery
        .resolve_kind(&capability.crd_name)
        .map_err(|err| match err {
            ClusterError::NoMatch(provider) => CapError::MissingProvider {
                capability: capability.name.clone(),
                provider,
            },
            other => CapError::Cluster(format!(
                "installing capability '{}'... {other}",
                capability.name
            )),
        })
}
