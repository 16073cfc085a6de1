//! Definition manifests as published by centers and served by the cluster.
//!
//! ```yaml
//! apiVersion: core.oam.dev/v1alpha2
//! kind: TraitDefinition
//! metadata:
//!   name: route
//!   annotations:
//!     definition.oam.dev/description: "Expose the service"
//! spec:
//!   appliesToWorkloads: ["apps/v1.Deployment"]
//!   definitionRef:
//!     name: routes.standard.oam.dev
//!   extension:
//!     install:
//!       helm: { name: routing, version: 0.1.0, url: https://charts.example.dev }
//!     template: |
//!       parameter: { domain: string }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capability::{
    Capability, CapabilityKind, DEFAULT_DESCRIPTION, DESCRIPTION_ANNOTATION, InstallDescriptor,
    Source,
};
use crate::cluster::DefinitionObject;
use crate::error::{CapError, Result};
use crate::utils::fs::is_safe_segment;

pub const DEFINITION_API_VERSION: &str = "core.oam.dev/v1alpha2";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallSpec {
    pub helm: InstallDescriptor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extension {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(
        default,
        rename = "templateURI",
        alias = "templateUri",
        skip_serializing_if = "Option::is_none"
    )]
    pub template_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_ref: Option<DefinitionRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to_workloads: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<Extension>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: DefinitionSpec,
}

/// Where a template body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Inline(String),
    Uri(String),
}

impl DefinitionManifest {
    pub fn from_yaml(bytes: &[u8]) -> Result<Self> {
        let manifest: Self = serde_yaml::from_slice(bytes)
            .map_err(|err| CapError::InvalidCapability(format!("parse definition: {err}")))?;
        manifest.check()?;
        Ok(manifest)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let manifest: Self = serde_json::from_value(value)
            .map_err(|err| CapError::InvalidCapability(format!("parse definition: {err}")))?;
        manifest.check()?;
        Ok(manifest)
    }

    /// Known definition kind, and a name usable as a file name.
    fn check(&self) -> Result<()> {
        self.capability_kind()?;
        if !is_safe_segment(self.name()) {
            return Err(CapError::InvalidCapability(format!(
                "invalid definition name `{}`",
                self.name()
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn capability_kind(&self) -> Result<CapabilityKind> {
        CapabilityKind::from_definition_kind(&self.kind).ok_or_else(|| {
            CapError::InvalidCapability(format!(
                "{} is a {}, not a capability definition",
                self.metadata.name, self.kind
            ))
        })
    }

    /// Backing resource reference, e.g. `deployments.apps`.
    pub fn crd_name(&self) -> Result<&str> {
        self.spec
            .definition_ref
            .as_ref()
            .map(|r| r.name.as_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                CapError::InvalidCapability(format!(
                    "definition {} has no definitionRef",
                    self.metadata.name
                ))
            })
    }

    #[must_use]
    pub fn description(&self) -> &str {
        self.metadata
            .annotations
            .get(DESCRIPTION_ANNOTATION)
            .map_or(DEFAULT_DESCRIPTION, String::as_str)
    }

    /// A template URI wins over an embedded template.
    pub fn template_source(&self) -> Result<TemplateSource> {
        let extension = self.spec.extension.as_ref();
        if let Some(uri) = extension
            .and_then(|e| e.template_uri.as_deref())
            .filter(|u| !u.is_empty())
        {
            return Ok(TemplateSource::Uri(uri.to_string()));
        }
        extension
            .and_then(|e| e.template.as_deref())
            .filter(|t| !t.trim().is_empty())
            .map(|t| TemplateSource::Inline(t.to_string()))
            .ok_or_else(|| CapError::InvalidCapability("template not exist in definition".to_string()))
    }

    /// Build the capability shell once the template body is known.
    pub fn into_capability(self, template_body: String) -> Result<Capability> {
        let kind = self.capability_kind()?;
        let crd_name = self.crd_name()?.to_string();
        let description = self.description().to_string();
        let mut capability = Capability::new(self.metadata.name, kind, crd_name, template_body)?;
        capability.description = description;
        if kind == CapabilityKind::Trait {
            capability.applies_to = self.spec.applies_to_workloads;
        }
        if let Some(install) = self.spec.extension.and_then(|e| e.install) {
            capability.source = Some(Source {
                center_name: None,
                chart_name: Some(install.helm.name.clone()),
            });
            capability.install = Some(install.helm);
        }
        Ok(capability)
    }
}

/// The object submitted to the cluster to register `capability`.
#[must_use]
pub fn definition_object(capability: &Capability, namespace: &str) -> DefinitionObject {
    let mut annotations = BTreeMap::new();
    if !capability.description.is_empty() {
        annotations.insert(
            DESCRIPTION_ANNOTATION.to_string(),
            capability.description.clone(),
        );
    }
    let manifest = DefinitionManifest {
        api_version: DEFINITION_API_VERSION.to_string(),
        kind: capability.kind.definition_kind().to_string(),
        metadata: Metadata {
            name: capability.name.clone(),
            namespace: Some(namespace.to_string()),
            annotations,
            labels: BTreeMap::new(),
        },
        spec: DefinitionSpec {
            definition_ref: Some(DefinitionRef {
                name: capability.crd_name.clone(),
            }),
            applies_to_workloads: capability.applies_to.clone(),
            extension: Some(Extension {
                install: capability
                    .install
                    .clone()
                    .map(|helm| InstallSpec { helm }),
                template: Some(capability.template_body.clone()),
                template_uri: None,
            }),
        },
    };

    DefinitionObject {
        kind: capability.kind,
        name: capability.name.clone(),
        namespace: namespace.to_string(),
        manifest: serde_json::to_value(&manifest).unwrap_or(serde_json::Value::Null),
    }
}
