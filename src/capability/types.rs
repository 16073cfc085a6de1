//! Capability and parameter documents.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CapError, Result};
use crate::utils::fs::is_safe_segment;

/// Annotation carrying the human description of a definition.
pub const DESCRIPTION_ANNOTATION: &str = "definition.oam.dev/description";

/// Description used when a definition carries no annotation.
pub const DEFAULT_DESCRIPTION: &str = "description not defined";

/// The three definition families a center can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Workload,
    Trait,
    Scope,
}

impl CapabilityKind {
    pub const ALL: [Self; 3] = [Self::Workload, Self::Trait, Self::Scope];

    /// Directory name of this kind inside the installed set.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Workload => "workloads",
            Self::Trait => "traits",
            Self::Scope => "scopes",
        }
    }

    /// Kubernetes kind of the definition object.
    #[must_use]
    pub const fn definition_kind(self) -> &'static str {
        match self {
            Self::Workload => "WorkloadDefinition",
            Self::Trait => "TraitDefinition",
            Self::Scope => "ScopeDefinition",
        }
    }

    /// Plural resource name used against the cluster API.
    #[must_use]
    pub const fn definition_resource(self) -> &'static str {
        match self {
            Self::Workload => "workloaddefinitions.core.oam.dev",
            Self::Trait => "traitdefinitions.core.oam.dev",
            Self::Scope => "scopedefinitions.core.oam.dev",
        }
    }

    #[must_use]
    pub fn from_definition_kind(kind: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.definition_kind() == kind)
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "workload" | "workloads" => Ok(Self::Workload),
            "trait" | "traits" => Ok(Self::Trait),
            "scope" | "scopes" => Ok(Self::Scope),
            _ => Err(CapError::Config(format!(
                "unknown capability kind: {value} (use workload|trait|scope)"
            ))),
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Workload => "workload",
            Self::Trait => "trait",
            Self::Scope => "scope",
        };
        f.write_str(name)
    }
}

/// Declared kind of a template parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Int,
    String,
    Bool,
    Float,
    /// Structs, lists and anything else flag-style binding cannot express.
    Other,
}

impl ParameterKind {
    /// Whether values of this kind can be bound from user input.
    #[must_use]
    pub const fn is_bindable(self) -> bool {
        !matches!(self, Self::Other)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Other => "other",
        }
    }
}

/// One typed parameter of a capability template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind, required: bool) -> Self {
        Self {
            name: name.into(),
            alias: None,
            kind,
            required,
            default: None,
            usage: None,
            short: None,
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Key used to look the value up in user input.
    #[must_use]
    pub fn lookup_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Chart install spec, handed verbatim to the chart provisioner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstallDescriptor {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Where an installed capability came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_name: Option<String>,
}

/// Resolved API version and kind backing a capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceKindInfo {
    pub api_version: String,
    pub kind: String,
}

impl ResourceKindInfo {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStatus {
    Installed,
    Uninstalled,
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Installed => "installed",
            Self::Uninstalled => "uninstalled",
        })
    }
}

/// One workload, trait or scope definition.
///
/// Deserialization goes through the same check as [`Capability::new`], so a
/// stored document without a template body never loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CapabilityRecord")]
pub struct Capability {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CapabilityKind,
    pub crd_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_kind: Option<ResourceKindInfo>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "template")]
    pub template_body: String,
    #[serde(default)]
    pub template_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InstallStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapabilityRecord {
    name: String,
    #[serde(rename = "type")]
    kind: CapabilityKind,
    crd_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    applies_to: Vec<String>,
    #[serde(default)]
    install: Option<InstallDescriptor>,
    #[serde(default)]
    source: Option<Source>,
    #[serde(default)]
    resource_kind: Option<ResourceKindInfo>,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default, rename = "template")]
    template_body: String,
    #[serde(default)]
    template_path: PathBuf,
    #[serde(default)]
    center: Option<String>,
    #[serde(default)]
    status: Option<InstallStatus>,
}

impl TryFrom<CapabilityRecord> for Capability {
    type Error = CapError;

    fn try_from(record: CapabilityRecord) -> Result<Self> {
        let mut capability =
            Self::new(record.name, record.kind, record.crd_name, record.template_body)?;
        capability.description = record.description;
        capability.applies_to = record.applies_to;
        capability.install = record.install;
        capability.source = record.source;
        capability.resource_kind = record.resource_kind;
        capability.parameters = record.parameters;
        capability.template_path = record.template_path;
        capability.center = record.center;
        capability.status = record.status;
        Ok(capability)
    }
}

impl Capability {
    /// Build a capability shell. Fails when the template body is empty.
    pub fn new(
        name: impl Into<String>,
        kind: CapabilityKind,
        crd_name: impl Into<String>,
        template_body: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let template_body = template_body.into();
        if name.trim().is_empty() {
            return Err(CapError::InvalidCapability(
                "capability name must not be empty".to_string(),
            ));
        }
        if !is_safe_segment(&name) {
            return Err(CapError::InvalidCapability(format!(
                "invalid capability name `{name}`"
            )));
        }
        if template_body.trim().is_empty() {
            return Err(CapError::InvalidCapability(format!(
                "template not exist in definition {name}"
            )));
        }
        Ok(Self {
            name,
            kind,
            crd_name: crd_name.into(),
            description: String::new(),
            applies_to: Vec::new(),
            install: None,
            source: None,
            resource_kind: None,
            parameters: Vec::new(),
            template_body,
            template_path: PathBuf::new(),
            center: None,
            status: None,
        })
    }

    /// Description, falling back to the placeholder text.
    #[must_use]
    pub fn description_or_default(&self) -> &str {
        if self.description.is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            &self.description
        }
    }

    /// Chart name recorded at install time, if any.
    #[must_use]
    pub fn chart_name(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|source| source.chart_name.as_deref())
    }

    #[must_use]
    pub fn center_name(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|source| source.center_name.as_deref())
            .or(self.center.as_deref())
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// JSON-schema-like view of the bindable parameters.
    #[must_use]
    pub fn parameter_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            let schema_type = match param.kind {
                ParameterKind::Int => "integer",
                ParameterKind::String => "string",
                ParameterKind::Bool => "boolean",
                ParameterKind::Float => "number",
                ParameterKind::Other => "object",
            };
            let mut prop = serde_json::Map::new();
            prop.insert("type".to_string(), schema_type.into());
            if let Some(usage) = &param.usage {
                prop.insert("description".to_string(), usage.clone().into());
            }
            if let Some(default) = &param.default {
                prop.insert("default".to_string(), default.clone().into());
            }
            if let Some(alias) = &param.alias {
                prop.insert("x-alias".to_string(), alias.clone().into());
            }
            if param.required {
                required.push(serde_json::Value::from(param.name.clone()));
            }
            properties.insert(param.name.clone(), serde_json::Value::Object(prop));
        }
        serde_json::json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_requires_template_body() {
        let err = Capability::new("webservice", CapabilityKind::Workload, "deployments.apps", "  ")
            .unwrap_err();
        assert!(matches!(err, CapError::InvalidCapability(_)));
        assert!(err.to_string().contains("template not exist"));
    }

    #[test]
    fn construction_rejects_path_like_names() {
        for name in ["..", "../webservice", "a/b", "a\\b"] {
            let err = Capability::new(name, CapabilityKind::Trait, "routes.example.dev", "output: {}")
                .unwrap_err();
            assert!(err.to_string().contains("invalid capability name"), "{name:?}");
        }
    }

    #[test]
    fn deserialization_enforces_template_body() {
        let yaml = "name: route\ntype: trait\ncrdName: routes.standard.oam.dev\n";
        let err = serde_yaml::from_str::<Capability>(yaml).unwrap_err();
        assert!(err.to_string().contains("template not exist"));
    }

    #[test]
    fn yaml_roundtrip_keeps_fields() {
        let mut cap =
            Capability::new("route", CapabilityKind::Trait, "routes.standard.oam.dev", "output: {}")
                .unwrap();
        cap.applies_to = vec!["apps/v1.Deployment".to_string()];
        cap.parameters = vec![Parameter::new("domain", ParameterKind::String, true)];
        cap.center = Some("core".to_string());

        let rendered = serde_yaml::to_string(&cap).unwrap();
        assert!(rendered.contains("appliesTo"));
        let back: Capability = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(back, cap);
    }

    #[test]
    fn lookup_key_prefers_alias() {
        let param = Parameter::new("containerPort", ParameterKind::Int, false).with_alias("port");
        assert_eq!(param.lookup_key(), "port");
        assert_eq!(Parameter::new("image", ParameterKind::String, true).lookup_key(), "image");
    }

    #[test]
    fn kind_names() {
        assert_eq!(CapabilityKind::Trait.dir_name(), "traits");
        assert_eq!(
            CapabilityKind::from_definition_kind("WorkloadDefinition"),
            Some(CapabilityKind::Workload)
        );
        assert!(CapabilityKind::from_definition_kind("Deployment").is_none());
        assert_eq!(CapabilityKind::parse("Traits").unwrap(), CapabilityKind::Trait);
        assert!(CapabilityKind::parse("gizmo").is_err());
    }

    #[test]
    fn description_defaults() {
        let cap = Capability::new("w", CapabilityKind::Workload, "w.x", "t").unwrap();
        assert_eq!(cap.description_or_default(), DEFAULT_DESCRIPTION);
    }

    #[test]
    fn parameter_schema_lists_required() {
        let mut cap = Capability::new("w", CapabilityKind::Workload, "w.x", "t").unwrap();
        cap.parameters = vec![
            Parameter::new("image", ParameterKind::String, true),
            Parameter::new("port", ParameterKind::Int, false),
        ];
        let schema = cap.parameter_schema();
        assert_eq!(schema["properties"]["port"]["type"], "integer");
        assert_eq!(schema["required"], serde_json::json!(["image"]));
    }
}
