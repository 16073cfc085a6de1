//! `kubectl`-backed cluster client and discovery.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::debug;

use super::{ClusterClient, ClusterError, ClusterResult, DefinitionObject, Discovery};
use crate::capability::{CapabilityKind, ResourceKindInfo};

/// One row of `kubectl api-resources`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResource {
    pub name: String,
    pub api_version: String,
    pub namespaced: bool,
    pub kind: String,
}

impl ApiResource {
    /// API group, empty for the core group.
    #[must_use]
    pub fn group(&self) -> &str {
        self.api_version
            .split_once('/')
            .map_or("", |(group, _)| group)
    }
}

/// Parse `kubectl api-resources --no-headers` output.
///
/// The SHORTNAMES column may be empty, so columns are read from the right.
#[must_use]
pub fn parse_api_resources(output: &str) -> Vec<ApiResource> {
    output
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return None;
            }
            let n = cols.len();
            Some(ApiResource {
                name: cols[0].to_string(),
                api_version: cols[n - 3].to_string(),
                namespaced: cols[n - 2] == "true",
                kind: cols[n - 1].to_string(),
            })
        })
        .collect()
}

#[derive(Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// Client shelling out to `kubectl`.
#[derive(Debug, Clone)]
pub struct KubectlClient {
    binary: PathBuf,
    context: Option<String>,
}

impl KubectlClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_binary("kubectl")
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    fn run(&self, args: &[&str], stdin: Option<&[u8]>) -> ClusterResult<Vec<u8>> {
        let mut cmd = Command::new(&self.binary);
        if let Some(context) = &self.context {
            cmd.arg("--context").arg(context);
        }
        cmd.args(args);
        debug!(binary = %self.binary.display(), ?args, "running kubectl");

        let output = if let Some(input) = stdin {
            cmd.stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
            let mut child = cmd.spawn().map_err(spawn_error)?;
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input)
                    .map_err(|err| ClusterError::Api(format!("write kubectl stdin: {err}")))?;
            }
            child.wait_with_output().map_err(spawn_error)?
        } else {
            cmd.output().map_err(spawn_error)?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_kubectl_error(output.status.code().unwrap_or(-1), &stderr));
        }
        Ok(output.stdout)
    }
}

impl Default for KubectlClient {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_error(err: std::io::Error) -> ClusterError {
    ClusterError::Api(format!("failed to run kubectl: {err}"))
}

/// Map kubectl stderr onto a [`ClusterError`] by the API server's status tag.
///
/// A missing namespace is reported as `(NotFound)` too, but it says nothing
/// about the object itself and stays an API error.
fn classify_kubectl_error(exit_code: i32, stderr: &str) -> ClusterError {
    let trimmed = stderr.trim();
    let lower = trimmed.to_ascii_lowercase();

    if trimmed.contains("(AlreadyExists)") {
        return ClusterError::AlreadyExists(trimmed.to_string());
    }
    if trimmed.contains("(NotFound)") && !trimmed.contains("namespaces \"") {
        return ClusterError::NotFound(trimmed.to_string());
    }
    if let Some(idx) = lower.find("no matches for ") {
        return ClusterError::NoMatch(trimmed[idx + "no matches for ".len()..].to_string());
    }
    ClusterError::Api(format!("kubectl failed (exit {exit_code}): {trimmed}"))
}

impl ClusterClient for KubectlClient {
    fn list(
        &self,
        kind: CapabilityKind,
        namespace: &str,
        selector: Option<&str>,
    ) -> ClusterResult<Vec<DefinitionObject>> {
        let mut args = vec!["get", kind.definition_resource(), "-n", namespace, "-o", "json"];
        if let Some(selector) = selector {
            args.push("-l");
            args.push(selector);
        }
        let stdout = self.run(&args, None)?;
        let list: ObjectList = serde_json::from_slice(&stdout)
            .map_err(|err| ClusterError::Api(format!("parse kubectl output: {err}")))?;

        Ok(list
            .items
            .into_iter()
            .map(|item| DefinitionObject {
                kind,
                name: item["metadata"]["name"].as_str().unwrap_or_default().to_string(),
                namespace: namespace.to_string(),
                manifest: item,
            })
            .collect())
    }

    fn create(&self, object: &DefinitionObject) -> ClusterResult<()> {
        let body = serde_json::to_vec(&object.manifest)
            .map_err(|err| ClusterError::Api(format!("render definition: {err}")))?;
        self.run(&["create", "-n", &object.namespace, "-f", "-"], Some(&body))?;
        Ok(())
    }

    fn delete(&self, kind: CapabilityKind, name: &str, namespace: &str) -> ClusterResult<()> {
        self.run(&["delete", kind.definition_resource(), name, "-n", namespace], None)?;
        Ok(())
    }
}

impl Discovery for KubectlClient {
    fn resolve_kind(&self, reference: &str) -> ClusterResult<ResourceKindInfo> {
        let stdout = self.run(&["api-resources", "--no-headers"], None)?;
        let resources = parse_api_resources(&String::from_utf8_lossy(&stdout));
        find_resource(&resources, reference)
    }
}

/// Match `plural.group` (or a bare core plural) against discovered resources.
pub(crate) fn find_resource(
    resources: &[ApiResource],
    reference: &str,
) -> ClusterResult<ResourceKindInfo> {
    let (plural, group) = reference.split_once('.').unwrap_or((reference, ""));
    resources
        .iter()
        .find(|r| r.name == plural && r.group() == group)
        .map(|r| ResourceKindInfo::new(&r.api_version, &r.kind))
        .ok_or_else(|| ClusterError::NoMatch(reference.to_string()))
}
