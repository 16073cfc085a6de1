//! `helm`-backed chart provisioner.

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use super::ChartProvisioner;
use crate::capability::InstallDescriptor;
use crate::error::{CapError, Result};

#[derive(Debug, Clone)]
pub struct HelmProvisioner {
    binary: PathBuf,
    default_namespace: String,
}

impl HelmProvisioner {
    pub fn new(binary: impl Into<PathBuf>, default_namespace: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            default_namespace: default_namespace.into(),
        }
    }

    fn run(&self, args: &[String]) -> Result<()> {
        debug!(binary = %self.binary.display(), ?args, "running helm");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|err| CapError::Provision(format!("failed to run helm: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CapError::Provision(format!(
                "helm {} failed (exit {}): {}",
                args.first().map_or("", String::as_str),
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Arguments for an idempotent `helm upgrade --install`.
fn install_args(chart: &InstallDescriptor, namespace: &str) -> Vec<String> {
    let mut args = vec![
        "upgrade".to_string(),
        "--install".to_string(),
        chart.name.clone(),
        chart.name.clone(),
        "--namespace".to_string(),
        namespace.to_string(),
        "--create-namespace".to_string(),
    ];
    if !chart.url.is_empty() {
        args.push("--repo".to_string());
        args.push(chart.url.clone());
    }
    if !chart.version.is_empty() {
        args.push("--version".to_string());
        args.push(chart.version.clone());
    }
    args
}

impl ChartProvisioner for HelmProvisioner {
    fn install(&self, chart: &InstallDescriptor) -> Result<()> {
        let namespace = chart
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(&self.default_namespace);
        info!(chart = %chart.name, version = %chart.version, namespace, "installing chart");
        self.run(&install_args(chart, namespace)).map_err(|err| {
            CapError::Provision(format!("unable to install helm chart dependency {}: {err}", chart.name))
        })
    }

    fn uninstall(&self, name: &str, namespace: &str, release_label: &str) -> Result<()> {
        info!(chart = name, namespace, capability = release_label, "uninstalling chart");
        self.run(&[
            "uninstall".to_string(),
            name.to_string(),
            "--namespace".to_string(),
            namespace.to_string(),
        ])
    }
}
