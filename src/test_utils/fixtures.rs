use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use crate::cluster::MockCluster;
use crate::registry::{CenterConfig, DefaultTransports};
use crate::store::FsStore;

pub const WEBSERVICE_MANIFEST: &str = r#"apiVersion: core.oam.dev/v1alpha2
kind: WorkloadDefinition
metadata:
  name: webservice
  annotations:
    definition.oam.dev/description: "Long-running service behind a Deployment"
spec:
  definitionRef:
    name: deployments.apps
  extension:
    template: |
      output: {
        apiVersion: "apps/v1"
        kind: "Deployment"
      }
      parameter: {
        // +usage=Container image
        image: string
        // +alias=p
        port: *80 | int
        replicas?: int
        env?: [...{name: string, value: string}]
      }
"#;

pub const ROUTE_MANIFEST: &str = r#"apiVersion: core.oam.dev/v1alpha2
kind: TraitDefinition
metadata:
  name: route
spec:
  appliesToWorkloads:
    - apps/v1.Deployment
  definitionRef:
    name: routes.standard.oam.dev
  extension:
    template: |
      parameter: {
        domain: string
        tls: *false | bool
      }
"#;

/// Isolated capkit home plus a local center directory.
pub struct CapkitFixture {
    pub temp_dir: TempDir,
    pub home: PathBuf,
    pub center_dir: PathBuf,
}

impl CapkitFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let home = temp_dir.path().join("home");
        let center_dir = temp_dir.path().join("center");
        std::fs::create_dir_all(&center_dir).expect("Failed to create center dir");

        println!("[FIXTURE] Created capkit home: {:?}", home);

        Self {
            temp_dir,
            home,
            center_dir,
        }
    }

    /// Fixture whose center holds `webservice` and `route`.
    pub fn with_core_center() -> Self {
        let fixture = Self::new();
        fixture.write_manifest("webservice.yaml", WEBSERVICE_MANIFEST);
        fixture.write_manifest("route.yaml", ROUTE_MANIFEST);
        fixture
    }

    pub fn store(&self) -> FsStore {
        FsStore::open(&self.home, "cue").expect("Failed to open store")
    }

    /// Write a file relative to the fixture root.
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.temp_dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Publish a manifest in the local center.
    pub fn write_manifest(&self, file_name: &str, yaml: &str) -> PathBuf {
        self.create_file(&format!("center/{file_name}"), yaml)
    }

    pub fn center_config(&self, name: &str) -> CenterConfig {
        CenterConfig::new(name, self.center_dir.display().to_string())
    }

    pub fn registry_path(&self) -> PathBuf {
        self.home.join("centers").join("config.toml")
    }

    pub fn transports(&self) -> DefaultTransports {
        DefaultTransports {
            github_api: "https://api.github.com".to_string(),
            timeout: Duration::from_secs(5),
            max_download_bytes: 1024 * 1024,
        }
    }
}

impl Default for CapkitFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CapkitFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up {:?}", self.temp_dir.path());
    }
}

/// Cluster serving the kinds behind the core center.
pub fn core_cluster() -> MockCluster {
    MockCluster::new()
        .serving("apps/v1", "Deployment")
        .serving("standard.oam.dev/v1alpha1", "Route")
}
