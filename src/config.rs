use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CapError, Result};

pub const DEFAULT_SYSTEM_NAMESPACE: &str = "vela-system";
pub const DEFAULT_TEMPLATE_EXT: &str = "cue";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Config {
    /// Defaults, then the global and project files (or only `explicit_path`
    /// / `CAPKIT_CONFIG`), then `CAPKIT_*` environment variables.
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("CAPKIT_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CapError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&project_root.join("config.toml"))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Root of all local state. `~/.capkit` unless configured.
    pub fn home(&self) -> Result<PathBuf> {
        if let Some(home) = &self.paths.home {
            return Ok(expand_tilde(home));
        }
        dirs::home_dir()
            .map(|home| home.join(".capkit"))
            .ok_or_else(|| CapError::MissingConfig("home directory not found".to_string()))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match dirs::config_dir() {
            Some(dir) => Self::load_patch(&dir.join("capkit/config.toml")),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| CapError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| CapError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.paths {
            self.paths.merge(patch);
        }
        if let Some(patch) = patch.cluster {
            self.cluster.merge(patch);
        }
        if let Some(patch) = patch.chart {
            self.chart.merge(patch);
        }
        if let Some(patch) = patch.registry {
            self.registry.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("CAPKIT_HOME") {
            self.paths.home = Some(value);
        }
        if let Some(value) = lookup("CAPKIT_NAMESPACE") {
            self.cluster.namespace = value;
        }
        if let Some(value) = lookup("CAPKIT_KUBECTL") {
            self.cluster.kubectl = value;
        }
        if let Some(value) = lookup("CAPKIT_KUBE_CONTEXT") {
            self.cluster.context = Some(value);
        }
        if let Some(value) = lookup("CAPKIT_HELM") {
            self.chart.helm = value;
        }
        if let Some(value) = lookup("CAPKIT_GITHUB_API") {
            self.registry.github_api = value;
        }
        if let Some(value) = lookup("CAPKIT_TEMPLATE_EXT") {
            self.registry.template_ext = value;
        }
        if let Some(value) = lookup("CAPKIT_HTTP_TIMEOUT_SECS") {
            self.registry.timeout_secs = parse_u64("CAPKIT_HTTP_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("CAPKIT_MAX_DOWNLOAD_BYTES") {
            self.registry.max_download_bytes = parse_u64("CAPKIT_MAX_DOWNLOAD_BYTES", &value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Overrides `~/.capkit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
}

impl PathsConfig {
    fn merge(&mut self, patch: PathsPatch) {
        if let Some(value) = patch.home {
            self.home = Some(value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Namespace holding definition objects.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_kubectl")]
    pub kubectl: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            kubectl: default_kubectl(),
            context: None,
        }
    }
}

impl ClusterConfig {
    fn merge(&mut self, patch: ClusterPatch) {
        if let Some(value) = patch.namespace {
            self.namespace = value;
        }
        if let Some(value) = patch.kubectl {
            self.kubectl = value;
        }
        if let Some(value) = patch.context {
            self.context = Some(value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_helm")]
    pub helm: String,
    /// Release namespace for charts that do not name one. Falls back to the
    /// cluster namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            helm: default_helm(),
            namespace: None,
        }
    }
}

impl ChartConfig {
    fn merge(&mut self, patch: ChartPatch) {
        if let Some(value) = patch.helm {
            self.helm = value;
        }
        if let Some(value) = patch.namespace {
            self.namespace = Some(value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_github_api")]
    pub github_api: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_template_ext")]
    pub template_ext: String,
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            github_api: default_github_api(),
            timeout_secs: default_timeout_secs(),
            template_ext: default_template_ext(),
            max_download_bytes: default_max_download_bytes(),
        }
    }
}

impl RegistryConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn merge(&mut self, patch: RegistryPatch) {
        if let Some(value) = patch.github_api {
            self.github_api = value;
        }
        if let Some(value) = patch.timeout_secs {
            self.timeout_secs = value;
        }
        if let Some(value) = patch.template_ext {
            self.template_ext = value;
        }
        if let Some(value) = patch.max_download_bytes {
            self.max_download_bytes = value;
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_SYSTEM_NAMESPACE.to_string()
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

fn default_helm() -> String {
    "helm".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_template_ext() -> String {
    DEFAULT_TEMPLATE_EXT.to_string()
}

const fn default_max_download_bytes() -> u64 {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub paths: Option<PathsPatch>,
    pub cluster: Option<ClusterPatch>,
    pub chart: Option<ChartPatch>,
    pub registry: Option<RegistryPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PathsPatch {
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ClusterPatch {
    pub namespace: Option<String>,
    pub kubectl: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChartPatch {
    pub helm: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RegistryPatch {
    pub github_api: Option<String>,
    pub timeout_secs: Option<u64>,
    pub template_ext: Option<String>,
    pub max_download_bytes: Option<u64>,
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|err| CapError::Config(format!("invalid {key} value {value}: {err}")))
}

fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.cluster.namespace, "vela-system");
        assert_eq!(config.cluster.kubectl, "kubectl");
        assert_eq!(config.chart.helm, "helm");
        assert_eq!(config.registry.template_ext, "cue");
        assert_eq!(config.registry.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn load_patch_nonexistent_file() {
        let result = Config::load_patch(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn partial_patch_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[cluster]
namespace = "platform"

[registry]
timeout_secs = 5
"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.merge_patch(Config::load_patch(&path).unwrap().unwrap());
        assert_eq!(config.cluster.namespace, "platform");
        assert_eq!(config.cluster.kubectl, "kubectl");
        assert_eq!(config.registry.timeout_secs, 5);
        assert_eq!(config.registry.template_ext, "cue");
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml [[[").unwrap();
        let err = Config::load_patch(&path).unwrap_err();
        assert!(matches!(err, CapError::Config(_)));
    }

    #[test]
    fn explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(Config::load(Some(&missing), temp.path()).is_err());
    }

    #[test]
    fn overrides_win_and_are_validated() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CAPKIT_HOME", "/srv/capkit"),
            ("CAPKIT_NAMESPACE", "ops"),
            ("CAPKIT_HTTP_TIMEOUT_SECS", "3"),
        ]);
        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.home().unwrap(), PathBuf::from("/srv/capkit"));
        assert_eq!(config.cluster.namespace, "ops");
        assert_eq!(config.registry.timeout_secs, 3);

        let err = config
            .apply_overrides(|key| (key == "CAPKIT_HTTP_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("invalid CAPKIT_HTTP_TIMEOUT_SECS"));
    }
}
