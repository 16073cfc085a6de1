use std::path::{Path, PathBuf};

use tracing::debug;

use super::CapabilityStore;
use crate::capability::{Capability, CapabilityKind};
use crate::error::{CapError, Result};
use crate::utils::fs::{
    check_segment, ensure_dir, list_files_with_ext, remove_if_exists, write_atomic,
};

const TEMPLATE_DIR: &str = ".tmp";

/// Filesystem store rooted at the capkit home.
///
/// ```text
/// <home>/centers/<center>/<name>.yaml
/// <home>/centers/<center>/.tmp/<name>.<ext>
/// <home>/capabilities/{workloads,traits,scopes}/<name>
/// <home>/capabilities/.tmp/<name>.<ext>
/// ```
#[derive(Debug, Clone)]
pub struct FsStore {
    centers_dir: PathBuf,
    installed_dir: PathBuf,
    template_ext: String,
}

impl FsStore {
    pub fn open(home: &Path, template_ext: impl Into<String>) -> Result<Self> {
        let store = Self {
            centers_dir: home.join("centers"),
            installed_dir: home.join("capabilities"),
            template_ext: template_ext.into(),
        };
        ensure_dir(&store.centers_dir)?;
        for kind in CapabilityKind::ALL {
            ensure_dir(store.installed_dir.join(kind.dir_name()))?;
        }
        Ok(store)
    }

    #[must_use]
    pub fn centers_dir(&self) -> &Path {
        &self.centers_dir
    }

    /// Cache directory of `center`. Names that would leave `centers/` fail.
    pub fn center_dir(&self, center: &str) -> Result<PathBuf> {
        check_segment("center", center)?;
        Ok(self.centers_dir.join(center))
    }

    fn installed_path(&self, kind: CapabilityKind, name: &str) -> Result<PathBuf> {
        check_segment("capability", name)?;
        Ok(self.installed_dir.join(kind.dir_name()).join(name))
    }

    fn read_capability(path: &Path) -> Result<Capability> {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|err| {
            CapError::InvalidCapability(format!("{}: {err}", path.display()))
        })
    }

    fn write_capability(path: &Path, capability: &Capability) -> Result<()> {
        let rendered = serde_yaml::to_string(capability)?;
        write_atomic(path, rendered.as_bytes())
    }
}

impl CapabilityStore for FsStore {
    fn load_center(&self, center: &str) -> Result<Vec<Capability>> {
        let files = list_files_with_ext(self.center_dir(center)?, &["yaml", "yml"])?;
        let mut caps = files
            .iter()
            .map(|path| Self::read_capability(path))
            .collect::<Result<Vec<_>>>()?;
        caps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(caps)
    }

    fn save_center_capability(&self, center: &str, capability: &Capability) -> Result<()> {
        check_segment("capability", &capability.name)?;
        let path = self
            .center_dir(center)?
            .join(format!("{}.yaml", capability.name));
        debug!(center, capability = %capability.name, path = %path.display(), "caching capability");
        Self::write_capability(&path, capability)
    }

    fn write_template(&self, center: Option<&str>, name: &str, body: &str) -> Result<PathBuf> {
        check_segment("capability", name)?;
        let base = match center {
            Some(center) => self.center_dir(center)?,
            None => self.installed_dir.clone(),
        };
        let path = base
            .join(TEMPLATE_DIR)
            .join(format!("{name}.{}", self.template_ext));
        write_atomic(&path, body.as_bytes())?;
        Ok(path)
    }

    fn init_center(&self, center: &str) -> Result<()> {
        ensure_dir(self.center_dir(center)?)
    }

    fn list_centers(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.centers_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn remove_center(&self, center: &str) -> Result<()> {
        let dir = self.center_dir(center)?;
        if !dir.is_dir() {
            return Err(CapError::NotFound(format!(
                "{center} capability center has not successfully synced"
            )));
        }
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    fn load_installed(&self, kind: CapabilityKind) -> Result<Vec<Capability>> {
        let dir = self.installed_dir.join(kind.dir_name());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut caps = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_temp = path.extension().is_some_and(|ext| ext == "tmp");
            if path.is_file() && !is_temp {
                caps.push(Self::read_capability(&path)?);
            }
        }
        caps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(caps)
    }

    fn find_installed(&self, kind: CapabilityKind, name: &str) -> Result<Capability> {
        let path = self.installed_path(kind, name)?;
        if !path.is_file() {
            return Err(CapError::CapabilityNotFound(name.to_string()));
        }
        Self::read_capability(&path)
    }

    fn commit_installed(&self, capabilities: &[Capability]) -> Result<usize> {
        for capability in capabilities {
            let path = self.installed_path(capability.kind, &capability.name)?;
            Self::write_capability(&path, capability)?;
        }
        Ok(capabilities.len())
    }

    fn remove_installed(&self, kind: CapabilityKind, name: &str) -> Result<()> {
        let removed = remove_if_exists(self.installed_path(kind, name)?)?;
        debug!(%kind, name, removed, "removed installed capability");
        Ok(())
    }
}
