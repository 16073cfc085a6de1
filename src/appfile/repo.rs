use std::path::{Path, PathBuf};

use tracing::debug;

use super::document::Application;
use crate::error::{CapError, Result};
use crate::utils::fs::{
    check_segment, list_files_with_ext, read_optional, remove_if_exists, write_atomic,
};

/// Application files under `<home>/envs/<env>/applications/<app>.yaml`.
#[derive(Debug, Clone)]
pub struct AppfileRepo {
    root: PathBuf,
}

impl AppfileRepo {
    pub fn new(home: &Path) -> Self {
        Self {
            root: home.join("envs"),
        }
    }

    #[must_use]
    pub fn path(&self, env: &str, app: &str) -> PathBuf {
        self.root
            .join(env)
            .join("applications")
            .join(format!("{app}.yaml"))
    }

    /// `path`, after checking both names are single path components.
    fn checked_path(&self, env: &str, app: &str) -> Result<PathBuf> {
        check_segment("environment", env)?;
        check_segment("application", app)?;
        Ok(self.path(env, app))
    }

    pub fn load(&self, env: &str, app: &str) -> Result<Application> {
        let path = self.checked_path(env, app)?;
        let contents = read_optional(&path)?.ok_or_else(|| {
            CapError::NotFound(format!("application {app} in env {env}"))
        })?;
        let mut application: Application = serde_yaml::from_str(&contents)?;
        if application.name.is_empty() {
            application.name = app.to_string();
        }
        Ok(application)
    }

    /// Load `app`, or start an empty document named `app`.
    pub fn load_or_empty(&self, env: &str, app: &str) -> Result<Application> {
        match self.load(env, app) {
            Err(CapError::NotFound(_)) => Ok(Application::new(app)),
            other => other,
        }
    }

    pub fn save(&self, env: &str, application: &Application) -> Result<PathBuf> {
        let path = self.checked_path(env, &application.name)?;
        let rendered = serde_yaml::to_string(application)?;
        write_atomic(&path, rendered.as_bytes())?;
        debug!(env, app = %application.name, path = %path.display(), "application saved");
        Ok(path)
    }

    pub fn delete(&self, env: &str, app: &str) -> Result<bool> {
        remove_if_exists(self.checked_path(env, app)?)
    }

    /// Application names in `env`, sorted.
    pub fn list(&self, env: &str) -> Result<Vec<String>> {
        check_segment("environment", env)?;
        let files = list_files_with_ext(self.root.join(env).join("applications"), &["yaml"])?;
        Ok(files
            .iter()
            .filter_map(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .collect())
    }
}
