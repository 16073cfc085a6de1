//! The center registry file (`<home>/centers/config.toml`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CapError, Result};
use crate::utils::fs::write_atomic;

/// One registered capability center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterConfig {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl CenterConfig {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CenterRegistry {
    #[serde(default)]
    pub centers: Vec<CenterConfig>,
}

impl CenterRegistry {
    /// Load the registry; a missing file is an empty registry.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|err| {
            CapError::Config(format!("read center config {}: {err}", path.display()))
        })?;
        toml::from_str(&contents).map_err(|err| {
            CapError::Config(format!("parse center config {}: {err}", path.display()))
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let rendered = toml::to_string_pretty(self)
            .map_err(|err| CapError::Config(format!("render center config: {err}")))?;
        write_atomic(path, rendered.as_bytes())
    }

    /// Insert, or replace the center with the same name in place.
    pub fn upsert(&mut self, center: CenterConfig) {
        if let Some(existing) = self.centers.iter_mut().find(|c| c.name == center.name) {
            *existing = center;
        } else {
            self.centers.push(center);
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.centers.len();
        self.centers.retain(|c| c.name != name);
        before != self.centers.len()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CenterConfig> {
        self.centers.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}
