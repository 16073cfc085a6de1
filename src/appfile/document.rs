//! Application documents: components with a workload type, workload fields
//! and per-trait field maps.
//!
//! On disk a component is one flat mapping:
//!
//! ```yaml
//! type: webservice
//! image: nginx
//! route:
//!   domain: example.dev
//! ```
//!
//! Scalars are workload fields, nested mappings are traits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::error::{CapError, Result};

/// Reserved key holding the workload capability name.
pub const TYPE_KEY: &str = "type";

pub type Fields = BTreeMap<String, Value>;

/// One top-level key of a component as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Value(Value),
    Trait(Fields),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Entry>", into = "BTreeMap<String, Entry>")]
pub struct ComponentDocument {
    /// Empty until a workload has been bound.
    pub workload_type: String,
    pub fields: Fields,
    pub traits: BTreeMap<String, Fields>,
}

impl ComponentDocument {
    #[must_use]
    pub fn new(workload_type: impl Into<String>) -> Self {
        Self {
            workload_type: workload_type.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn trait_fields(&self, name: &str) -> Option<&Fields> {
        self.traits.get(name)
    }
}

impl TryFrom<BTreeMap<String, Entry>> for ComponentDocument {
    type Error = String;

    fn try_from(entries: BTreeMap<String, Entry>) -> std::result::Result<Self, Self::Error> {
        let mut doc = Self::default();
        for (key, entry) in entries {
            match entry {
                Entry::Value(Value::String(name)) if key == TYPE_KEY => doc.workload_type = name,
                Entry::Value(other) if key == TYPE_KEY => {
                    return Err(format!("`{TYPE_KEY}` must be a string, got {other}"));
                }
                Entry::Trait(_) if key == TYPE_KEY => {
                    return Err(format!("`{TYPE_KEY}` must be a string"));
                }
                Entry::Value(value) => {
                    doc.fields.insert(key, value);
                }
                Entry::Trait(fields) => {
                    doc.traits.insert(key, fields);
                }
            }
        }
        Ok(doc)
    }
}

impl From<ComponentDocument> for BTreeMap<String, Entry> {
    fn from(doc: ComponentDocument) -> Self {
        let mut entries: Self = doc
            .fields
            .into_iter()
            .map(|(key, value)| (key, Entry::Value(value)))
            .collect();
        entries.extend(
            doc.traits
                .into_iter()
                .map(|(key, fields)| (key, Entry::Trait(fields))),
        );
        if !doc.workload_type.is_empty() {
            entries.insert(
                TYPE_KEY.to_string(),
                Entry::Value(Value::String(doc.workload_type)),
            );
        }
        entries
    }
}

/// One application file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    #[serde(default, rename = "services")]
    pub components: BTreeMap<String, ComponentDocument>,
}

impl Application {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ComponentDocument> {
        self.components.get(name)
    }

    /// Check the whole document.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CapError::ValidationFailed(
                "application name is empty".to_string(),
            ));
        }
        for (name, component) in &self.components {
            if name.trim().is_empty() {
                return Err(CapError::ValidationFailed(format!(
                    "application {} has a component without a name",
                    self.name
                )));
            }
            if component.workload_type.is_empty() {
                return Err(CapError::ValidationFailed(format!(
                    "missing {TYPE_KEY} for component {name} in application {}",
                    self.name
                )));
            }
            if component.fields.contains_key(TYPE_KEY) {
                return Err(CapError::ValidationFailed(format!(
                    "component {name} binds the reserved key {TYPE_KEY}"
                )));
            }
            if let Some(clash) = component
                .traits
                .keys()
                .find(|t| t.as_str() == TYPE_KEY || component.fields.contains_key(*t))
            {
                return Err(CapError::ValidationFailed(format!(
                    "trait {clash} of component {name} collides with a workload field"
                )));
            }
        }
        Ok(())
    }

    /// Merge workload fields into `component`, creating it if needed.
    ///
    /// The previous state of the component is restored if the result does
    /// not validate.
    pub fn set_workload(&mut self, component: &str, workload_type: &str, values: Fields) -> Result<()> {
        self.mutate_component(component, |doc| {
            doc.workload_type = workload_type.to_string();
            doc.fields.extend(values);
        })
    }

    /// Merge trait fields into `component`'s sub-document for `trait_name`.
    pub fn set_trait(&mut self, component: &str, trait_name: &str, values: Fields) -> Result<()> {
        self.mutate_component(component, |doc| {
            doc.traits
                .entry(trait_name.to_string())
                .or_default()
                .extend(values);
        })
    }

    /// Returns whether the trait was present.
    pub fn remove_trait(&mut self, component: &str, trait_name: &str) -> bool {
        self.components
            .get_mut(component)
            .is_some_and(|doc| doc.traits.remove(trait_name).is_some())
    }

    /// Returns whether the component was present.
    pub fn remove_component(&mut self, component: &str) -> bool {
        self.components.remove(component).is_some()
    }

    fn mutate_component(
        &mut self,
        component: &str,
        apply: impl FnOnce(&mut ComponentDocument),
    ) -> Result<()> {
        let previous = self.components.get(component).cloned();
        apply(self.components.entry(component.to_string()).or_default());

        if let Err(err) = self.validate() {
            match previous {
                Some(doc) => {
                    self.components.insert(component.to_string(), doc);
                }
                None => {
                    self.components.remove(component);
                }
            }
            return Err(err);
        }
        Ok(())
    }
}
