//! Binding user input to installed capabilities' parameters.

use tracing::debug;

use super::document::{Application, Fields};
use super::value::{Inputs, coerce};
use crate::capability::{Capability, CapabilityKind};
use crate::error::{CapError, Result};
use crate::store::CapabilityStore;

/// Workload parameter that is never taken from user input.
const RESERVED_PARAMETER: &str = "name";

pub struct Assembler<'a> {
    store: &'a dyn CapabilityStore,
}

impl<'a> Assembler<'a> {
    pub fn new(store: &'a dyn CapabilityStore) -> Self {
        Self { store }
    }

    /// Bind workload parameters into `component`.
    ///
    /// A component that already has a workload keeps its type and
    /// `workload_type` is ignored. Returns the workload type that was bound.
    pub fn bind_workload(
        &self,
        app: &mut Application,
        component: &str,
        workload_type: Option<&str>,
        inputs: &Inputs,
    ) -> Result<String> {
        let existing = app
            .component(component)
            .map(|doc| doc.workload_type.as_str())
            .filter(|t| !t.is_empty());
        let kind = match (existing, workload_type.filter(|t| !t.is_empty())) {
            (Some(existing), _) => existing.to_string(),
            (None, Some(given)) => given.to_string(),
            (None, None) => {
                return Err(CapError::ValidationFailed(format!(
                    "must specify workload type for application {component}"
                )));
            }
        };

        let capability = self.store.find_installed(CapabilityKind::Workload, &kind)?;
        let current = app.component(component).map(|doc| &doc.fields);
        let values = collect_values(&capability, inputs, current, &[RESERVED_PARAMETER])?;
        debug!(component, workload = %kind, bound = values.len(), "binding workload");
        app.set_workload(component, &kind, values)?;
        Ok(kind)
    }

    /// Bind trait parameters into `component`'s trait sub-document.
    pub fn bind_trait(
        &self,
        app: &mut Application,
        component: &str,
        trait_capability: &Capability,
        inputs: &Inputs,
    ) -> Result<()> {
        let current = app
            .component(component)
            .and_then(|doc| doc.trait_fields(&trait_capability.name));
        let values = collect_values(trait_capability, inputs, current, &[])?;
        debug!(component, r#trait = %trait_capability.name, bound = values.len(), "binding trait");
        app.set_trait(component, &trait_capability.name, values)
    }
}

/// Coerce every bindable parameter that has input.
///
/// Required parameters must be supplied unless `current` already holds a
/// value. Nothing is mutated here, so a missing or mistyped parameter leaves
/// the document untouched.
fn collect_values(
    capability: &Capability,
    inputs: &Inputs,
    current: Option<&Fields>,
    reserved: &[&str],
) -> Result<Fields> {
    let mut values = Fields::new();
    for parameter in &capability.parameters {
        let key = parameter.lookup_key();
        if reserved.contains(&key) {
            continue;
        }
        let Some(raw) = inputs.get(key) else {
            let already_set = current.is_some_and(|f| f.contains_key(&parameter.name));
            if parameter.required && !already_set {
                return Err(CapError::RequiredParameter(key.to_string()));
            }
            continue;
        };
        if let Some(value) = coerce(parameter, raw)? {
            values.insert(parameter.name.clone(), value);
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appfile::Value;
    use crate::capability::{Parameter, ParameterKind};
    use crate::store::FsStore;
    use tempfile::TempDir;

    fn store_with_webservice(home: &TempDir) -> FsStore {
        let store = FsStore::open(home.path(), "cue").unwrap();
        let mut web = Capability::new(
            "webservice",
            CapabilityKind::Workload,
            "deployments.apps",
            "parameter: {}",
        )
        .unwrap();
        web.parameters = vec![
            Parameter::new("name", ParameterKind::String, true),
            Parameter::new("image", ParameterKind::String, true),
            Parameter::new("port", ParameterKind::Int, false).with_alias("p"),
            Parameter::new("env", ParameterKind::Other, false),
        ];
        store.commit_installed(&[web]).unwrap();
        store
    }

    #[test]
    fn binds_by_alias_and_stores_under_name() {
        let home = TempDir::new().unwrap();
        let store = store_with_webservice(&home);
        let mut app = Application::new("shop");
        let inputs = Inputs::new()
            .with("image", "nginx")
            .with("p", "8080")
            .with("env", "ignored");

        let kind = Assembler::new(&store)
            .bind_workload(&mut app, "web", Some("webservice"), &inputs)
            .unwrap();

        assert_eq!(kind, "webservice");
        let web = app.component("web").unwrap();
        assert_eq!(web.fields["port"], Value::Int(8080));
        assert!(!web.fields.contains_key("p"));
        assert!(!web.fields.contains_key("env"));
        assert!(!web.fields.contains_key("name"));
    }

    #[test]
    fn missing_required_fails_before_mutation() {
        let home = TempDir::new().unwrap();
        let store = store_with_webservice(&home);
        let mut app = Application::new("shop");

        let err = Assembler::new(&store)
            .bind_workload(&mut app, "web", Some("webservice"), &Inputs::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "required flag(s) \"image\" not set");
        assert!(app.components.is_empty());
    }

    #[test]
    fn existing_type_wins_and_new_component_needs_one() {
        let home = TempDir::new().unwrap();
        let store = store_with_webservice(&home);
        let assembler = Assembler::new(&store);
        let mut app = Application::new("shop");

        let err = assembler
            .bind_workload(&mut app, "web", None, &Inputs::new())
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("must specify workload type for application web"));

        assembler
            .bind_workload(&mut app, "web", Some("webservice"), &Inputs::new().with("image", "nginx"))
            .unwrap();
        let kind = assembler
            .bind_workload(&mut app, "web", Some("worker"), &Inputs::new().with("p", "9090"))
            .unwrap();
        assert_eq!(kind, "webservice");
        assert_eq!(app.component("web").unwrap().fields["port"], Value::Int(9090));
    }

    #[test]
    fn mistyped_value_leaves_application_untouched() {
        let home = TempDir::new().unwrap();
        let store = store_with_webservice(&home);
        let assembler = Assembler::new(&store);
        let mut app = Application::new("shop");
        assembler
            .bind_workload(
                &mut app,
                "web",
                Some("webservice"),
                &Inputs::new().with("image", "nginx").with("p", "8080"),
            )
            .unwrap();
        let before = app.clone();

        let err = assembler
            .bind_workload(&mut app, "web", None, &Inputs::new().with("p", "eighty"))
            .unwrap_err();
        assert!(
            matches!(&err, CapError::TypeMismatch { parameter, .. } if parameter == "p"),
            "{err:?}"
        );
        assert_eq!(app, before);
    }

    #[test]
    fn mistyped_trait_value_leaves_application_untouched() {
        let home = TempDir::new().unwrap();
        let store = store_with_webservice(&home);
        let assembler = Assembler::new(&store);
        let mut app = Application::new("shop");
        assembler
            .bind_workload(&mut app, "web", Some("webservice"), &Inputs::new().with("image", "nginx"))
            .unwrap();
        let mut scaler = Capability::new(
            "scaler",
            CapabilityKind::Trait,
            "manualscalertraits.core.oam.dev",
            "parameter: {}",
        )
        .unwrap();
        scaler.parameters = vec![Parameter::new("replicas", ParameterKind::Int, false)];
        let before = app.clone();

        let err = assembler
            .bind_trait(&mut app, "web", &scaler, &Inputs::new().with("replicas", "many"))
            .unwrap_err();
        assert!(matches!(err, CapError::TypeMismatch { .. }), "{err:?}");
        assert_eq!(app, before);
    }
}
