//! Load, assemble, save: the application edits exposed on the command line.
//!
//! The application name defaults to the component name, so a single
//! component app needs no extra flag.

use tracing::info;

use super::assembler::Assembler;
use super::document::Application;
use super::repo::AppfileRepo;
use super::value::Inputs;
use crate::capability::catalog::get_trait;
use crate::error::{CapError, Result};
use crate::store::CapabilityStore;

pub struct AppWorkflow<'a> {
    repo: &'a AppfileRepo,
    store: &'a dyn CapabilityStore,
    env: String,
}

impl<'a> AppWorkflow<'a> {
    pub fn new(repo: &'a AppfileRepo, store: &'a dyn CapabilityStore, env: impl Into<String>) -> Self {
        Self {
            repo,
            store,
            env: env.into(),
        }
    }

    /// Create or update `component` with a workload.
    pub fn run(
        &self,
        component: &str,
        app: Option<&str>,
        workload_type: Option<&str>,
        inputs: &Inputs,
    ) -> Result<Application> {
        let app_name = app.unwrap_or(component);
        let mut application = self.repo.load_or_empty(&self.env, app_name)?;
        let kind = Assembler::new(self.store).bind_workload(
            &mut application,
            component,
            workload_type,
            inputs,
        )?;
        self.repo.save(&self.env, &application)?;
        info!(env = %self.env, app = app_name, component, workload = %kind, "component saved");
        Ok(application)
    }

    /// Attach (or update) a trait on an existing component.
    ///
    /// The trait must be installed and applicable to the component's
    /// workload.
    pub fn attach_trait(
        &self,
        component: &str,
        app: Option<&str>,
        trait_name: &str,
        inputs: &Inputs,
    ) -> Result<Application> {
        let app_name = app.unwrap_or(component);
        let mut application = self.repo.load(&self.env, app_name)?;
        let workload = application
            .component(component)
            .map(|doc| doc.workload_type.clone())
            .ok_or_else(|| CapError::ComponentNotFound {
                application: app_name.to_string(),
                component: component.to_string(),
            })?;

        let capability = get_trait(self.store, Some(&workload), trait_name)?;
        Assembler::new(self.store).bind_trait(&mut application, component, &capability, inputs)?;
        self.repo.save(&self.env, &application)?;
        info!(env = %self.env, app = app_name, component, r#trait = trait_name, "trait attached");
        Ok(application)
    }

    pub fn detach_trait(
        &self,
        component: &str,
        app: Option<&str>,
        trait_name: &str,
    ) -> Result<Application> {
        let app_name = app.unwrap_or(component);
        let mut application = self.repo.load(&self.env, app_name)?;
        let removed = application.remove_trait(component, trait_name);
        self.repo.save(&self.env, &application)?;
        info!(env = %self.env, app = app_name, component, r#trait = trait_name, removed, "trait detached");
        Ok(application)
    }

    /// Remove a component from its application file.
    ///
    /// Cluster resources created for the component are left alone.
    pub fn delete_component(&self, component: &str, app: Option<&str>) -> Result<bool> {
        let app_name = app.unwrap_or(component);
        let mut application = self.repo.load(&self.env, app_name)?;
        let removed = application.remove_component(component);
        self.repo.save(&self.env, &application)?;
        info!(env = %self.env, app = app_name, component, removed, "component deleted");
        Ok(removed)
    }

    pub fn show(&self, app: &str) -> Result<Application> {
        self.repo.load(&self.env, app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appfile::Value;
    use crate::capability::{Capability, CapabilityKind, Parameter, ParameterKind, ResourceKindInfo};
    use crate::store::FsStore;
    use tempfile::TempDir;

    fn installed(home: &TempDir) -> FsStore {
        let store = FsStore::open(home.path(), "cue").unwrap();
        let mut web = Capability::new(
            "webservice",
            CapabilityKind::Workload,
            "deployments.apps",
            "parameter: {}",
        )
        .unwrap();
        web.parameters = vec![Parameter::new("image", ParameterKind::String, true)];
        web.resource_kind = Some(ResourceKindInfo::new("apps/v1", "Deployment"));

        let mut route = Capability::new(
            "route",
            CapabilityKind::Trait,
            "routes.standard.oam.dev",
            "parameter: {}",
        )
        .unwrap();
        route.applies_to = vec!["apps/v1.Deployment".into()];
        route.parameters = vec![
            Parameter::new("domain", ParameterKind::String, true),
            Parameter::new("tls", ParameterKind::Bool, false),
        ];

        let mut backup = Capability::new(
            "backup",
            CapabilityKind::Trait,
            "backups.example.dev",
            "parameter: {}",
        )
        .unwrap();
        backup.applies_to = vec!["batch/v1.Job".into()];

        store.commit_installed(&[web, route, backup]).unwrap();
        store
    }

    #[test]
    fn run_attach_detach_delete() {
        let home = TempDir::new().unwrap();
        let store = installed(&home);
        let repo = AppfileRepo::new(home.path());
        let flow = AppWorkflow::new(&repo, &store, "default");

        flow.run("web", None, Some("webservice"), &Inputs::new().with("image", "nginx"))
            .unwrap();
        let app = flow
            .attach_trait(
                "web",
                None,
                "route",
                &Inputs::new().with("domain", "shop.dev").with("tls", "true"),
            )
            .unwrap();
        assert_eq!(
            app.component("web").unwrap().trait_fields("route").unwrap()["tls"],
            Value::Bool(true)
        );
        assert_eq!(repo.load("default", "web").unwrap(), app);

        let app = flow.detach_trait("web", None, "route").unwrap();
        assert!(app.component("web").unwrap().traits.is_empty());

        assert!(flow.delete_component("web", None).unwrap());
        assert!(!flow.delete_component("web", None).unwrap());
        assert!(flow.show("web").unwrap().components.is_empty());
    }

    #[test]
    fn attach_rejects_inapplicable_trait_and_unknown_component() {
        let home = TempDir::new().unwrap();
        let store = installed(&home);
        let repo = AppfileRepo::new(home.path());
        let flow = AppWorkflow::new(&repo, &store, "default");
        flow.run("web", Some("shop"), Some("webservice"), &Inputs::new().with("image", "nginx"))
            .unwrap();

        let err = flow
            .attach_trait("web", Some("shop"), "backup", &Inputs::new())
            .unwrap_err();
        assert!(err.to_string().contains("could not get installed capability by backup"));

        let err = flow
            .attach_trait("api", Some("shop"), "route", &Inputs::new().with("domain", "x"))
            .unwrap_err();
        assert!(matches!(err, CapError::ComponentNotFound { .. }));
    }
}
