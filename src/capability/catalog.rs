//! Read-side queries over the local store.

use serde::Serialize;

use super::applicability::{resolve, resolve_traits};
use super::types::{Capability, CapabilityKind, InstallStatus};
use crate::error::{CapError, Result};
use crate::store::CapabilityStore;

/// Split a `<center>/<name>` address.
pub fn parse_center_address(target: &str) -> Result<(&str, &str)> {
    match target.split_once('/') {
        Some((center, name)) if !center.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((center, name))
        }
        _ => Err(CapError::Config(format!(
            "invalid format for {target}, please follow format <center>/<name>"
        ))),
    }
}

/// Installed traits with `applies_to` resolved against installed workloads.
///
/// With `workload` set, only traits attachable to that workload are returned.
pub fn list_traits(store: &dyn CapabilityStore, workload: Option<&str>) -> Result<Vec<Capability>> {
    let workloads = store.load_installed(CapabilityKind::Workload)?;
    let traits = store.load_installed(CapabilityKind::Trait)?;
    Ok(resolve_traits(traits, &workloads, workload))
}

/// Exactly one installed trait named `name`, narrowed to `workload` if given.
pub fn get_trait(
    store: &dyn CapabilityStore,
    workload: Option<&str>,
    name: &str,
) -> Result<Capability> {
    let mut matches: Vec<Capability> = list_traits(store, workload)?
        .into_iter()
        .filter(|t| t.name == name)
        .collect();
    if matches.len() != 1 {
        return Err(CapError::NotFound(format!(
            "could not get installed capability by {name}"
        )));
    }
    Ok(matches.remove(0))
}

/// One row of `capkit cap list`.
#[derive(Debug, Clone, Serialize)]
pub struct CenterCapabilityView {
    pub center: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CapabilityKind,
    pub definition: String,
    pub status: InstallStatus,
    pub applies_to: Vec<String>,
    pub description: String,
}

/// Synced capabilities of one center, or of every center, with install status.
///
/// A capability counts as installed when the installed copy came from the
/// same center and backs the same resource.
pub fn list_center_capabilities(
    store: &dyn CapabilityStore,
    center: Option<&str>,
) -> Result<Vec<CenterCapabilityView>> {
    let centers = match center {
        Some(name) => vec![name.to_string()],
        None => store.list_centers()?,
    };
    let installed = store.load_all_installed()?;
    let installed_workloads: Vec<Capability> = installed
        .iter()
        .filter(|c| c.kind == CapabilityKind::Workload)
        .cloned()
        .collect();

    let mut views = Vec::new();
    for center_name in centers {
        let caps = store.load_center(&center_name)?;
        let mut known_workloads = installed_workloads.clone();
        known_workloads.extend(
            caps.iter()
                .filter(|c| c.kind == CapabilityKind::Workload)
                .cloned(),
        );

        for cap in caps {
            let is_installed = installed.iter().any(|i| {
                i.name == cap.name
                    && i.crd_name == cap.crd_name
                    && i.center_name() == Some(center_name.as_str())
            });
            views.push(CenterCapabilityView {
                center: center_name.clone(),
                applies_to: resolve(&cap.applies_to, &known_workloads),
                definition: cap.crd_name.clone(),
                status: if is_installed {
                    InstallStatus::Installed
                } else {
                    InstallStatus::Uninstalled
                },
                description: cap.description_or_default().to_string(),
                kind: cap.kind,
                name: cap.name,
            });
        }
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Source;
    use crate::store::FsStore;
    use tempfile::TempDir;

    fn workload(name: &str) -> Capability {
        Capability::new(name, CapabilityKind::Workload, "deployments.apps", "output: {}").unwrap()
    }

    fn route() -> Capability {
        let mut cap =
            Capability::new("route", CapabilityKind::Trait, "routes.standard.oam.dev", "output: {}")
                .unwrap();
        cap.applies_to = vec!["apps/v1.Deployment".to_string()];
        cap
    }

    #[test]
    fn center_address_format() {
        assert_eq!(parse_center_address("core/route").unwrap(), ("core", "route"));
        let err = parse_center_address("route").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Config error: invalid format for route, please follow format <center>/<name>"
        );
        assert!(parse_center_address("a/b/c").is_err());
    }

    #[test]
    fn get_trait_requires_single_applicable_match() {
        let temp = TempDir::new().unwrap();
        let store = FsStore::open(temp.path(), "cue").unwrap();
        store
            .commit_installed(&[workload("webservice"), route()])
            .unwrap();

        let found = get_trait(&store, Some("webservice"), "route").unwrap();
        assert_eq!(found.applies_to, vec!["webservice"]);

        let err = get_trait(&store, Some("task"), "route").unwrap_err();
        assert!(err.to_string().contains("could not get installed capability by route"));
    }

    #[test]
    fn center_listing_marks_installed_copies() {
        let temp = TempDir::new().unwrap();
        let store = FsStore::open(temp.path(), "cue").unwrap();
        store.save_center_capability("core", &workload("webservice")).unwrap();
        store.save_center_capability("core", &route()).unwrap();

        let mut installed = workload("webservice");
        installed.source = Some(Source {
            center_name: Some("core".to_string()),
            chart_name: None,
        });
        store.commit_installed(&[installed]).unwrap();

        let views = list_center_capabilities(&store, Some("core")).unwrap();
        let route_view = views.iter().find(|v| v.name == "route").unwrap();
        let web_view = views.iter().find(|v| v.name == "webservice").unwrap();
        assert_eq!(web_view.status, InstallStatus::Installed);
        assert_eq!(route_view.status, InstallStatus::Uninstalled);
        assert_eq!(route_view.applies_to, vec!["webservice"]);
        assert_eq!(route_view.description, "description not defined");
    }
}
