use capkit::CapError;
use capkit::capability::catalog::list_center_capabilities;
use capkit::capability::{CapabilityKind, InstallStatus, ResourceKindInfo};
use capkit::registry::CenterService;
use capkit::store::CapabilityStore;
use capkit::test_utils::{CapkitFixture, core_cluster};

#[test]
fn add_center_syncs_every_manifest() {
    let fixture = CapkitFixture::with_core_center();
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = fixture.transports();
    let centers = CenterService::new(fixture.registry_path(), &store, &cluster, &transports);

    let report = centers.add(fixture.center_config("core")).unwrap();
    assert_eq!(report.center, "core");
    assert_eq!(report.synced, vec!["route", "webservice"]);
    assert!(report.errors.is_empty());

    let cached = store.load_center("core").unwrap();
    let webservice = cached.iter().find(|c| c.name == "webservice").unwrap();
    assert_eq!(webservice.kind, CapabilityKind::Workload);
    assert_eq!(
        webservice.resource_kind,
        Some(ResourceKindInfo::new("apps/v1", "Deployment"))
    );
    assert_eq!(webservice.center.as_deref(), Some("core"));
    assert!(webservice.parameter("image").is_some_and(|p| p.required));

    assert_eq!(centers.list().unwrap().len(), 1);
}

#[test]
fn broken_manifest_is_reported_not_fatal() {
    let fixture = CapkitFixture::with_core_center();
    fixture.write_manifest(
        "broken.yaml",
        "apiVersion: core.oam.dev/v1alpha2\nkind: TraitDefinition\nmetadata:\n  name: broken\nspec:\n  definitionRef:\n    name: broken.example.dev\n  extension:\n    templateURI: missing.cue\n",
    );
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = fixture.transports();
    let centers = CenterService::new(fixture.registry_path(), &store, &cluster, &transports);

    let report = centers.add(fixture.center_config("core")).unwrap();
    assert_eq!(report.synced, vec!["route", "webservice"]);
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn listing_marks_installed_capabilities() {
    let fixture = CapkitFixture::with_core_center();
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = fixture.transports();
    let centers = CenterService::new(fixture.registry_path(), &store, &cluster, &transports);
    centers.add(fixture.center_config("core")).unwrap();

    let cached = store.load_center("core").unwrap();
    let webservice = cached.into_iter().find(|c| c.name == "webservice").unwrap();
    store.commit_installed(&[webservice]).unwrap();

    let views = list_center_capabilities(&store, Some("core")).unwrap();
    let status_of = |name: &str| views.iter().find(|v| v.name == name).unwrap().status;
    assert_eq!(status_of("webservice"), InstallStatus::Installed);
    assert_eq!(status_of("route"), InstallStatus::Uninstalled);
}

#[test]
fn sync_unknown_center_fails() {
    let fixture = CapkitFixture::with_core_center();
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = fixture.transports();
    let centers = CenterService::new(fixture.registry_path(), &store, &cluster, &transports);

    assert!(matches!(
        centers.sync(None).unwrap_err(),
        CapError::NoCenterConfigured
    ));

    centers.add(fixture.center_config("core")).unwrap();
    let err = centers.sync(Some("extra")).unwrap_err();
    assert!(matches!(err, CapError::CenterNotFound(_)));
}

#[test]
fn remove_center_drops_cache_and_registration() {
    let fixture = CapkitFixture::with_core_center();
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = fixture.transports();
    let centers = CenterService::new(fixture.registry_path(), &store, &cluster, &transports);
    centers.add(fixture.center_config("core")).unwrap();

    centers.remove("core").unwrap();
    assert!(centers.list().unwrap().is_empty());
    assert!(store.list_centers().unwrap().is_empty());
}

#[test]
fn center_names_must_be_plain() {
    let fixture = CapkitFixture::with_core_center();
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = fixture.transports();
    let centers = CenterService::new(fixture.registry_path(), &store, &cluster, &transports);
    centers.add(fixture.center_config("core")).unwrap();
    let cached = store.load_center("core").unwrap();
    store.commit_installed(&cached).unwrap();

    for name in ["..", "", "core/../..", "."] {
        let err = centers.add(fixture.center_config(name)).unwrap_err();
        assert!(matches!(err, CapError::ValidationFailed(_)), "{name:?}: {err}");
        let err = centers.remove(name).unwrap_err();
        assert!(matches!(err, CapError::ValidationFailed(_)), "{name:?}: {err}");
    }

    assert_eq!(centers.list().unwrap().len(), 1);
    assert_eq!(store.load_center("core").unwrap().len(), 2);
    assert_eq!(store.load_all_installed().unwrap().len(), 2);
}

#[test]
fn manifest_with_path_name_is_skipped() {
    let fixture = CapkitFixture::with_core_center();
    fixture.write_manifest(
        "escape.yaml",
        &capkit::test_utils::ROUTE_MANIFEST.replace("name: route\n", "name: ../../escape\n"),
    );
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = fixture.transports();
    let centers = CenterService::new(fixture.registry_path(), &store, &cluster, &transports);

    let report = centers.add(fixture.center_config("core")).unwrap();
    assert_eq!(report.synced, vec!["route", "webservice"]);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("invalid definition name"));
    assert!(!fixture.home.join("escape.yaml").exists());
}
