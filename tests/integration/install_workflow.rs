use capkit::CapError;
use capkit::capability::catalog::{get_trait, list_traits};
use capkit::capability::{CapabilityKind, ResourceKindInfo};
use capkit::cluster::{ClusterError, ClusterOp, ErrorInjection, MockCluster};
use capkit::installer::{Installer, Step, StepOutcome};
use capkit::registry::CenterService;
use capkit::store::{CapabilityStore, FsStore};
use capkit::test_utils::{CapkitFixture, core_cluster};

fn synced(fixture: &CapkitFixture, cluster: &MockCluster) -> FsStore {
    let store = fixture.store();
    let transports = fixture.transports();
    CenterService::new(fixture.registry_path(), &store, cluster, &transports)
        .add(fixture.center_config("core"))
        .unwrap();
    store
}

#[test]
fn install_registers_and_commits() {
    let fixture = CapkitFixture::with_core_center();
    let cluster = core_cluster();
    let store = synced(&fixture, &cluster);
    let installer = Installer::new(&store, &cluster, &cluster, &cluster, "vela-system");

    let report = installer.install_target("core/webservice").unwrap();
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.outcome_of(Step::Register), Some(StepOutcome::Done));
    assert_eq!(report.outcome_of(Step::ProvisionChart), Some(StepOutcome::Skipped));

    let installed = store
        .find_installed(CapabilityKind::Workload, "webservice")
        .unwrap();
    assert_eq!(
        installed.resource_kind,
        Some(ResourceKindInfo::new("apps/v1", "Deployment"))
    );
    assert_eq!(installed.center_name(), Some("core"));
    assert!(cluster.definition(CapabilityKind::Workload, "webservice").is_some());
}

#[test]
fn trait_resolves_to_installed_workload() {
    let fixture = CapkitFixture::with_core_center();
    let cluster = core_cluster();
    let store = synced(&fixture, &cluster);
    let installer = Installer::new(&store, &cluster, &cluster, &cluster, "vela-system");
    installer.install("core", "webservice").into_result().unwrap();
    installer.install("core", "route").into_result().unwrap();

    let traits = list_traits(&store, None).unwrap();
    assert_eq!(traits.len(), 1);
    assert_eq!(traits[0].applies_to, vec!["webservice"]);

    let route = get_trait(&store, Some("webservice"), "route").unwrap();
    assert_eq!(route.name, "route");
}

#[test]
fn reinstall_tolerates_existing_definition() {
    let fixture = CapkitFixture::with_core_center();
    let cluster = core_cluster();
    let store = synced(&fixture, &cluster);
    let installer = Installer::new(&store, &cluster, &cluster, &cluster, "vela-system");

    installer.install("core", "webservice").into_result().unwrap();
    let again = installer.install("core", "webservice");
    assert!(again.is_success());
    assert_eq!(again.outcome_of(Step::Register), Some(StepOutcome::AlreadyExisted));
    assert_eq!(store.load_installed(CapabilityKind::Workload).unwrap().len(), 1);
}

#[test]
fn failed_register_leaves_nothing_committed() {
    let fixture = CapkitFixture::with_core_center();
    let cluster = core_cluster();
    let store = synced(&fixture, &cluster);
    cluster.inject_error(ErrorInjection::Create(ClusterError::Api("forbidden".into())));
    let installer = Installer::new(&store, &cluster, &cluster, &cluster, "vela-system");

    let report = installer.install("core", "webservice");
    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.step, Step::Register);
    assert_eq!(report.outcome_of(Step::ResolveKind), Some(StepOutcome::Done));
    assert!(store.load_installed(CapabilityKind::Workload).unwrap().is_empty());

    cluster.clear_errors();
    assert!(installer.install("core", "webservice").is_success());
}

#[test]
fn unknown_capability_fails_lookup() {
    let fixture = CapkitFixture::with_core_center();
    let cluster = core_cluster();
    let store = synced(&fixture, &cluster);
    let installer = Installer::new(&store, &cluster, &cluster, &cluster, "vela-system");

    let err = installer.install("core", "worker").into_result().unwrap_err();
    assert_eq!(err.to_string(), "core/worker not exist");
    assert!(installer.install_target("no-slash").is_err());
}

#[test]
fn uninstall_then_uninstall_again() {
    let fixture = CapkitFixture::with_core_center();
    let cluster = core_cluster();
    let store = synced(&fixture, &cluster);
    let installer = Installer::new(&store, &cluster, &cluster, &cluster, "vela-system");
    installer.install("core", "route").into_result().unwrap();

    let report = installer.uninstall("route");
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.outcome_of(Step::DeleteDefinition), Some(StepOutcome::Done));
    assert!(cluster.definition(CapabilityKind::Trait, "route").is_none());
    assert!(cluster.ops().contains(&ClusterOp::Delete("route".to_string())));

    let err = installer.uninstall("route").into_result().unwrap_err();
    assert!(err.is_not_found() || matches!(err, CapError::CapabilityNotFound(_)));
}
