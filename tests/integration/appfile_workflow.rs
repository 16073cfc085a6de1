use capkit::CapError;
use capkit::appfile::{AppWorkflow, AppfileRepo, Inputs, Value};
use capkit::installer::Installer;
use capkit::registry::CenterService;
use capkit::store::FsStore;
use capkit::test_utils::{CapkitFixture, core_cluster};

fn installed_store(fixture: &CapkitFixture) -> FsStore {
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = fixture.transports();
    CenterService::new(fixture.registry_path(), &store, &cluster, &transports)
        .add(fixture.center_config("core"))
        .unwrap();
    let installer = Installer::new(&store, &cluster, &cluster, &cluster, "vela-system");
    installer.install("core", "webservice").into_result().unwrap();
    installer.install("core", "route").into_result().unwrap();
    store
}

#[test]
fn run_binds_and_persists_component() {
    let fixture = CapkitFixture::with_core_center();
    let store = installed_store(&fixture);
    let repo = AppfileRepo::new(&fixture.home);
    let workflow = AppWorkflow::new(&repo, &store, "default");

    let inputs = Inputs::from_pairs(["image=nginx:1.25", "p=8080"]).unwrap();
    workflow
        .run("frontend", Some("shop"), Some("webservice"), &inputs)
        .unwrap();

    let app = workflow.show("shop").unwrap();
    let doc = app.component("frontend").unwrap();
    assert_eq!(doc.workload_type, "webservice");
    assert_eq!(doc.fields["image"], Value::String("nginx:1.25".into()));
    assert_eq!(doc.fields["port"], Value::Int(8080));
    assert!(repo.path("default", "shop").is_file());
}

#[test]
fn missing_required_parameter_writes_nothing() {
    let fixture = CapkitFixture::with_core_center();
    let store = installed_store(&fixture);
    let repo = AppfileRepo::new(&fixture.home);
    let workflow = AppWorkflow::new(&repo, &store, "default");

    let err = workflow
        .run("frontend", None, Some("webservice"), &Inputs::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "required flag(s) \"image\" not set");
    assert!(!repo.path("default", "frontend").exists());
}

#[test]
fn new_component_needs_workload_type() {
    let fixture = CapkitFixture::with_core_center();
    let store = installed_store(&fixture);
    let repo = AppfileRepo::new(&fixture.home);
    let workflow = AppWorkflow::new(&repo, &store, "default");

    let err = workflow
        .run("frontend", None, None, &Inputs::new().with("image", "nginx"))
        .unwrap_err();
    assert!(matches!(err, CapError::ValidationFailed(_)));
    assert!(err.to_string().contains("must specify workload type"));
}

#[test]
fn bool_text_is_coerced() {
    let fixture = CapkitFixture::with_core_center();
    let store = installed_store(&fixture);
    let repo = AppfileRepo::new(&fixture.home);
    let workflow = AppWorkflow::new(&repo, &store, "default");
    workflow
        .run("frontend", None, Some("webservice"), &Inputs::new().with("image", "nginx"))
        .unwrap();

    let inputs = Inputs::from_pairs(["domain=shop.example.dev", "tls=true"]).unwrap();
    let app = workflow
        .attach_trait("frontend", None, "route", &inputs)
        .unwrap();
    let route = app
        .component("frontend")
        .and_then(|doc| doc.trait_fields("route"))
        .unwrap();
    assert_eq!(route["tls"], Value::Bool(true));
    assert_eq!(route["domain"], Value::String("shop.example.dev".into()));
}

#[test]
fn detach_restores_component() {
    let fixture = CapkitFixture::with_core_center();
    let store = installed_store(&fixture);
    let repo = AppfileRepo::new(&fixture.home);
    let workflow = AppWorkflow::new(&repo, &store, "default");
    let before = workflow
        .run("frontend", None, Some("webservice"), &Inputs::new().with("image", "nginx"))
        .unwrap();

    workflow
        .attach_trait(
            "frontend",
            None,
            "route",
            &Inputs::new().with("domain", "a.example.dev"),
        )
        .unwrap();
    let after = workflow.detach_trait("frontend", None, "route").unwrap();
    assert_eq!(after, before);

    // Detaching twice is a no-op.
    assert_eq!(workflow.detach_trait("frontend", None, "route").unwrap(), before);
}

#[test]
fn bad_number_reports_parse_error() {
    let fixture = CapkitFixture::with_core_center();
    let store = installed_store(&fixture);
    let repo = AppfileRepo::new(&fixture.home);
    let workflow = AppWorkflow::new(&repo, &store, "default");

    let inputs = Inputs::from_pairs(["image=nginx", "p=eighty"]).unwrap();
    let err = workflow
        .run("frontend", None, Some("webservice"), &inputs)
        .unwrap_err();
    assert!(matches!(err, CapError::TypeMismatch { .. }));
    assert!(err.to_string().starts_with("get flag(s) \"p\" err"));
}

#[test]
fn saved_file_layout() {
    let fixture = CapkitFixture::with_core_center();
    let store = installed_store(&fixture);
    let repo = AppfileRepo::new(&fixture.home);
    let workflow = AppWorkflow::new(&repo, &store, "default");
    workflow
        .run(
            "frontend",
            Some("shop"),
            Some("webservice"),
            &Inputs::from_pairs(["image=nginx", "p=8080"]).unwrap(),
        )
        .unwrap();
    workflow
        .attach_trait(
            "frontend",
            Some("shop"),
            "route",
            &Inputs::new().with("domain", "a.example.dev"),
        )
        .unwrap();

    let saved = std::fs::read_to_string(repo.path("default", "shop")).unwrap();
    insta::assert_snapshot!(saved, @r"
    name: shop
    services:
      frontend:
        image: nginx
        port: 8080
        route:
          domain: a.example.dev
        type: webservice
    ");
}
