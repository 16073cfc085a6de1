use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use capkit::registry::{CenterConfig, CenterService, DefaultTransports};
use capkit::store::CapabilityStore;
use capkit::test_utils::{CapkitFixture, ROUTE_MANIFEST, WEBSERVICE_MANIFEST, core_cluster};

fn transports(server: &MockServer) -> DefaultTransports {
    DefaultTransports {
        github_api: server.base_url(),
        timeout: Duration::from_secs(5),
        max_download_bytes: 64 * 1024,
    }
}

#[test]
fn syncs_center_from_github_contents() {
    let server = MockServer::start();
    let listing = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/oam-dev/catalog/contents/registry")
            .header("authorization", "Bearer s3cret");
        then.status(200).json_body(json!([
            {"name": "webservice.yaml", "type": "file", "download_url": server.url("/raw/webservice.yaml")},
            {"name": "route.yaml", "type": "file", "download_url": server.url("/raw/route.yaml")},
            {"name": "README.md", "type": "file", "download_url": server.url("/raw/README.md")},
            {"name": "drafts", "type": "dir", "download_url": null}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/raw/webservice.yaml");
        then.status(200).body(WEBSERVICE_MANIFEST);
    });
    server.mock(|when, then| {
        when.method(GET).path("/raw/route.yaml");
        then.status(200).body(ROUTE_MANIFEST);
    });

    let fixture = CapkitFixture::new();
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = transports(&server);
    let centers = CenterService::new(fixture.registry_path(), &store, &cluster, &transports);

    let center = CenterConfig::new("catalog", "https://github.com/oam-dev/catalog/tree/master/registry")
        .with_token(Some("s3cret".to_string()));
    let report = centers.add(center).unwrap();

    listing.assert();
    assert_eq!(report.synced, vec!["webservice", "route"]);
    assert_eq!(store.load_center("catalog").unwrap().len(), 2);
}

#[test]
fn listing_failure_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/oam-dev/missing/contents/");
        then.status(404);
    });

    let fixture = CapkitFixture::new();
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = transports(&server);
    let centers = CenterService::new(fixture.registry_path(), &store, &cluster, &transports);

    let err = centers
        .add(CenterConfig::new("missing", "https://github.com/oam-dev/missing"))
        .unwrap_err();
    assert!(err.to_string().contains("404"), "{err}");
    // The registration survives a failed sync.
    assert_eq!(centers.list().unwrap().len(), 1);
}

#[test]
fn failed_download_is_reported_per_manifest() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/oam-dev/catalog/contents/");
        then.status(200).json_body(json!([
            {"name": "broken.yaml", "type": "file", "download_url": server.url("/raw/broken.yaml")},
            {"name": "webservice.yaml", "type": "file", "download_url": server.url("/raw/webservice.yaml")}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/raw/broken.yaml");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/raw/webservice.yaml");
        then.status(200).body(WEBSERVICE_MANIFEST);
    });

    let fixture = CapkitFixture::new();
    let store = fixture.store();
    let cluster = core_cluster();
    let transports = transports(&server);
    let centers = CenterService::new(fixture.registry_path(), &store, &cluster, &transports);

    let report = centers
        .add(CenterConfig::new("catalog", "https://github.com/oam-dev/catalog"))
        .unwrap();

    assert_eq!(report.synced, vec!["webservice"]);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("broken.yaml"), "{:?}", report.errors);
    assert!(report.errors[0].contains("500"), "{:?}", report.errors);
    let cached = store.load_center("catalog").unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name, "webservice");
}
