//! Property-based tests for applicability resolution and document editing.

use proptest::prelude::*;

use capkit::appfile::{Application, Fields, Value};
use capkit::capability::applicability::resolve;
use capkit::capability::{Capability, CapabilityKind};

fn workloads() -> Vec<Capability> {
    [
        ("webservice", "deployments.apps"),
        ("worker", "deployments.apps"),
        ("task", "jobs.batch"),
        ("cron", "cronjobs.batch"),
    ]
    .into_iter()
    .map(|(name, crd)| {
        Capability::new(name, CapabilityKind::Workload, crd, "output: {}").expect("workload")
    })
    .collect()
}

fn arb_applies_to() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            Just("apps/v1.Deployment".to_string()),
            Just("batch/v1.Job".to_string()),
            Just("deployments.apps".to_string()),
            Just("cronjobs.batch".to_string()),
            Just("task".to_string()),
            Just("unknown.example.dev".to_string()),
        ],
        0..6,
    )
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        "[a-z0-9.-]{0,16}".prop_map(Value::String),
    ]
}

fn arb_fields() -> impl Strategy<Value = Fields> {
    prop::collection::btree_map("[a-z]{1,8}", arb_value(), 0..4)
        .prop_filter("`type` is reserved", |fields| !fields.contains_key("type"))
}

proptest! {
    #[test]
    fn resolve_ignores_workload_order(applies_to in arb_applies_to(), seed in any::<u64>()) {
        let forward = workloads();
        let mut shuffled = forward.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();

        prop_assert_eq!(resolve(&applies_to, &forward), resolve(&applies_to, &shuffled));
    }

    #[test]
    fn resolve_has_no_duplicates(applies_to in arb_applies_to()) {
        let resolved = resolve(&applies_to, &workloads());
        let mut deduped = resolved.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), resolved.len());
    }

    #[test]
    fn set_then_remove_trait_restores(
        workload_fields in arb_fields(),
        trait_fields in arb_fields(),
    ) {
        let mut app = Application::new("shop");
        app.set_workload("frontend", "webservice", workload_fields.clone()).expect("workload");
        let before = app.clone();

        // "zz-route" never collides with the lowercase-only field names.
        if app.set_trait("frontend", "zz-route", trait_fields).is_ok() {
            prop_assert!(app.remove_trait("frontend", "zz-route"));
        }
        prop_assert_eq!(app, before);
    }
}
