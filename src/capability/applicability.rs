//! Trait-to-workload applicability.
//!
//! A trait declares the resource kinds it attaches to as `group/Version.Kind`
//! entries. Resolution turns each entry into the `plural.group` resource name
//! and matches it against installed workloads.

use std::collections::BTreeSet;

use super::types::Capability;

/// Kinds whose plural the suffix rules below get wrong.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("endpoints", "endpoints"),
    ("podsecuritypolicy", "podsecuritypolicies"),
    ("networkpolicy", "networkpolicies"),
];

/// Lowercase plural of a kind name, as the API server names resources.
#[must_use]
pub fn pluralize_kind(kind: &str) -> String {
    let lower = kind.to_lowercase();

    for (singular, plural) in IRREGULAR_PLURALS {
        if *singular == lower {
            return (*plural).to_string();
        }
    }

    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{lower}es")
    } else {
        match lower.strip_suffix('y') {
            // policy -> policies, gateway -> gateways
            Some(stem) if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) => format!("{stem}ies"),
            _ => format!("{lower}s"),
        }
    }
}

/// Convert `group/Version.Kind` into `plural.group`.
///
/// Entries that do not have that shape come back unchanged, so they can still
/// match a workload by capability name.
#[must_use]
pub fn resource_name(applies_to: &str) -> String {
    let Some((group, version_kind)) = applies_to.split_once('/') else {
        return applies_to.to_string();
    };
    let Some((_version, kind)) = version_kind.split_once('.') else {
        return applies_to.to_string();
    };
    if group.is_empty() || kind.is_empty() {
        return applies_to.to_string();
    }
    format!("{}.{group}", pluralize_kind(kind))
}

/// Resolve declared applicability against the installed workloads.
///
/// Returns workload names, de-duplicated, in first-seen order of `applies_to`.
/// When several workloads match one entry they are emitted by name, so the
/// result does not depend on the order of `workloads`. Entries matching no
/// workload are dropped.
#[must_use]
pub fn resolve(applies_to: &[String], workloads: &[Capability]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut resolved = Vec::new();

    for entry in applies_to {
        let wanted = resource_name(entry);
        let matches: BTreeSet<&str> = workloads
            .iter()
            .filter(|w| w.crd_name == wanted || w.name == wanted || w.name == *entry)
            .map(|w| w.name.as_str())
            .collect();
        for name in matches {
            if seen.insert(name.to_string()) {
                resolved.push(name.to_string());
            }
        }
    }
    resolved
}

/// Keep only `workload` from a resolved list; `None` excludes the trait.
#[must_use]
pub fn narrow(resolved: &[String], workload: &str) -> Option<Vec<String>> {
    resolved
        .iter()
        .any(|name| name == workload)
        .then(|| vec![workload.to_string()])
}

/// Rewrite each trait's `applies_to` with its resolved workload names.
///
/// With `workload` set, traits that cannot attach to it are left out.
#[must_use]
pub fn resolve_traits(
    traits: Vec<Capability>,
    workloads: &[Capability],
    workload: Option<&str>,
) -> Vec<Capability> {
    traits
        .into_iter()
        .filter_map(|mut trait_cap| {
            let resolved = resolve(&trait_cap.applies_to, workloads);
            trait_cap.applies_to = match workload {
                Some(name) => narrow(&resolved, name)?,
                None => resolved,
            };
            Some(trait_cap)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityKind;

    fn workload(name: &str, crd: &str) -> Capability {
        Capability::new(name, CapabilityKind::Workload, crd, "output: {}").unwrap()
    }

    fn route(applies_to: &[&str]) -> Capability {
        let mut cap =
            Capability::new("route", CapabilityKind::Trait, "routes.standard.oam.dev", "output: {}")
                .unwrap();
        cap.applies_to = applies_to.iter().map(ToString::to_string).collect();
        cap
    }

    #[test]
    fn pluralizes_common_kinds() {
        assert_eq!(pluralize_kind("Deployment"), "deployments");
        assert_eq!(pluralize_kind("Ingress"), "ingresses");
        assert_eq!(pluralize_kind("Policy"), "policies");
        assert_eq!(pluralize_kind("Gateway"), "gateways");
        assert_eq!(pluralize_kind("Batch"), "batches");
        assert_eq!(pluralize_kind("Endpoints"), "endpoints");
    }

    #[test]
    fn resource_name_from_reference() {
        assert_eq!(resource_name("apps/v1.Deployment"), "deployments.apps");
        assert_eq!(
            resource_name("core.oam.dev/v1alpha2.ContainerizedWorkload"),
            "containerizedworkloads.core.oam.dev"
        );
        assert_eq!(resource_name("webservice"), "webservice");
        assert_eq!(resource_name("apps/v1"), "apps/v1");
    }

    #[test]
    fn resolves_by_crd_name() {
        let workloads = vec![workload("webservice", "deployments.apps")];
        let resolved = resolve(&["apps/v1.Deployment".to_string()], &workloads);
        assert_eq!(resolved, vec!["webservice"]);
    }

    #[test]
    fn resolves_by_capability_name() {
        let workloads = vec![workload("worker", "deployments.apps")];
        assert_eq!(resolve(&["worker".to_string()], &workloads), vec!["worker"]);
    }

    #[test]
    fn unmatched_entries_are_dropped() {
        let workloads = vec![workload("webservice", "deployments.apps")];
        let resolved = resolve(&["batch/v1.Job".to_string()], &workloads);
        assert!(resolved.is_empty());
    }

    #[test]
    fn duplicates_collapse_in_first_seen_order() {
        let workloads = vec![
            workload("task", "jobs.batch"),
            workload("webservice", "deployments.apps"),
        ];
        let applies = vec![
            "apps/v1.Deployment".to_string(),
            "batch/v1.Job".to_string(),
            "apps/v1.Deployment".to_string(),
            "webservice".to_string(),
        ];
        assert_eq!(resolve(&applies, &workloads), vec!["webservice", "task"]);
    }

    #[test]
    fn narrowing_excludes_inapplicable_traits() {
        let workloads = vec![
            workload("webservice", "deployments.apps"),
            workload("task", "jobs.batch"),
        ];
        let traits = vec![route(&["apps/v1.Deployment"])];

        let narrowed = resolve_traits(traits.clone(), &workloads, Some("webservice"));
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].applies_to, vec!["webservice"]);

        assert!(resolve_traits(traits, &workloads, Some("task")).is_empty());
    }
}
