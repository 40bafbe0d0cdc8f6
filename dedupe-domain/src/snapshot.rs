use crate::error::DedupeError;
use dedupe_types::graph::Binding;
use dedupe_types::snapshot::GraphSnapshot;
use std::collections::BTreeMap;
use tracing::debug;

/// Extract the real (non-virtual) bindings of a restored snapshot, in graph order.
pub fn read_bindings(graph: &GraphSnapshot) -> Result<Vec<Binding>, DedupeError> {
    if !graph.restored {
        return Err(DedupeError::GraphUnavailable {
            reason: "install state was not restored before invocation".to_string(),
        });
    }

    let mut out = Vec::with_capacity(graph.bindings.len());
    for binding in &graph.bindings {
        if binding.locator.is_virtual() {
            debug!(
                descriptor = %binding.descriptor,
                locator = %binding.locator,
                "skipping virtual binding"
            );
            continue;
        }
        out.push(binding.clone());
    }
    Ok(out)
}

/// Package name → distinct resolved versions, versions in graph order.
pub fn available_versions(bindings: &[Binding]) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for b in bindings {
        let versions = out.entry(b.package()).or_default();
        if !versions.contains(&b.locator.version) {
            versions.push(b.locator.version.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dedupe_types::graph::{Descriptor, Ident, Locator};

    fn binding(name: &str, range: &str, reference: &str, version: &str) -> Binding {
        let ident = Ident::parse(name);
        Binding::new(
            Descriptor::new(ident.clone(), range),
            Locator::new(ident, reference, version),
        )
    }

    #[test]
    fn unrestored_graph_is_unavailable() {
        let err = read_bindings(&GraphSnapshot::unrestored()).expect_err("unrestored");
        assert!(matches!(err, DedupeError::GraphUnavailable { .. }));
    }

    #[test]
    fn virtual_bindings_are_excluded() {
        let graph = GraphSnapshot::new(vec![
            binding("react-dom", "^17.0.0", "npm:17.0.2", "17.0.2"),
            binding(
                "react-dom",
                "virtual:1234#npm:^17.0.0",
                "virtual:1234#npm:17.0.2",
                "17.0.2",
            ),
        ]);

        let bindings = read_bindings(&graph).expect("read");
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].locator.reference, "npm:17.0.2");
    }

    #[test]
    fn available_versions_are_distinct_and_ordered_by_graph() {
        let bindings = vec![
            binding("lib", "^2.0.0", "npm:2.0.0", "2.0.0"),
            binding("lib", "^1.0.0", "npm:1.2.0", "1.2.0"),
            binding("lib", "^1.1.0", "npm:1.2.0", "1.2.0"),
            binding("@babel/core", "^7.0.0", "npm:7.1.0", "7.1.0"),
        ];

        let versions = available_versions(&bindings);
        assert_eq!(versions["lib"], vec!["2.0.0", "1.2.0"]);
        assert_eq!(versions["@babel/core"], vec!["7.1.0"]);
        assert_eq!(
            versions.keys().collect::<Vec<_>>(),
            vec!["@babel/core", "lib"]
        );
    }
}
