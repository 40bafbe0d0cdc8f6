use crate::error::DedupeError;
use crate::range::parse_version;
use dedupe_types::graph::Binding;
use dedupe_types::plan::DedupeWarning;
use glob::{MatchOptions, Pattern};
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// `*` stays inside one path segment so `@babel/*` means "the @babel scope".
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub binding: Binding,
    pub version: Version,
}

/// All bindings of one package that resolve to two or more distinct versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicationGroup {
    pub package: String,
    /// Graph order.
    pub members: Vec<GroupMember>,
}

impl DuplicationGroup {
    /// Distinct versions, first occurrence order.
    pub fn distinct_versions(&self) -> Vec<Version> {
        let mut out: Vec<Version> = Vec::new();
        for m in &self.members {
            if !out.contains(&m.version) {
                out.push(m.version.clone());
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupingOutcome {
    /// Sorted by normalized package name.
    pub groups: BTreeMap<String, DuplicationGroup>,
    pub warnings: Vec<DedupeWarning>,
}

/// Shell-glob filter over normalized package names. Empty means "everything".
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    patterns: Vec<(String, Pattern)>,
}

impl NameFilter {
    pub fn new(patterns: &[String]) -> Result<Self, DedupeError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for raw in patterns {
            let pattern = Pattern::new(raw).map_err(|e| DedupeError::InvalidPattern {
                pattern: raw.clone(),
                message: e.msg.to_string(),
            })?;
            compiled.push((raw.clone(), pattern));
        }
        Ok(Self { patterns: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_eligible(&self, name: &str) -> bool {
        self.patterns.is_empty()
            || self
                .patterns
                .iter()
                .any(|(_, p)| p.matches_with(name, MATCH_OPTIONS))
    }

    /// Patterns that match none of `names`, in the order they were given.
    pub fn unmatched<'a>(&self, names: impl IntoIterator<Item = &'a str> + Clone) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|(_, p)| !names.clone().into_iter().any(|n| p.matches_with(n, MATCH_OPTIONS)))
            .map(|(raw, _)| raw.clone())
            .collect()
    }
}

/// Partition bindings by package identity, keeping only eligible packages with duplication.
pub fn group_bindings(
    bindings: &[Binding],
    patterns: &[String],
) -> Result<GroupingOutcome, DedupeError> {
    let filter = NameFilter::new(patterns)?;
    let mut warnings = Vec::new();

    let names: BTreeSet<String> = bindings.iter().map(Binding::package).collect();
    for pattern in filter.unmatched(names.iter().map(String::as_str)) {
        debug!(pattern = %pattern, "pattern matches no package");
        warnings.push(DedupeWarning::NoMatchingPattern { pattern });
    }

    let mut by_package: BTreeMap<String, Vec<GroupMember>> = BTreeMap::new();
    let mut bad_locators: BTreeSet<(String, String)> = BTreeSet::new();
    for binding in bindings {
        let package = binding.package();
        if !filter.is_eligible(&package) {
            continue;
        }

        let Some(version) = parse_version(&binding.locator.version) else {
            if bad_locators.insert((package.clone(), binding.locator.reference.clone())) {
                warnings.push(DedupeWarning::UnparsableVersion {
                    package,
                    reference: binding.locator.reference.clone(),
                    version: binding.locator.version.clone(),
                });
            }
            continue;
        };

        by_package.entry(package).or_default().push(GroupMember {
            binding: binding.clone(),
            version,
        });
    }

    let mut groups = BTreeMap::new();
    for (package, members) in by_package {
        let group = DuplicationGroup {
            package: package.clone(),
            members,
        };
        if group.distinct_versions().len() < 2 {
            continue;
        }
        groups.insert(package, group);
    }

    debug!(groups = groups.len(), "grouped bindings");
    Ok(GroupingOutcome { groups, warnings })
}
