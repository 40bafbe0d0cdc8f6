//! Strategy explanations for the `dedupe explain` command.

use dedupe_types::plan::Strategy;

/// Information about a dedupe strategy.
#[derive(Debug, Clone)]
pub struct StrategyExplanation {
    /// Key accepted by `--strategy` and `dedupe explain`.
    pub key: &'static str,
    pub strategy: Strategy,
    pub title: &'static str,
    /// What the strategy picks as the winning version of a group.
    pub selection: &'static str,
    /// Which descriptors move and which stay put.
    pub outcome: &'static str,
    /// Guidance for duplicates the strategy cannot collapse.
    pub remediation: &'static str,
}

/// Registry of all available strategies.
pub static STRATEGY_REGISTRY: &[StrategyExplanation] = &[StrategyExplanation {
    key: "highest",
    strategy: Strategy::Highest,
    title: "Highest Compatible Version",
    selection: r#"For every package that resolves to two or more distinct versions, the
highest version under semver ordering wins. Pre-releases order below their
release (1.0.0-rc.1 < 1.0.0). Versions that are not valid semver are left out
of the group and reported as `unparsable_version` warnings."#,
    outcome: r#"Every descriptor whose range accepts the winning version is reassigned to
the winning locator. Descriptors whose range excludes the winner keep their
current locator and are counted as unresolved.

Example:
    lodash@^4.0.0  -> 4.17.20
    lodash@^4.17.0 -> 4.17.21
becomes:
    lodash@^4.0.0  -> 4.17.21
    lodash@^4.17.0 -> 4.17.21"#,
    remediation: r#"Unresolved duplicates mean the declared ranges cannot agree on a single
version. To collapse them, widen the narrower range in the dependent's
manifest (or upgrade the dependent) so that it accepts the winning version,
then re-run `dedupe plan`."#,
}];

/// Look up a strategy by key (case-insensitive).
pub fn lookup_strategy(key: &str) -> Option<&'static StrategyExplanation> {
    let key = key.trim();
    STRATEGY_REGISTRY
        .iter()
        .find(|s| s.key.eq_ignore_ascii_case(key))
}

pub fn list_strategy_keys() -> Vec<&'static str> {
    STRATEGY_REGISTRY.iter().map(|s| s.key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_strategy_is_explained() {
        for strategy in Strategy::ALL {
            let entry = lookup_strategy(strategy.as_str()).expect("registry entry");
            assert_eq!(entry.strategy, *strategy);
        }
    }

    #[test]
    fn lookup_ignores_case() {
        assert!(lookup_strategy("HIGHEST").is_some());
        assert!(lookup_strategy(" highest ").is_some());
        assert!(lookup_strategy("lowest").is_none());
    }

    #[test]
    fn keys_listed_in_registry_order() {
        assert_eq!(list_strategy_keys(), vec!["highest"]);
    }
}
