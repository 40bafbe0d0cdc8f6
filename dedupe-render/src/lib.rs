//! Rendering helpers (markdown) for human-readable artifacts.

use dedupe_types::apply::{ApplyStatus, DedupeApply};
use dedupe_types::plan::DedupePlan;

pub fn render_plan_md(plan: &DedupePlan) -> String {
    let mut out = String::new();
    out.push_str("# dedupe plan\n\n");
    out.push_str(&format!("- Strategy: `{}`\n", plan.strategy));
    if !plan.patterns.is_empty() {
        let patterns: Vec<String> = plan.patterns.iter().map(|p| format!("`{}`", p)).collect();
        out.push_str(&format!("- Patterns: {}\n", patterns.join(", ")));
    }
    out.push_str(&format!("- Snapshot: `{}`\n", plan.snapshot.path));
    out.push_str(&format!(
        "- Resolved: {}\n- Unresolved: {}\n\n",
        plan.plan.resolved_count, plan.plan.unresolved_count
    ));

    out.push_str("## Edits\n\n");
    if plan.plan.edits.is_empty() {
        out.push_str("_No edits planned._\n");
    } else {
        out.push_str("| Descriptor | From | To |\n|---|---|---|\n");
        for e in &plan.plan.edits {
            out.push_str(&format!(
                "| `{}` | {} | {} |\n",
                e.descriptor, e.from.version, e.to.version
            ));
        }
    }

    if !plan.plan.unresolved_details.is_empty() {
        out.push_str("\n## Unresolved\n\n");
        for u in &plan.plan.unresolved_details {
            out.push_str(&format!(
                "- `{}@{}` stays at {} (available: {})\n",
                u.package,
                u.range,
                u.current_version,
                u.available_versions.join(", ")
            ));
        }
    }

    if !plan.plan.warnings.is_empty() {
        out.push_str("\n## Warnings\n\n");
        for w in &plan.plan.warnings {
            out.push_str(&format!("- `{}` {}\n", w.code(), w));
        }
    }

    out
}

pub fn render_apply_md(apply: &DedupeApply) -> String {
    let mut out = String::new();
    out.push_str("# dedupe apply\n\n");
    out.push_str(&format!(
        "- Mode: {}\n",
        if apply.dry_run { "dry-run" } else { "write" }
    ));
    out.push_str(&format!(
        "- Attempted: {}\n- Applied: {}\n- Blocked: {}\n- Failed: {}\n- Skipped: {}\n- Bindings rewritten: {}\n",
        apply.summary.attempted,
        apply.summary.applied,
        apply.summary.blocked,
        apply.summary.failed,
        apply.summary.skipped,
        apply.summary.bindings_rewritten
    ));
    if let Some(backup) = &apply.backup_path {
        out.push_str(&format!("- Backup: `{}`\n", backup));
    }
    out.push('\n');

    if !apply.preconditions.verified {
        out.push_str("## Preconditions\n\n");
        for m in &apply.preconditions.mismatches {
            out.push_str(&format!(
                "- `{}` expected {} but found {}\n",
                m.path, m.expected, m.actual
            ));
        }
        out.push('\n');
    }

    out.push_str("## Results\n\n");
    if apply.results.is_empty() {
        out.push_str("_No results._\n");
        return out;
    }

    for r in &apply.results {
        out.push_str(&format!("- `{}` `{}`", r.descriptor, status_label(r.status)));
        if let Some(msg) = &r.message {
            out.push_str(&format!(": {}", msg));
        }
        out.push('\n');
    }

    out
}

fn status_label(s: ApplyStatus) -> &'static str {
    match s {
        ApplyStatus::Applied => "applied",
        ApplyStatus::Blocked => "blocked",
        ApplyStatus::Failed => "failed",
        ApplyStatus::Skipped => "skipped",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dedupe_types::ToolInfo;
    use dedupe_types::apply::{ApplyResult, PlanRef, PreconditionMismatch};
    use dedupe_types::graph::{Descriptor, Ident, Locator};
    use dedupe_types::plan::{DedupeWarning, Edit, SnapshotRef, Strategy, UnresolvedDetail};
    use pretty_assertions::assert_eq;

    fn tool() -> ToolInfo {
        ToolInfo {
            name: "dedupe".to_string(),
            version: None,
            commit: None,
        }
    }

    fn plan() -> DedupePlan {
        DedupePlan::new(
            tool(),
            SnapshotRef {
                path: "snapshot.json".to_string(),
                sha256: None,
            },
            Strategy::Highest,
        )
    }

    #[test]
    fn empty_plan_says_so() {
        let md = render_plan_md(&plan());
        assert!(md.starts_with("# dedupe plan\n"));
        assert!(md.contains("- Strategy: `highest`"));
        assert!(md.contains("_No edits planned._"));
        assert!(!md.contains("## Unresolved"));
    }

    #[test]
    fn plan_lists_edits_unresolved_and_warnings() {
        let ident = Ident::parse("react");
        let mut p = plan();
        p.patterns = vec!["react".to_string()];
        p.plan.edits.push(Edit {
            id: "1".to_string(),
            descriptor: Descriptor::new(ident.clone(), "^17.0.0"),
            from: Locator::npm(ident.clone(), "17.0.1"),
            to: Locator::npm(ident, "17.0.2"),
        });
        p.plan.unresolved_details.push(UnresolvedDetail {
            package: "lib".to_string(),
            range: "^1.0.0".to_string(),
            current_version: "1.2.0".to_string(),
            available_versions: vec!["1.2.0".to_string(), "2.0.0".to_string()],
        });
        p.plan.warnings.push(DedupeWarning::NoMatchingPattern {
            pattern: "@x/*".to_string(),
        });

        let md = render_plan_md(&p);
        assert!(md.contains("- Patterns: `react`"));
        assert!(md.contains("| `react@^17.0.0` | 17.0.1 | 17.0.2 |"));
        assert!(md.contains("- `lib@^1.0.0` stays at 1.2.0 (available: 1.2.0, 2.0.0)"));
        assert!(md.contains("- `no_matching_pattern` pattern `@x/*` matches no package"));
    }

    #[test]
    fn apply_shows_mismatches_and_results() {
        let mut a = DedupeApply::new(
            tool(),
            PlanRef {
                path: "plan.json".to_string(),
                sha256: None,
            },
            "snapshot.json".to_string(),
            false,
        );
        a.preconditions.mismatches.push(PreconditionMismatch {
            path: "snapshot.json".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        });
        a.results.push(ApplyResult {
            edit_id: "1".to_string(),
            descriptor: "react@^17.0.0".to_string(),
            status: ApplyStatus::Blocked,
            message: Some("snapshot changed since plan".to_string()),
        });

        let md = render_apply_md(&a);
        assert!(md.contains("- Mode: write"));
        assert!(md.contains("- `snapshot.json` expected aa but found bb"));
        assert_eq!(
            md.lines().last(),
            Some("- `react@^17.0.0` `blocked`: snapshot changed since plan")
        );
    }
}
