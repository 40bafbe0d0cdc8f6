//! Apply engine for dedupe plans.
//!
//! Responsibilities:
//! - Verify the snapshot sha256 precondition recorded in a plan.
//! - Rewrite descriptor bindings (in memory or on disk), with optional backups.
//! - Generate a unified diff of the rewrite.

mod error;

pub use error::{PolicyBlockError, check_policy_block};

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use dedupe_snapshot::{parse_snapshot, render_snapshot, sha256_hex};
use dedupe_types::ToolInfo;
use dedupe_types::apply::{
    ApplyPreconditions, ApplyResult, ApplyStatus, ApplySummary, DedupeApply, PlanRef,
    PreconditionMismatch,
};
use dedupe_types::graph::{Binding, Descriptor, Locator};
use dedupe_types::plan::{DedupePlan, Edit};
use dedupe_types::snapshot::GraphSnapshot;
use diffy::PatchFormatter;
use fs_err as fs;
use std::collections::BTreeSet;
use tracing::{debug, info};

pub const DEFAULT_BACKUP_SUFFIX: &str = ".dedupe.bak";

#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub dry_run: bool,
    pub backup_enabled: bool,
    /// Directory for backups; next to the snapshot when `None`.
    pub backup_dir: Option<Utf8PathBuf>,
    pub backup_suffix: String,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            backup_enabled: true,
            backup_dir: None,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }
}

/// Reassign every binding of each edited descriptor to the edit's target locator.
///
/// Pure: the input snapshot is untouched. Bindings that become identical are collapsed.
pub fn apply_edits(snapshot: &GraphSnapshot, edits: &[Edit]) -> (GraphSnapshot, Vec<ApplyResult>) {
    let (after, results, _) = rewrite_bindings(snapshot, edits);
    (after, results)
}

fn rewrite_bindings(
    snapshot: &GraphSnapshot,
    edits: &[Edit],
) -> (GraphSnapshot, Vec<ApplyResult>, u64) {
    let mut after = snapshot.clone();
    let mut results = Vec::with_capacity(edits.len());
    let mut rewritten = 0u64;

    for edit in edits {
        let mut bound = false;
        let mut changed = 0u64;
        for binding in after
            .bindings
            .iter_mut()
            .filter(|b| !b.locator.is_virtual() && b.descriptor == edit.descriptor)
        {
            bound = true;
            if binding.locator != edit.to {
                binding.locator = edit.to.clone();
                changed += 1;
            }
        }
        rewritten += changed;

        let (status, message) = match (bound, changed) {
            (false, _) => (
                ApplyStatus::Failed,
                Some("descriptor not bound in snapshot".to_string()),
            ),
            (true, 0) => (
                ApplyStatus::Skipped,
                Some("already at target".to_string()),
            ),
            (true, _) => (ApplyStatus::Applied, None),
        };
        debug!(descriptor = %edit.descriptor, to = %edit.to, changed, "rewrote descriptor");
        results.push(ApplyResult {
            edit_id: edit.id.clone(),
            descriptor: edit.descriptor.to_string(),
            status,
            message,
        });
    }

    let mut seen: BTreeSet<(Descriptor, Locator)> = BTreeSet::new();
    after
        .bindings
        .retain(|b: &Binding| seen.insert((b.descriptor.clone(), b.locator.clone())));

    (after, results, rewritten)
}

/// Compare the snapshot on disk with the sha256 the plan recorded.
pub fn check_preconditions(
    snapshot_path: &Utf8Path,
    plan: &DedupePlan,
) -> anyhow::Result<ApplyPreconditions> {
    let Some(expected) = plan.snapshot.sha256.as_deref() else {
        return Ok(ApplyPreconditions {
            verified: true,
            mismatches: vec![],
        });
    };

    let actual = if snapshot_path.exists() {
        let bytes = fs::read(snapshot_path).with_context(|| format!("read {}", snapshot_path))?;
        sha256_hex(&bytes)
    } else {
        "<missing>".to_string()
    };

    if actual == expected {
        return Ok(ApplyPreconditions {
            verified: true,
            mismatches: vec![],
        });
    }
    Ok(ApplyPreconditions {
        verified: false,
        mismatches: vec![PreconditionMismatch {
            path: snapshot_path.to_string(),
            expected: expected.to_string(),
            actual,
        }],
    })
}

/// Unified diff of a snapshot's rendered form before and after `edits`, without touching disk.
pub fn render_edit_patch(
    label: &Utf8Path,
    snapshot: &GraphSnapshot,
    edits: &[Edit],
) -> anyhow::Result<String> {
    let (graph, _, rewritten) = rewrite_bindings(snapshot, edits);
    if rewritten == 0 {
        return Ok(String::new());
    }
    let before = render_snapshot(snapshot)?;
    let after = render_snapshot(&graph)?;
    Ok(render_patch(label, &before, &after))
}

/// Apply a plan. When `opts.dry_run` is true nothing is written, but results and a patch are
/// still produced.
pub fn apply_plan(
    snapshot_path: &Utf8Path,
    plan: &DedupePlan,
    plan_ref: PlanRef,
    tool: ToolInfo,
    opts: &ApplyOptions,
) -> anyhow::Result<(DedupeApply, String)> {
    let mut apply = DedupeApply::new(tool, plan_ref, snapshot_path.to_string(), opts.dry_run);
    apply.preconditions = check_preconditions(snapshot_path, plan)?;
    apply.summary.attempted = plan.plan.edits.len() as u64;

    if !apply.preconditions.verified {
        for edit in &plan.plan.edits {
            apply.results.push(ApplyResult {
                edit_id: edit.id.clone(),
                descriptor: edit.descriptor.to_string(),
                status: ApplyStatus::Blocked,
                message: Some("snapshot changed since plan".to_string()),
            });
        }
        apply.summary.blocked = plan.plan.edits.len() as u64;
        info!(path = %snapshot_path, "apply blocked by snapshot precondition");
        return Ok((apply, String::new()));
    }

    let (before, after, outcome) = execute_plan(snapshot_path, plan)?;
    let patch = render_patch(snapshot_path, &before, &after);
    apply.summary = summarize(&outcome.results, opts.dry_run, outcome.rewritten);
    apply.results = outcome.results;

    if opts.dry_run {
        for r in apply.results.iter_mut() {
            if r.status == ApplyStatus::Applied {
                r.status = ApplyStatus::Skipped;
                r.message = Some("dry-run: not written".to_string());
            }
        }
        return Ok((apply, patch));
    }

    if before != after {
        if opts.backup_enabled {
            let backup = backup_path(snapshot_path, opts);
            if let Some(parent) = backup.parent() {
                fs::create_dir_all(parent).with_context(|| format!("create {}", parent))?;
            }
            fs::write(&backup, &before).with_context(|| format!("write backup {}", backup))?;
            apply.backup_path = Some(backup.to_string());
        }
        fs::write(snapshot_path, &after).with_context(|| format!("write {}", snapshot_path))?;
        info!(
            path = %snapshot_path,
            rewritten = apply.summary.bindings_rewritten,
            "snapshot rewritten"
        );
    }

    Ok((apply, patch))
}

struct ExecuteOutcome {
    results: Vec<ApplyResult>,
    rewritten: u64,
}

fn execute_plan(
    snapshot_path: &Utf8Path,
    plan: &DedupePlan,
) -> anyhow::Result<(String, String, ExecuteOutcome)> {
    let before = fs::read_to_string(snapshot_path)
        .with_context(|| format!("read {}", snapshot_path))?;
    let current = parse_snapshot(&before)
        .map_err(anyhow::Error::new)
        .with_context(|| format!("parse {}", snapshot_path))?;

    let (graph, results, rewritten) = rewrite_bindings(&current, &plan.plan.edits);
    let after = if rewritten == 0 {
        before.clone()
    } else {
        render_snapshot(&graph)?
    };

    Ok((before, after, ExecuteOutcome { results, rewritten }))
}

fn summarize(results: &[ApplyResult], dry_run: bool, rewritten: u64) -> ApplySummary {
    let mut summary = ApplySummary {
        attempted: results.len() as u64,
        ..ApplySummary::default()
    };
    for r in results {
        match r.status {
            ApplyStatus::Applied if dry_run => summary.skipped += 1,
            ApplyStatus::Applied => summary.applied += 1,
            ApplyStatus::Blocked => summary.blocked += 1,
            ApplyStatus::Failed => summary.failed += 1,
            ApplyStatus::Skipped => summary.skipped += 1,
        }
    }
    if !dry_run {
        summary.bindings_rewritten = rewritten;
    }
    summary
}

fn backup_path(snapshot_path: &Utf8Path, opts: &ApplyOptions) -> Utf8PathBuf {
    let file_name = snapshot_path.file_name().unwrap_or("snapshot.json");
    let name = format!("{}{}", file_name, opts.backup_suffix);
    match &opts.backup_dir {
        Some(dir) => dir.join(name),
        None => snapshot_path.with_file_name(name),
    }
}

fn render_patch(path: &Utf8Path, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let name = path.file_name().unwrap_or(path.as_str());
    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", name));
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", name));

    let formatter = PatchFormatter::new();
    let patch = diffy::create_patch(before, after);
    out.push_str(&formatter.fmt_patch(&patch).to_string());
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
