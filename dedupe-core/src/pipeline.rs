//! Core plan and apply pipelines, extracted from the CLI.
//!
//! Snapshot loading and artifact writing go through the port traits; only
//! `run_apply` touches the filesystem directly, through the edit engine.

use crate::ports::{SnapshotSource, WritePort};
use crate::settings::{ApplySettings, PlanSettings};
use anyhow::Context;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use dedupe_domain::{DedupeError, PlanRequest, Planner, ReportSink};
use dedupe_edit::{
    ApplyOptions, PolicyBlockError, apply_plan, check_policy_block, render_edit_patch,
};
use dedupe_render::{render_apply_md, render_plan_md};
use dedupe_snapshot::{LoadedSnapshot, SnapshotLoadError, sha256_hex};
use dedupe_types::ToolInfo;
use dedupe_types::apply::{ApplyStatus, DedupeApply, PlanRef};
use dedupe_types::plan::{DedupePlan, DedupeWarning, ReassignmentPlan, SnapshotRef};
use dedupe_types::report::{
    DedupeReport, ReportArtifacts, ReportCounts, ReportFinding, ReportRunInfo, ReportSeverity,
    ReportStatus, ReportToolInfo, ReportVerdict,
};
use fs_err as fs;
use tracing::{debug, info};

/// Error type for pipeline results. Exit code 2 = policy block, 1 = everything else.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Dedupe(#[from] DedupeError),
    #[error("policy block")]
    PolicyBlock,
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::PolicyBlock => 2,
            ToolError::Dedupe(_) | ToolError::Internal(_) => 1,
        }
    }
}

/// Outcome of `run_plan`.
#[derive(Debug)]
pub struct PlanOutcome {
    pub plan: DedupePlan,
    pub report: DedupeReport,
    pub patch: String,
    /// Any resolvable or unresolvable duplication was found.
    pub duplicates_found: bool,
}

impl PlanOutcome {
    /// Unresolved duplicates always fail the run; resolvable ones only in check mode.
    pub fn fails(&self, check: bool) -> bool {
        fails_run(&self.plan.plan, check)
    }
}

fn fails_run(body: &ReassignmentPlan, check: bool) -> bool {
    body.unresolved_count > 0 || (check && body.has_duplicates())
}

/// Run the plan pipeline. Returns the plan, report, and patch preview.
///
/// The caller is responsible for writing artifacts (via `write_plan_artifacts`) and for
/// turning `PlanOutcome::fails` into an exit code.
pub fn run_plan(
    settings: &PlanSettings,
    source: &dyn SnapshotSource,
    sink: &mut dyn ReportSink,
    tool: ToolInfo,
) -> Result<PlanOutcome, ToolError> {
    let started = Utc::now();
    let loaded = load(source)?;

    let request = PlanRequest {
        strategy: settings.strategy,
        patterns: settings.patterns.clone(),
    };
    let reassignment = Planner::new().plan(&loaded.snapshot, &request, sink)?;

    let patch = render_edit_patch(&loaded.path, &loaded.snapshot, &reassignment.edits)
        .context("preview patch")?;

    let mut plan = DedupePlan::new(
        tool.clone(),
        SnapshotRef {
            path: loaded.path.to_string(),
            sha256: Some(loaded.sha256),
        },
        settings.strategy,
    );
    plan.patterns = settings.patterns.clone();
    plan.plan = reassignment;

    let report = report_from_plan(&plan, tool, settings.check, started);
    let duplicates_found = plan.plan.has_duplicates();

    Ok(PlanOutcome {
        plan,
        report,
        patch,
        duplicates_found,
    })
}

fn load(source: &dyn SnapshotSource) -> Result<LoadedSnapshot, ToolError> {
    match source.load_snapshot() {
        Ok(loaded) => Ok(loaded),
        Err(SnapshotLoadError::Missing { path }) => Err(DedupeError::GraphUnavailable {
            reason: format!("no graph snapshot at {}", path),
        }
        .into()),
        Err(err) => Err(anyhow::Error::new(err).context("load snapshot").into()),
    }
}

/// Write all plan artifacts to the output directory.
pub fn write_plan_artifacts(
    outcome: &PlanOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let plan_json = serde_json::to_string_pretty(&outcome.plan).context("serialize plan")?;
    writer.write_file(&out_dir.join("plan.json"), plan_json.as_bytes())?;

    let plan_md = render_plan_md(&outcome.plan);
    writer.write_file(&out_dir.join("plan.md"), plan_md.as_bytes())?;

    writer.write_file(&out_dir.join("patch.diff"), outcome.patch.as_bytes())?;

    let report_json = serde_json::to_string_pretty(&outcome.report).context("serialize report")?;
    writer.write_file(&out_dir.join("report.json"), report_json.as_bytes())?;

    debug!(out_dir = %out_dir, "wrote plan artifacts");
    Ok(())
}

/// Outcome of `run_apply`.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub apply: DedupeApply,
    pub report: DedupeReport,
    pub patch: String,
    /// Set when the snapshot no longer matches the plan's precondition.
    pub policy_block: Option<PolicyBlockError>,
}

/// Run the apply pipeline against `<out_dir>/plan.json`.
pub fn run_apply(settings: &ApplySettings, tool: ToolInfo) -> Result<ApplyOutcome, ToolError> {
    let started = Utc::now();
    let plan_path = settings.out_dir.join("plan.json");
    let plan_str =
        fs::read_to_string(&plan_path).with_context(|| format!("read {}", plan_path))?;
    let plan: DedupePlan = serde_json::from_str(&plan_str).context("parse plan.json")?;

    let snapshot_path = settings
        .snapshot_path
        .clone()
        .unwrap_or_else(|| plan.snapshot.path.clone().into());

    let opts = ApplyOptions {
        dry_run: settings.dry_run,
        backup_enabled: settings.backup_enabled,
        backup_dir: Some(settings.out_dir.join("backups")),
        backup_suffix: settings.backup_suffix.clone(),
    };
    let plan_ref = PlanRef {
        path: plan_path.to_string(),
        sha256: Some(sha256_hex(plan_str.as_bytes())),
    };

    let (apply, patch) = apply_plan(&snapshot_path, &plan, plan_ref, tool.clone(), &opts)
        .context("apply plan")?;

    let report = report_from_apply(&apply, tool, started);
    let policy_block = check_policy_block(&apply);
    info!(
        dry_run = apply.dry_run,
        applied = apply.summary.applied,
        blocked = apply.summary.blocked,
        "apply finished"
    );

    Ok(ApplyOutcome {
        apply,
        report,
        patch,
        policy_block,
    })
}

/// Write all apply artifacts to the output directory.
pub fn write_apply_artifacts(
    outcome: &ApplyOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let apply_json = serde_json::to_string_pretty(&outcome.apply).context("serialize apply")?;
    writer.write_file(&out_dir.join("apply.json"), apply_json.as_bytes())?;

    let apply_md = render_apply_md(&outcome.apply);
    writer.write_file(&out_dir.join("apply.md"), apply_md.as_bytes())?;

    writer.write_file(&out_dir.join("patch.diff"), outcome.patch.as_bytes())?;

    let report_json = serde_json::to_string_pretty(&outcome.report).context("serialize report")?;
    writer.write_file(&out_dir.join("report.json"), report_json.as_bytes())?;

    Ok(())
}

// ── report helpers ───────────────────────────────────────────────────────

fn report_tool(tool: ToolInfo) -> ReportToolInfo {
    ReportToolInfo {
        name: tool.name,
        version: tool.version.unwrap_or_else(|| "unknown".to_string()),
        commit: tool.commit,
    }
}

fn run_info(started: DateTime<Utc>) -> ReportRunInfo {
    let ended = Utc::now();
    ReportRunInfo {
        started_at: started.to_rfc3339(),
        ended_at: Some(ended.to_rfc3339()),
        duration_ms: Some((ended - started).num_milliseconds().max(0) as u64),
    }
}

fn counts(findings: &[ReportFinding]) -> ReportCounts {
    let mut c = ReportCounts::default();
    for f in findings {
        match f.severity {
            ReportSeverity::Info => c.info += 1,
            ReportSeverity::Warn => c.warn += 1,
            ReportSeverity::Error => c.error += 1,
        }
    }
    c
}

fn warning_package(w: &DedupeWarning) -> Option<String> {
    match w {
        DedupeWarning::UnparsableRange { package, .. }
        | DedupeWarning::UnparsableVersion { package, .. } => Some(package.clone()),
        DedupeWarning::NoMatchingPattern { .. } => None,
    }
}

pub(crate) fn report_from_plan(
    plan: &DedupePlan,
    tool: ToolInfo,
    check: bool,
    started: DateTime<Utc>,
) -> DedupeReport {
    let body = &plan.plan;
    let resolvable_sev = if check {
        ReportSeverity::Error
    } else {
        ReportSeverity::Info
    };
    let unresolved_sev = ReportSeverity::Error;

    let mut findings: Vec<ReportFinding> = Vec::new();
    for e in &body.edits {
        let package = e.descriptor.ident.normalized();
        findings.push(ReportFinding {
            severity: resolvable_sev,
            code: "resolvable_duplicate".to_string(),
            message: format!(
                "{} can move from {} to {}",
                e.descriptor, e.from.version, e.to.version
            ),
            fingerprint: Some(format!(
                "resolvable_duplicate/{}/{}",
                package, e.descriptor.range
            )),
            package: Some(package),
            data: Some(serde_json::json!({ "edit_id": e.id })),
        });
    }
    for u in &body.unresolved_details {
        findings.push(ReportFinding {
            severity: unresolved_sev,
            code: "unresolved_duplicate".to_string(),
            message: format!(
                "{}@{} stays at {} (available: {})",
                u.package,
                u.range,
                u.current_version,
                u.available_versions.join(", ")
            ),
            package: Some(u.package.clone()),
            fingerprint: Some(format!("unresolved_duplicate/{}/{}", u.package, u.range)),
            data: None,
        });
    }
    for w in &body.warnings {
        findings.push(ReportFinding {
            severity: ReportSeverity::Warn,
            code: w.code().to_string(),
            message: w.to_string(),
            package: warning_package(w),
            fingerprint: None,
            data: serde_json::to_value(w).ok(),
        });
    }

    let mut reasons = Vec::new();
    if body.resolved_count > 0 {
        reasons.push("resolvable_duplicates".to_string());
    }
    if body.unresolved_count > 0 {
        reasons.push("unresolved_duplicates".to_string());
    }
    if !body.warnings.is_empty() {
        reasons.push("planning_warnings".to_string());
    }

    let status = if findings.is_empty() {
        ReportStatus::Pass
    } else if fails_run(body, check) {
        ReportStatus::Fail
    } else {
        ReportStatus::Warn
    };

    DedupeReport {
        schema: dedupe_types::schema::DEDUPE_REPORT_V1.to_string(),
        tool: report_tool(tool),
        run: run_info(started),
        verdict: ReportVerdict {
            status,
            counts: counts(&findings),
            reasons,
        },
        findings,
        artifacts: Some(ReportArtifacts {
            plan: Some("plan.json".to_string()),
            apply: None,
            patch: Some("patch.diff".to_string()),
        }),
        data: Some(serde_json::json!({
            "dedupe": {
                "plan": {
                    "strategy": plan.strategy,
                    "patterns": plan.patterns,
                    "resolved_count": body.resolved_count,
                    "unresolved_count": body.unresolved_count,
                    "edits": body.edits.len(),
                    "warnings": body.warnings.len(),
                    "check": check,
                    "plan_available": !body.edits.is_empty(),
                }
            }
        })),
    }
}

pub(crate) fn report_from_apply(
    apply: &DedupeApply,
    tool: ToolInfo,
    started: DateTime<Utc>,
) -> DedupeReport {
    let status = if apply.summary.failed > 0 {
        ReportStatus::Fail
    } else if apply.summary.blocked > 0 {
        ReportStatus::Warn
    } else if apply.summary.applied > 0 || apply.summary.attempted == 0 {
        ReportStatus::Pass
    } else {
        ReportStatus::Warn
    };

    let mut findings: Vec<ReportFinding> = Vec::new();
    for m in &apply.preconditions.mismatches {
        findings.push(ReportFinding {
            severity: ReportSeverity::Error,
            code: "precondition_mismatch".to_string(),
            message: format!("{} changed since plan", m.path),
            package: None,
            fingerprint: Some(format!("precondition_mismatch/{}", m.path)),
            data: Some(serde_json::json!({ "expected": m.expected, "actual": m.actual })),
        });
    }
    for r in apply
        .results
        .iter()
        .filter(|r| r.status == ApplyStatus::Failed)
    {
        findings.push(ReportFinding {
            severity: ReportSeverity::Error,
            code: "edit_failed".to_string(),
            message: format!(
                "{}: {}",
                r.descriptor,
                r.message.as_deref().unwrap_or("failed")
            ),
            package: None,
            fingerprint: Some(format!("edit_failed/{}", r.edit_id)),
            data: None,
        });
    }

    DedupeReport {
        schema: dedupe_types::schema::DEDUPE_REPORT_V1.to_string(),
        tool: report_tool(tool),
        run: run_info(started),
        verdict: ReportVerdict {
            status,
            counts: ReportCounts {
                info: apply.summary.applied,
                warn: apply.summary.blocked,
                error: apply.summary.failed,
            },
            reasons: vec![],
        },
        findings,
        artifacts: Some(ReportArtifacts {
            plan: Some("plan.json".to_string()),
            apply: Some("apply.json".to_string()),
            patch: Some("patch.diff".to_string()),
        }),
        data: Some(serde_json::json!({
            "dedupe": {
                "apply": {
                    "dry_run": apply.dry_run,
                    "attempted": apply.summary.attempted,
                    "applied": apply.summary.applied,
                    "blocked": apply.summary.blocked,
                    "failed": apply.summary.failed,
                    "bindings_rewritten": apply.summary.bindings_rewritten,
                    "apply_performed": apply.summary.applied > 0,
                }
            }
        })),
    }
}
