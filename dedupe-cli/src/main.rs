mod config;
mod explain;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::ConfigMerger;
use dedupe_core::adapters::{FsSnapshotSource, FsWritePort, TracingReportSink};
use dedupe_core::pipeline::{
    ToolError, run_apply, run_plan, write_apply_artifacts, write_plan_artifacts,
};
use dedupe_core::settings::{ApplySettings, PlanSettings};
use dedupe_types::ToolInfo;
use dedupe_types::plan::Strategy;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "dedupe",
    version,
    about = "Collapse duplicated package versions in a resolved dependency graph."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a deterministic dedupe plan from a graph snapshot.
    ///
    /// Fails when a duplicate cannot be collapsed onto its group's winner.
    #[command(visible_aliases = ["sd", "strict-dedupe"])]
    Plan(PlanArgs),
    /// Report duplicates and fail if any are found (same as `plan --check`).
    Check(PlanArgs),
    /// Apply an existing plan to the snapshot (default: dry-run).
    Apply(ApplyArgs),
    /// Explain how a strategy picks versions and what it leaves unresolved.
    Explain(ExplainArgs),
}

#[derive(Debug, Parser)]
struct PlanArgs {
    /// Package name globs to restrict deduplication to (e.g. "@babel/*").
    patterns: Vec<String>,

    /// Project root (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Graph snapshot (default: <project_root>/snapshot.json).
    #[arg(long)]
    snapshot: Option<Utf8PathBuf>,

    /// Output directory for dedupe artifacts (default: <project_root>/.dedupe).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Version selection strategy.
    #[arg(long, value_parser = parse_strategy)]
    strategy: Option<Strategy>,

    /// Exit with code 1 when any duplicates are found, not only unresolved ones.
    #[arg(short = 'c', long, default_value_t = false)]
    check: bool,
}

#[derive(Debug, Parser)]
struct ApplyArgs {
    /// Project root (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Snapshot to rewrite (default: the path recorded in plan.json).
    #[arg(long)]
    snapshot: Option<Utf8PathBuf>,

    /// Directory containing plan.json (default: <project_root>/.dedupe).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Write changes to disk. If omitted, runs a dry-run and only emits artifacts.
    #[arg(long, default_value_t = false)]
    apply: bool,

    /// Do not back up the snapshot before rewriting it.
    #[arg(long, default_value_t = false)]
    no_backup: bool,
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Strategy to explain (e.g., "highest").
    strategy: String,
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    Strategy::parse(s).ok_or_else(|| {
        let known: Vec<&str> = Strategy::ALL.iter().map(|st| st.as_str()).collect();
        format!("unknown strategy '{}' (expected one of: {})", s, known.join(", "))
    })
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            let code = e.downcast_ref::<ToolError>().map_or(1, ToolError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args, false),
        Command::Check(args) => cmd_plan(args, true),
        Command::Apply(args) => cmd_apply(args),
        Command::Explain(args) => cmd_explain(args).map(|()| ExitCode::SUCCESS),
    }
}

fn cmd_plan(args: PlanArgs, force_check: bool) -> anyhow::Result<ExitCode> {
    let project_root = args.project_root;
    let snapshot_path = args
        .snapshot
        .unwrap_or_else(|| project_root.join("snapshot.json"));
    let out_dir = args.out_dir.unwrap_or_else(|| project_root.join(".dedupe"));

    let file_config = config::load_or_default(&project_root).context("load dedupe.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_plan_args(
        &args.patterns,
        args.strategy,
        args.check || force_check,
    );
    debug!(
        "merged config: strategy={}, patterns={:?}, check={}",
        merged.strategy, merged.patterns, merged.check
    );

    let settings = PlanSettings {
        project_root,
        snapshot_path: snapshot_path.clone(),
        out_dir: out_dir.clone(),
        strategy: merged.strategy,
        patterns: merged.patterns,
        check: merged.check,
    };

    let source = FsSnapshotSource::new(snapshot_path);
    let mut sink = TracingReportSink;
    let outcome = run_plan(&settings, &source, &mut sink, tool_info())?;
    write_plan_artifacts(&outcome, &out_dir, &FsWritePort)?;
    info!("wrote plan to {}", out_dir);

    let body = &outcome.plan.plan;
    println!(
        "{} edit(s): {} resolved, {} unresolved",
        body.edits.len(),
        body.resolved_count,
        body.unresolved_count
    );
    for w in &body.warnings {
        println!("warning: {}", w);
    }

    if outcome.fails(settings.check) {
        if body.unresolved_count > 0 {
            println!("unresolved duplicates remain; widen the ranges listed in plan.md");
        } else {
            println!(
                "duplicates found; run `dedupe plan` and `dedupe apply --apply` to collapse them"
            );
        }
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<ExitCode> {
    let project_root = args.project_root;
    let out_dir = args.out_dir.unwrap_or_else(|| project_root.join(".dedupe"));

    let file_config = config::load_or_default(&project_root).context("load dedupe.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_apply_args(args.no_backup);
    debug!(
        "merged config: backups.enabled={}, backups.suffix={}",
        merged.backups.enabled, merged.backups.suffix
    );

    let settings = ApplySettings {
        project_root,
        snapshot_path: args.snapshot,
        out_dir: out_dir.clone(),
        dry_run: !args.apply,
        backup_enabled: merged.backups.enabled,
        backup_suffix: merged.backups.suffix,
    };

    let outcome = run_apply(&settings, tool_info())?;
    write_apply_artifacts(&outcome, &out_dir, &FsWritePort)?;
    info!("wrote apply artifacts to {}", out_dir);

    if let Some(block) = &outcome.policy_block {
        error!("{}", block);
        for m in &outcome.apply.preconditions.mismatches {
            error!(path = %m.path, expected = %m.expected, actual = %m.actual, "precondition mismatch");
        }
        return Err(ToolError::PolicyBlock.into());
    }

    let summary = &outcome.apply.summary;
    let mode = if outcome.apply.dry_run { "dry-run" } else { "write" };
    println!(
        "{}: {} applied, {} skipped, {} failed",
        mode, summary.applied, summary.skipped, summary.failed
    );
    if summary.failed > 0 {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "dedupe".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        commit: None,
    }
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<()> {
    use explain::{list_strategy_keys, lookup_strategy};

    let Some(entry) = lookup_strategy(&args.strategy) else {
        let available = list_strategy_keys().join(", ");
        anyhow::bail!(
            "Unknown strategy: '{}'\n\nAvailable strategies: {}",
            args.strategy,
            available
        );
    };

    println!("================================================================================");
    println!("STRATEGY: {}", entry.title);
    println!("================================================================================");
    println!();
    println!("Key:     {}", entry.key);
    println!("Usage:   dedupe plan --strategy {}", entry.strategy);
    println!();

    println!("SELECTION");
    println!("--------------------------------------------------------------------------------");
    println!("{}", entry.selection);
    println!();

    println!("OUTCOME");
    println!("--------------------------------------------------------------------------------");
    println!("{}", entry.outcome);
    println!();

    println!("REMEDIATION GUIDANCE");
    println!("--------------------------------------------------------------------------------");
    println!("{}", entry.remediation);
    println!();

    Ok(())
}
