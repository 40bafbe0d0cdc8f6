//! Clap-free settings for plan and apply pipelines.

use camino::Utf8PathBuf;
use dedupe_types::plan::Strategy;

/// Settings for the plan pipeline.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    pub project_root: Utf8PathBuf,
    pub snapshot_path: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,

    pub strategy: Strategy,
    pub patterns: Vec<String>,

    /// Report-only mode: the caller fails the run when duplicates remain.
    pub check: bool,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            snapshot_path: Utf8PathBuf::from("snapshot.json"),
            out_dir: Utf8PathBuf::from(".dedupe"),
            strategy: Strategy::default(),
            patterns: Vec::new(),
            check: false,
        }
    }
}

/// Settings for the apply pipeline.
#[derive(Debug, Clone)]
pub struct ApplySettings {
    pub project_root: Utf8PathBuf,
    /// Snapshot to rewrite; `None` uses the path recorded in the plan.
    pub snapshot_path: Option<Utf8PathBuf>,
    /// Directory holding `plan.json`; apply artifacts land here too.
    pub out_dir: Utf8PathBuf,

    pub dry_run: bool,

    // Backups
    pub backup_enabled: bool,
    pub backup_suffix: String,
}

impl Default for ApplySettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            snapshot_path: None,
            out_dir: Utf8PathBuf::from(".dedupe"),
            dry_run: true,
            backup_enabled: true,
            backup_suffix: dedupe_edit::DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }
}
