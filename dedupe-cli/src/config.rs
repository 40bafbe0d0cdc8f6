//! Configuration file loading for dedupe.
//!
//! Discovers and loads `dedupe.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use dedupe_core::DEFAULT_BACKUP_SUFFIX;
use dedupe_types::plan::Strategy;
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "dedupe.toml";

/// Top-level configuration from dedupe.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    /// Planning settings.
    pub dedupe: PlanningConfig,

    /// Backup settings.
    pub backups: BackupsConfig,
}

/// `[dedupe]` section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub strategy: Option<Strategy>,

    /// Package name globs restricting which groups are deduplicated.
    pub patterns: Vec<String>,

    /// Always run in check mode.
    pub check: bool,
}

/// Backups section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupsConfig {
    /// Whether to back up the snapshot before rewriting it.
    pub enabled: bool,

    /// Suffix for backup files.
    pub suffix: String,
}

impl Default for BackupsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }
}

/// Discover the dedupe.toml config file in the project root.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a dedupe.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<DedupeConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<DedupeConfig> {
    let config: DedupeConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return the default if not found.
pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<DedupeConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(DedupeConfig::default()),
    }
}

/// Config file and CLI arguments, merged.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
    pub strategy: Strategy,

    /// Patterns from the config file, extended by CLI.
    pub patterns: Vec<String>,

    pub check: bool,

    pub backups: BackupsConfig,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: DedupeConfig,
}

impl ConfigMerger {
    pub fn new(config: DedupeConfig) -> Self {
        Self { config }
    }

    /// Merge with plan command CLI arguments.
    ///
    /// CLI patterns extend the config file list, `--strategy` overrides it,
    /// and `--check` is ORed with the file setting.
    pub fn merge_plan_args(
        self,
        cli_patterns: &[String],
        cli_strategy: Option<Strategy>,
        cli_check: bool,
    ) -> MergedConfig {
        let mut patterns = self.config.dedupe.patterns.clone();
        for pattern in cli_patterns {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }

        MergedConfig {
            strategy: cli_strategy
                .or(self.config.dedupe.strategy)
                .unwrap_or_default(),
            patterns,
            check: cli_check || self.config.dedupe.check,
            backups: self.config.backups,
        }
    }

    /// Merge with apply command CLI arguments. `--no-backup` wins over the file.
    pub fn merge_apply_args(self, cli_no_backup: bool) -> MergedConfig {
        let mut backups = self.config.backups;
        if cli_no_backup {
            backups.enabled = false;
        }

        MergedConfig {
            strategy: self.config.dedupe.strategy.unwrap_or_default(),
            patterns: self.config.dedupe.patterns,
            check: self.config.dedupe.check,
            backups,
        }
    }
}
