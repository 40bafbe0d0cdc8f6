use crate::ToolInfo;
use crate::graph::{Descriptor, Locator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy used to pick the single winning version of a duplication group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Pick the highest version under semver ordering.
    #[default]
    Highest,
}

impl Strategy {
    pub const ALL: &'static [Strategy] = &[Strategy::Highest];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Highest => "highest",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reassign one descriptor from its current locator to the winning one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Deterministic id (UUID v5 over package, range and references).
    pub id: String,
    pub descriptor: Descriptor,
    pub from: Locator,
    pub to: Locator,
}

/// A descriptor that could not be collapsed onto its group's winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedDetail {
    pub package: String,
    pub range: String,
    pub current_version: String,
    /// Every version present in the descriptor's group, graph order.
    pub available_versions: Vec<String>,
}

/// Non-fatal conditions raised while planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DedupeWarning {
    UnparsableRange {
        package: String,
        range: String,
        message: String,
    },
    NoMatchingPattern {
        pattern: String,
    },
    UnparsableVersion {
        package: String,
        reference: String,
        version: String,
    },
}

impl DedupeWarning {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DedupeWarning::UnparsableRange { .. } => "unparsable_range",
            DedupeWarning::NoMatchingPattern { .. } => "no_matching_pattern",
            DedupeWarning::UnparsableVersion { .. } => "unparsable_version",
        }
    }
}

impl fmt::Display for DedupeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupeWarning::UnparsableRange {
                package,
                range,
                message,
            } => write!(f, "cannot parse range `{}` of {}: {}", range, package, message),
            DedupeWarning::NoMatchingPattern { pattern } => {
                write!(f, "pattern `{}` matches no package", pattern)
            }
            DedupeWarning::UnparsableVersion {
                package,
                reference,
                version,
            } => write!(
                f,
                "{}@{} has non-semver version `{}` and is not deduplicated",
                package, reference, version
            ),
        }
    }
}

/// The decision engine's output: edits plus resolved/unresolved counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignmentPlan {
    #[serde(default)]
    pub edits: Vec<Edit>,

    #[serde(default)]
    pub resolved_count: u64,

    #[serde(default)]
    pub unresolved_count: u64,

    #[serde(default)]
    pub unresolved_details: Vec<UnresolvedDetail>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DedupeWarning>,
}

impl ReassignmentPlan {
    /// True when any avoidable or unavoidable duplication was found.
    pub fn has_duplicates(&self) -> bool {
        self.resolved_count + self.unresolved_count > 0
    }
}

/// Where the plan's input snapshot lives and what it hashed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRef {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// On-disk plan artifact (`plan.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupePlan {
    pub schema: String,
    pub tool: ToolInfo,
    pub snapshot: SnapshotRef,
    pub strategy: Strategy,

    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(flatten)]
    pub plan: ReassignmentPlan,
}

impl DedupePlan {
    pub fn new(tool: ToolInfo, snapshot: SnapshotRef, strategy: Strategy) -> Self {
        Self {
            schema: crate::schema::DEDUPE_PLAN_V1.to_string(),
            tool,
            snapshot,
            strategy,
            patterns: vec![],
            plan: ReassignmentPlan::default(),
        }
    }
}
