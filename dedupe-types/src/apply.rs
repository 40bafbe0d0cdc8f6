use crate::ToolInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupeApply {
    pub schema: String,
    pub tool: ToolInfo,
    pub plan_ref: PlanRef,
    pub snapshot_path: String,
    pub dry_run: bool,
    pub preconditions: ApplyPreconditions,
    #[serde(default)]
    pub results: Vec<ApplyResult>,
    pub summary: ApplySummary,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl DedupeApply {
    pub fn new(tool: ToolInfo, plan_ref: PlanRef, snapshot_path: String, dry_run: bool) -> Self {
        Self {
            schema: crate::schema::DEDUPE_APPLY_V1.to_string(),
            tool,
            plan_ref,
            snapshot_path,
            dry_run,
            preconditions: ApplyPreconditions::default(),
            results: vec![],
            summary: ApplySummary::default(),
            backup_path: None,
            errors: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRef {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyPreconditions {
    pub verified: bool,

    #[serde(default)]
    pub mismatches: Vec<PreconditionMismatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreconditionMismatch {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    pub edit_id: String,
    pub descriptor: String,
    pub status: ApplyStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStatus {
    Applied,
    Blocked,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplySummary {
    pub attempted: u64,
    pub applied: u64,
    pub blocked: u64,
    pub failed: u64,
    pub skipped: u64,
    pub bindings_rewritten: u64,
}
