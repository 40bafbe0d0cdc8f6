//! Shared DTOs (schemas-as-code) for the dedupe workspace.
//!
//! # Design constraints
//! - These types are intended to be serialized to disk.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod apply;
pub mod graph;
pub mod plan;
pub mod report;
pub mod snapshot;

use serde::{Deserialize, Serialize};

/// Schema identifiers.
pub mod schema {
    pub const DEDUPE_SNAPSHOT_V1: &str = "dedupe.snapshot.v1";
    pub const DEDUPE_PLAN_V1: &str = "dedupe.plan.v1";
    pub const DEDUPE_APPLY_V1: &str = "dedupe.apply.v1";
    pub const DEDUPE_REPORT_V1: &str = "dedupe.report.v1";
}

/// Identifies the tool that produced an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}
