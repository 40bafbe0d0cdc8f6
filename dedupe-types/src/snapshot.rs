use crate::graph::Binding;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of a project's resolved dependency graph.
///
/// Produced by an exporter from the host package manager's install state.
/// Unknown fields are ignored when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default = "default_schema")]
    pub schema: String,

    /// False when the exporter could not restore the install state.
    /// A snapshot in this state must not be planned against.
    #[serde(default = "default_restored")]
    pub restored: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default)]
    pub bindings: Vec<Binding>,
}

fn default_schema() -> String {
    crate::schema::DEDUPE_SNAPSHOT_V1.to_string()
}

fn default_restored() -> bool {
    true
}

impl GraphSnapshot {
    pub fn new(bindings: Vec<Binding>) -> Self {
        Self {
            schema: default_schema(),
            restored: true,
            project: None,
            bindings,
        }
    }

    /// A snapshot whose install state was never restored.
    pub fn unrestored() -> Self {
        Self {
            schema: default_schema(),
            restored: false,
            project: None,
            bindings: vec![],
        }
    }
}

impl Default for GraphSnapshot {
    fn default() -> Self {
        Self::new(vec![])
    }
}
