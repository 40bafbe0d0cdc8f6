//! Policy blocks raised by the apply engine.
//!
//! I/O and parse failures surface as `anyhow::Error`; a policy block is a normal apply outcome
//! that the caller turns into exit code 2.

use dedupe_types::apply::DedupeApply;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyBlockError {
    /// The snapshot changed (or vanished) since the plan was produced.
    #[error("precondition mismatch: {message}")]
    PreconditionMismatch { message: String },
}

/// Inspect a finished apply and report whether it was blocked by its preconditions.
pub fn check_policy_block(apply: &DedupeApply) -> Option<PolicyBlockError> {
    if apply.preconditions.verified {
        return None;
    }

    let paths: Vec<&str> = apply
        .preconditions
        .mismatches
        .iter()
        .map(|m| m.path.as_str())
        .collect();
    Some(PolicyBlockError::PreconditionMismatch {
        message: format!("snapshot changed since plan: {}", paths.join(", ")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dedupe_types::ToolInfo;
    use dedupe_types::apply::{PlanRef, PreconditionMismatch};

    fn apply() -> DedupeApply {
        DedupeApply::new(
            ToolInfo {
                name: "dedupe".to_string(),
                version: None,
                commit: None,
            },
            PlanRef {
                path: "plan.json".to_string(),
                sha256: None,
            },
            "snapshot.json".to_string(),
            false,
        )
    }

    #[test]
    fn unverified_preconditions_block() {
        let mut a = apply();
        a.preconditions.verified = false;
        a.preconditions.mismatches.push(PreconditionMismatch {
            path: "snapshot.json".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        });

        let block = check_policy_block(&a).expect("blocked");
        assert!(block.to_string().contains("snapshot.json"));
    }

    #[test]
    fn verified_preconditions_do_not_block() {
        let mut a = apply();
        a.preconditions.verified = true;
        assert!(check_policy_block(&a).is_none());
    }
}
