use thiserror::Error;

/// Fatal planning errors. Each aborts the whole run; no partial plan is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DedupeError {
    /// The snapshot was never materialized/restored by the caller.
    #[error("graph unavailable: {reason}")]
    GraphUnavailable { reason: String },

    /// A duplication group reached the strategy selector without versions.
    /// Indicates a grouping bug.
    #[error("internal invariant violated: empty candidate set for `{package}`")]
    EmptyCandidateSet { package: String },

    /// The selected winner has no member in its group. Indicates a grouping bug.
    #[error("internal invariant violated: winner {version} of `{package}` has no binding")]
    WinnerWithoutBinding { package: String, version: String },

    #[error("invalid package pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}
