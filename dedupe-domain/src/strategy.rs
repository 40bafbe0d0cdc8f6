use crate::error::DedupeError;
use dedupe_types::plan::Strategy;
use semver::Version;

/// Pick the winning version of a group.
///
/// `Highest` uses semver precedence, so a pre-release sorts below its release.
pub fn select<'a>(
    strategy: Strategy,
    package: &str,
    candidates: &'a [Version],
) -> Result<&'a Version, DedupeError> {
    let winner = match strategy {
        Strategy::Highest => candidates.iter().max(),
    };
    winner.ok_or_else(|| DedupeError::EmptyCandidateSet {
        package: package.to_string(),
    })
}
