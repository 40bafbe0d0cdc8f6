//! Semantic-version range matching with npm range grammar.
//!
//! Each `||`-separated comparator set is translated into a `semver::VersionReq`. The translation
//! handles the places where npm and Cargo disagree: whitespace-separated comparators, hyphen
//! ranges, bare versions meaning exact matches, and `x` wildcards after an operator.
//! Pre-release matching is left to `VersionReq`, which already requires a comparator on the same
//! `major.minor.patch` with a pre-release tag.

use semver::{Version, VersionReq};
use std::fmt;
use thiserror::Error;

const NPM_PROTOCOL: &str = "npm:";

/// Longest operators first so `>=` wins over `>`.
const OPERATORS: &[&str] = &[">=", "<=", "~>", ">", "<", "=", "^", "~"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("unsupported protocol in range `{range}`")]
    UnsupportedProtocol { range: String },

    #[error("invalid range `{range}`: {message}")]
    Invalid { range: String, message: String },
}

/// A parsed range: matches when any alternative matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl RangeSet {
    pub fn parse(raw: &str) -> Result<Self, RangeError> {
        let body = strip_protocol(raw)?;

        let mut alternatives = Vec::new();
        for set in body.split("||") {
            let req = translate_set(set).map_err(|message| RangeError::Invalid {
                range: raw.to_string(),
                message,
            })?;
            alternatives.push(req);
        }

        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

pub fn parse_range(range: &str) -> Result<RangeSet, RangeError> {
    RangeSet::parse(range)
}

/// Total: an unparsable range is satisfied by nothing.
pub fn is_satisfied_by(range: &str, version: &Version) -> bool {
    parse_range(range)
        .map(|set| set.matches(version))
        .unwrap_or(false)
}

/// Parse a resolved version, tolerating a leading `v`.
pub fn parse_version(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

fn strip_protocol(raw: &str) -> Result<&str, RangeError> {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix(NPM_PROTOCOL) else {
        if trimmed.contains(':') {
            return Err(RangeError::UnsupportedProtocol {
                range: raw.to_string(),
            });
        }
        return Ok(trimmed);
    };

    // Aliases: `npm:other-name@^1.0.0` or `npm:@scope/name@^1.0.0`.
    match rest.rfind('@') {
        Some(idx) if idx > 0 => Ok(&rest[idx + 1..]),
        _ => Ok(rest),
    }
}

fn translate_set(set: &str) -> Result<VersionReq, String> {
    let tokens: Vec<&str> = set.split_whitespace().collect();

    if tokens.len() == 3 && tokens[1] == "-" {
        let lower = partial_version(tokens[0])?;
        let upper = partial_version(tokens[2])?;
        return parse_req(&[lower.map(|v| format!(">={}", v)), upper.map(|v| format!("<={}", v))]);
    }

    let mut comparators = Vec::new();
    let mut pending: Option<&str> = None;
    for token in tokens {
        let (op, version) = split_operator(token);
        if version.is_empty() {
            if pending.is_some() || op.is_empty() {
                return Err(format!("dangling operator near `{}`", token));
            }
            pending = Some(op);
            continue;
        }
        let op = match pending.take() {
            Some(p) if op.is_empty() => p,
            Some(_) => return Err(format!("double operator near `{}`", token)),
            None => op,
        };
        comparators.push(comparator(op, version)?);
    }
    if pending.is_some() {
        return Err("operator without version".to_string());
    }

    parse_req(&comparators)
}

/// `None` entries are "match anything" comparators.
fn parse_req(comparators: &[Option<String>]) -> Result<VersionReq, String> {
    let concrete: Vec<&str> = comparators.iter().filter_map(|c| c.as_deref()).collect();
    if concrete.is_empty() {
        return Ok(VersionReq::STAR);
    }
    VersionReq::parse(&concrete.join(", ")).map_err(|e| e.to_string())
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

fn comparator(op: &str, version: &str) -> Result<Option<String>, String> {
    let op = if op == "~>" { "~" } else { op };
    match partial_version(version)? {
        None => match op {
            ">" | "<" => Err(format!("`{}{}` can never match", op, version)),
            _ => Ok(None),
        },
        Some(v) if op.is_empty() => Ok(Some(format!("={}", v))),
        Some(v) => Ok(Some(format!("{}{}", op, v))),
    }
}

/// Normalize a possibly partial version, cutting at the first wildcard component.
/// Returns `None` for a full wildcard (`*`, `x`, `X`).
fn partial_version(raw: &str) -> Result<Option<String>, String> {
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    let raw = raw.strip_prefix('=').unwrap_or(raw);

    let split_at = raw.find(['-', '+']).unwrap_or(raw.len());
    let (core, suffix) = raw.split_at(split_at);

    let mut parts = Vec::new();
    for part in core.split('.') {
        if is_wildcard(part) {
            break;
        }
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("`{}` is not a version", raw));
        }
        parts.push(part);
    }

    if parts.len() > 3 {
        return Err(format!("`{}` has too many components", raw));
    }
    if parts.is_empty() {
        return if suffix.is_empty() {
            Ok(None)
        } else {
            Err(format!("`{}` is not a version", raw))
        };
    }
    if !suffix.is_empty() && parts.len() < 3 {
        return Err(format!("`{}` has a pre-release on a partial version", raw));
    }

    Ok(Some(format!("{}{}", parts.join("."), suffix)))
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "*" | "x" | "X")
}
