use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use dedupe_types::snapshot::GraphSnapshot;
use fs_err as fs;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub path: Utf8PathBuf,
    /// sha256 of the raw file bytes, used as the plan's apply precondition.
    pub sha256: String,
    pub snapshot: GraphSnapshot,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotLoadError {
    #[error("snapshot not found: {path}")]
    Missing { path: String },

    #[error("io error: {message}")]
    Io { message: String },

    #[error("json parse error: {message}")]
    Json { message: String },
}

pub fn load_snapshot(path: &Utf8Path) -> Result<LoadedSnapshot, SnapshotLoadError> {
    debug!(path = %path, "loading graph snapshot");

    if !path.exists() {
        return Err(SnapshotLoadError::Missing {
            path: path.to_string(),
        });
    }

    let bytes = fs::read(path).map_err(|e| SnapshotLoadError::Io {
        message: e.to_string(),
    })?;
    let contents = String::from_utf8(bytes).map_err(|e| SnapshotLoadError::Io {
        message: format!("{} is not valid UTF-8: {}", path, e),
    })?;

    let snapshot = parse_snapshot(&contents)?;
    debug!(
        path = %path,
        bindings = snapshot.bindings.len(),
        restored = snapshot.restored,
        "loaded graph snapshot"
    );

    Ok(LoadedSnapshot {
        path: path.to_path_buf(),
        sha256: sha256_hex(contents.as_bytes()),
        snapshot,
    })
}

pub fn parse_snapshot(contents: &str) -> Result<GraphSnapshot, SnapshotLoadError> {
    serde_json::from_str::<GraphSnapshot>(contents).map_err(|e| SnapshotLoadError::Json {
        message: e.to_string(),
    })
}

/// Serialize a snapshot the way it is written to disk (pretty JSON, trailing newline).
pub fn render_snapshot(snapshot: &GraphSnapshot) -> anyhow::Result<String> {
    let mut s = serde_json::to_string_pretty(snapshot).context("serialize snapshot")?;
    s.push('\n');
    Ok(s)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
