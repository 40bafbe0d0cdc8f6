//! Default filesystem-backed port implementations.

use crate::ports::{SnapshotSource, WritePort};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use dedupe_domain::{DedupeEvent, ReportSink};
use dedupe_snapshot::{LoadedSnapshot, SnapshotLoadError, render_snapshot, sha256_hex};
use dedupe_types::snapshot::GraphSnapshot;
use fs_err as fs;
use tracing::{info, warn};

/// Loads the snapshot from disk via `dedupe_snapshot::load_snapshot`.
#[derive(Debug, Clone)]
pub struct FsSnapshotSource {
    pub path: Utf8PathBuf,
}

impl FsSnapshotSource {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl SnapshotSource for FsSnapshotSource {
    fn load_snapshot(&self) -> Result<LoadedSnapshot, SnapshotLoadError> {
        dedupe_snapshot::load_snapshot(&self.path)
    }
}

/// In-memory snapshot source for embedding and testing.
///
/// The recorded sha256 is that of the snapshot's canonical rendering, so a plan built from it
/// applies cleanly to a file written with `render_snapshot`.
#[derive(Debug, Clone)]
pub struct InMemorySnapshotSource {
    path: Utf8PathBuf,
    snapshot: GraphSnapshot,
}

impl InMemorySnapshotSource {
    pub fn new(path: impl Into<Utf8PathBuf>, snapshot: GraphSnapshot) -> Self {
        Self {
            path: path.into(),
            snapshot,
        }
    }
}

impl SnapshotSource for InMemorySnapshotSource {
    fn load_snapshot(&self) -> Result<LoadedSnapshot, SnapshotLoadError> {
        let rendered = render_snapshot(&self.snapshot).map_err(|e| SnapshotLoadError::Json {
            message: e.to_string(),
        })?;
        Ok(LoadedSnapshot {
            path: self.path.clone(),
            sha256: sha256_hex(rendered.as_bytes()),
            snapshot: self.snapshot.clone(),
        })
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}

/// Forwards planning events to `tracing` as structured events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn emit(&mut self, event: &DedupeEvent) {
        match event {
            DedupeEvent::Resolved {
                descriptor,
                from_version,
                to_version,
            } => info!(
                descriptor = %descriptor,
                from = %from_version,
                to = %to_version,
                "resolved duplicate"
            ),
            DedupeEvent::Unresolved {
                package,
                range,
                versions,
            } => info!(
                package = %package,
                range = %range,
                versions = ?versions,
                "duplicate cannot be collapsed"
            ),
            DedupeEvent::Warning(w) => warn!(code = w.code(), "{}", w),
        }
    }
}
