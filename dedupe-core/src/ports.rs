//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;
use dedupe_snapshot::{LoadedSnapshot, SnapshotLoadError};

/// Source of the graph snapshot.
pub trait SnapshotSource {
    fn load_snapshot(&self) -> Result<LoadedSnapshot, SnapshotLoadError>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
