//! Graph snapshot ingestion.
//!
//! dedupe consumes snapshots exported from a package manager's install state. It does not enforce
//! strict schema validation here; unknown fields are ignored and optional fields defaulted so an
//! exporter can add data without breaking older readers.

mod load;

pub use load::{LoadedSnapshot, SnapshotLoadError, load_snapshot, parse_snapshot, render_snapshot, sha256_hex};
