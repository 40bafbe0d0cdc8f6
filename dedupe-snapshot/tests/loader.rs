//! Snapshot loader tests.

use camino::Utf8PathBuf;
use dedupe_snapshot::{SnapshotLoadError, load_snapshot, parse_snapshot, render_snapshot, sha256_hex};
use dedupe_types::graph::{Binding, Descriptor, Ident, Locator};
use dedupe_types::snapshot::GraphSnapshot;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn temp_root() -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    (temp, root)
}

fn react_binding(range: &str, version: &str) -> Binding {
    let ident = Ident::parse("react");
    Binding::new(
        Descriptor::new(ident.clone(), range),
        Locator::npm(ident, version),
    )
}

#[test]
fn load_missing_snapshot_reports_missing() {
    let (_temp, root) = temp_root();
    let path = root.join("snapshot.json");

    let err = load_snapshot(&path).expect_err("missing file");
    assert_eq!(
        err,
        SnapshotLoadError::Missing {
            path: path.to_string()
        }
    );
}

#[test]
fn load_invalid_json_reports_parse_error() {
    let (_temp, root) = temp_root();
    let path = root.join("snapshot.json");
    fs::write(&path, "{ not json").expect("write");

    let err = load_snapshot(&path).expect_err("invalid json");
    assert!(matches!(err, SnapshotLoadError::Json { .. }));
    assert!(err.to_string().contains("json parse error"));
}

#[test]
fn load_records_hash_of_raw_bytes() {
    let (_temp, root) = temp_root();
    let path = root.join("snapshot.json");
    let contents = r#"{"bindings": []}"#;
    fs::write(&path, contents).expect("write");

    let loaded = load_snapshot(&path).expect("load");
    assert_eq!(loaded.sha256, sha256_hex(contents.as_bytes()));
    assert_eq!(loaded.path, path);
    assert!(loaded.snapshot.restored);
    assert!(loaded.snapshot.bindings.is_empty());
}

#[test]
fn render_then_parse_preserves_bindings() {
    let snapshot = GraphSnapshot::new(vec![
        react_binding("^17.0.0", "17.0.1"),
        react_binding("^17.0.2", "17.0.2"),
    ]);

    let rendered = render_snapshot(&snapshot).expect("render");
    assert!(rendered.ends_with('\n'));

    let parsed = parse_snapshot(&rendered).expect("parse");
    assert_eq!(parsed, snapshot);
}

#[test]
fn parse_keeps_virtual_bindings_for_the_reader_to_filter() {
    let json = r#"{
        "bindings": [{
            "descriptor": { "name": "react-dom", "range": "virtual:abc#npm:^17.0.0" },
            "locator": { "name": "react-dom", "reference": "virtual:abc#npm:17.0.2", "version": "17.0.2" }
        }]
    }"#;
    let parsed = parse_snapshot(json).expect("parse");
    assert_eq!(parsed.bindings.len(), 1);
    assert!(parsed.bindings[0].locator.is_virtual());
}
