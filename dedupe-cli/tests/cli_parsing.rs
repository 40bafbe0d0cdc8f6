//! CLI parsing and exit code tests.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn dedupe() -> Command {
    Command::cargo_bin("dedupe").expect("dedupe binary")
}

fn binding(name: &str, range: &str, version: &str) -> String {
    format!(
        r#"{{"descriptor":{{"name":"{name}","range":"{range}"}},"locator":{{"name":"{name}","reference":"npm:{version}","version":"{version}"}}}}"#
    )
}

fn write_snapshot(root: &Path, bindings: &[String]) {
    fs::write(
        root.join("snapshot.json"),
        format!("{{\"bindings\":[{}]}}\n", bindings.join(",")),
    )
    .unwrap();
}

/// react is resolvable (^17.0.0 accepts 17.0.2).
fn create_temp_project() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    write_snapshot(
        td.path(),
        &[
            binding("react", "^17.0.0", "17.0.1"),
            binding("react", "^17.0.2", "17.0.2"),
        ],
    );
    td
}

#[test]
fn test_plan_writes_artifacts() {
    let temp = create_temp_project();

    dedupe()
        .current_dir(temp.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 edit(s): 1 resolved, 0 unresolved"));

    let out = temp.path().join(".dedupe");
    for name in ["plan.json", "plan.md", "patch.diff", "report.json"] {
        assert!(out.join(name).exists(), "missing {}", name);
    }

    let plan: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("plan.json")).unwrap()).unwrap();
    assert_eq!(plan["schema"], "dedupe.plan.v1");
    assert_eq!(plan["strategy"], "highest");
    assert_eq!(plan["edits"][0]["to"]["version"], "17.0.2");
}

#[test]
fn test_plan_is_deterministic() {
    let temp = create_temp_project();
    let plan_path = temp.path().join(".dedupe").join("plan.json");

    dedupe().current_dir(temp.path()).arg("plan").assert().success();
    let first = fs::read_to_string(&plan_path).unwrap();
    dedupe().current_dir(temp.path()).arg("plan").assert().success();
    let second = fs::read_to_string(&plan_path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_check_fails_when_duplicates_found() {
    let temp = create_temp_project();

    dedupe()
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("duplicates found"));

    dedupe()
        .current_dir(temp.path())
        .args(["plan", "--check"])
        .assert()
        .code(1);
}

#[test]
fn test_check_fails_on_unresolved_only() {
    let temp = tempfile::tempdir().unwrap();
    write_snapshot(
        temp.path(),
        &[
            binding("lib", "^1.0.0", "1.2.0"),
            binding("lib", "^2.0.0", "2.0.0"),
        ],
    );

    dedupe()
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("0 edit(s): 0 resolved, 1 unresolved"));
}

#[test]
fn test_plan_fails_on_unresolved_without_check() {
    let temp = tempfile::tempdir().unwrap();
    write_snapshot(
        temp.path(),
        &[
            binding("lib", "^1.0.0", "1.2.0"),
            binding("lib", "^2.0.0", "2.0.0"),
        ],
    );

    dedupe()
        .current_dir(temp.path())
        .arg("plan")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("unresolved duplicates remain"));

    assert!(temp.path().join(".dedupe").join("plan.json").exists());
}

#[test]
fn test_plan_passes_on_resolvable_without_check() {
    let temp = create_temp_project();

    dedupe()
        .current_dir(temp.path())
        .arg("plan")
        .assert()
        .success();
}

#[test]
fn test_strict_dedupe_aliases() {
    for alias in ["sd", "strict-dedupe"] {
        let temp = create_temp_project();
        dedupe()
            .current_dir(temp.path())
            .arg(alias)
            .assert()
            .success()
            .stdout(predicate::str::contains("1 edit(s): 1 resolved, 0 unresolved"));
    }
}

#[test]
fn test_short_check_flag() {
    let temp = create_temp_project();

    dedupe()
        .current_dir(temp.path())
        .args(["sd", "-c"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("duplicates found"));
}

#[test]
fn test_check_passes_on_clean_graph() {
    let temp = tempfile::tempdir().unwrap();
    write_snapshot(temp.path(), &[binding("lodash", "^4.0.0", "4.17.21")]);

    dedupe()
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .success();
}

#[test]
fn test_missing_snapshot_fails() {
    let temp = tempfile::tempdir().unwrap();

    dedupe()
        .current_dir(temp.path())
        .arg("plan")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("graph unavailable"));
}

#[test]
fn test_unrestored_snapshot_fails() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("snapshot.json"),
        r#"{"restored": false, "bindings": []}"#,
    )
    .unwrap();

    dedupe()
        .current_dir(temp.path())
        .arg("plan")
        .assert()
        .code(1);
}

#[test]
fn test_snapshot_and_out_dir_flags() {
    let temp = create_temp_project();
    fs::rename(
        temp.path().join("snapshot.json"),
        temp.path().join("graph.json"),
    )
    .unwrap();

    dedupe()
        .current_dir(temp.path())
        .args(["plan", "--snapshot", "graph.json", "--out-dir", "out"])
        .assert()
        .success();

    assert!(temp.path().join("out").join("plan.json").exists());
}

#[test]
fn test_project_root_flag() {
    let temp = create_temp_project();
    let root = temp.path().to_str().unwrap();

    dedupe()
        .args(["plan", "--project-root", root])
        .assert()
        .success();

    assert!(temp.path().join(".dedupe").join("plan.json").exists());
}

#[test]
fn test_unknown_strategy_rejected() {
    let temp = create_temp_project();

    dedupe()
        .current_dir(temp.path())
        .args(["plan", "--strategy", "lowest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown strategy"));
}

#[test]
fn test_explicit_strategy_accepted() {
    let temp = create_temp_project();

    dedupe()
        .current_dir(temp.path())
        .args(["plan", "--strategy", "highest"])
        .assert()
        .success();
}

#[test]
fn test_unmatched_pattern_warns() {
    let temp = create_temp_project();

    dedupe()
        .current_dir(temp.path())
        .args(["plan", "lodash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 edit(s)"))
        .stdout(predicate::str::contains("pattern `lodash` matches no package"));
}

#[test]
fn test_config_file_patterns_apply() {
    let temp = create_temp_project();
    fs::write(
        temp.path().join("dedupe.toml"),
        "[dedupe]\npatterns = [\"lodash\"]\n",
    )
    .unwrap();

    dedupe()
        .current_dir(temp.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 edit(s)"));
}

#[test]
fn test_config_file_check_mode() {
    let temp = create_temp_project();
    fs::write(temp.path().join("dedupe.toml"), "[dedupe]\ncheck = true\n").unwrap();

    dedupe()
        .current_dir(temp.path())
        .arg("plan")
        .assert()
        .code(1);
}

#[test]
fn test_invalid_config_fails() {
    let temp = create_temp_project();
    fs::write(temp.path().join("dedupe.toml"), "[dedupe\n").unwrap();

    dedupe()
        .current_dir(temp.path())
        .arg("plan")
        .assert()
        .code(1);
}

#[test]
fn test_apply_no_args_is_dry_run() {
    let temp = create_temp_project();
    let before = fs::read_to_string(temp.path().join("snapshot.json")).unwrap();

    dedupe().current_dir(temp.path()).arg("plan").assert().success();

    dedupe()
        .current_dir(temp.path())
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("dry-run: 0 applied, 1 skipped"));

    assert_eq!(
        fs::read_to_string(temp.path().join("snapshot.json")).unwrap(),
        before
    );
    assert!(temp.path().join(".dedupe").join("apply.json").exists());
}

#[test]
fn test_apply_then_check_passes() {
    let temp = create_temp_project();

    dedupe().current_dir(temp.path()).arg("plan").assert().success();
    dedupe()
        .current_dir(temp.path())
        .args(["apply", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("write: 1 applied"));

    assert!(
        temp.path()
            .join(".dedupe")
            .join("backups")
            .join("snapshot.json.dedupe.bak")
            .exists()
    );

    dedupe()
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 edit(s): 0 resolved, 0 unresolved"));
}

#[test]
fn test_apply_no_backup() {
    let temp = create_temp_project();

    dedupe().current_dir(temp.path()).arg("plan").assert().success();
    dedupe()
        .current_dir(temp.path())
        .args(["apply", "--apply", "--no-backup"])
        .assert()
        .success();

    assert!(!temp.path().join(".dedupe").join("backups").exists());
}

#[test]
fn test_apply_stale_snapshot_is_policy_block() {
    let temp = create_temp_project();

    dedupe().current_dir(temp.path()).arg("plan").assert().success();
    write_snapshot(temp.path(), &[binding("react", "^17.0.0", "17.0.1")]);

    dedupe()
        .current_dir(temp.path())
        .args(["apply", "--apply"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("policy block"));
}

#[test]
fn test_apply_without_plan_fails() {
    let temp = create_temp_project();

    dedupe()
        .current_dir(temp.path())
        .arg("apply")
        .assert()
        .code(1);
}

#[test]
fn test_explain_highest() {
    dedupe()
        .args(["explain", "highest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("STRATEGY: Highest Compatible Version"))
        .stdout(predicate::str::contains("REMEDIATION GUIDANCE"));
}

#[test]
fn test_explain_unknown_strategy() {
    dedupe()
        .args(["explain", "newest"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Available strategies: highest"));
}

#[test]
fn test_missing_subcommand() {
    dedupe().assert().failure();
}
