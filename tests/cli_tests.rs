use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn checkgate_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("checkgate"));
    cmd.env_remove("CHECKGATE_CONFIG")
        .env_remove("CHECKGATE_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn init_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    checkgate_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success();
    temp_dir
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

const SECURITY_CHECKLIST: &str = r#"checklist:
  name: Story Security Review
  category: security
  version: "2.0.0"
  extends: story-done
  items:
    - id: tests-pass
      text: Unit, integration and security tests pass in CI
      severity: critical
    - id: secrets-scanned
      text: No secrets are committed to the repository
      severity: high
"#;

// =============================================================================
// Basic CLI
// =============================================================================

#[test]
fn test_help() {
    checkgate_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quality-gate checklists"));
}

#[test]
fn test_version() {
    checkgate_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("checkgate"));
}

#[test]
fn test_not_initialized_error() {
    let temp_dir = TempDir::new().unwrap();

    checkgate_cmd()
        .arg("list")
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("not initialized")
                .or(predicate::str::contains("Failed to load")),
        );
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn test_init_creates_config_and_starter() {
    let temp_dir = TempDir::new().unwrap();

    checkgate_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(temp_dir.path().join("checkgate.toml").exists());
    assert!(temp_dir.path().join("checklists/story-done.yaml").exists());

    checkgate_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_init_bare_custom_dir() {
    let temp_dir = TempDir::new().unwrap();

    checkgate_cmd()
        .args(["init", "--bare", "--checklists-dir", "gates"])
        .current_dir(temp_dir.path())
        .assert()
        .success();

    assert!(temp_dir.path().join("gates").is_dir());
    assert!(!temp_dir.path().join("gates/story-done.yaml").exists());
    let config = std::fs::read_to_string(temp_dir.path().join("checkgate.toml")).unwrap();
    assert!(config.contains("gates"));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_validate_project() {
    let temp_dir = init_project();

    checkgate_cmd()
        .arg("validate")
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("story-done.yaml"));
}

#[test]
fn test_validate_reports_violations() {
    let temp_dir = init_project();
    write(
        temp_dir.path(),
        "checklists/broken.yaml",
        "checklist:\n  name: Broken\n  category: nonsense\n  version: \"1\"\n  items: []\n",
    );

    checkgate_cmd()
        .arg("validate")
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("checklist.category"))
        .stdout(predicate::str::contains("checklist.version"))
        .stderr(predicate::str::contains("1 of 2 checklist files failed validation"));

    checkgate_cmd()
        .args(["validate", "checklists/story-done.yaml"])
        .current_dir(temp_dir.path())
        .assert()
        .success();
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_list_and_show() {
    let temp_dir = init_project();
    write(temp_dir.path(), "checklists/security/story-security.yaml", SECURITY_CHECKLIST);

    checkgate_cmd()
        .arg("list")
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("story-done"))
        .stdout(predicate::str::contains("story-security"))
        .stdout(predicate::str::contains("core"));

    checkgate_cmd()
        .args(["show", "story-done"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("# Story Definition of Done"))
        .stdout(predicate::str::contains(
            "- [ ] **[CRITICAL]** All acceptance criteria are met and demonstrated",
        ));
}

#[test]
fn test_show_applies_inheritance() {
    let temp_dir = init_project();
    write(temp_dir.path(), "checklists/security/story-security.yaml", SECURITY_CHECKLIST);

    let checklist = stdout_json(
        checkgate_cmd()
            .args(["show", "security/story-security", "--json"])
            .current_dir(temp_dir.path()),
    );

    let ids: Vec<&str> = checklist["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            "acceptance-criteria",
            "tests-pass",
            "code-reviewed",
            "docs-updated",
            "secrets-scanned"
        ]
    );
    assert_eq!(
        checklist["items"][1]["text"],
        "Unit, integration and security tests pass in CI"
    );
    assert_eq!(checklist["version"], "2.0.0");
}

#[test]
fn test_show_unknown_checklist() {
    let temp_dir = init_project();

    checkgate_cmd()
        .args(["show", "no-such-list"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-list"));
}

#[test]
fn test_override_source_wins() {
    let temp_dir = init_project();
    let mut config = std::fs::read_to_string(temp_dir.path().join("checkgate.toml")).unwrap();
    config.push_str("\n[[overrides]]\nname = \"team\"\ndirectory = \"team\"\npriority = 10\n");
    std::fs::write(temp_dir.path().join("checkgate.toml"), config).unwrap();
    write(
        temp_dir.path(),
        "team/story-done.yaml",
        "checklist:\n  name: Team Story Done\n  category: story\n  version: \"1.1.0\"\n  items:\n    - id: demo-given\n      text: Feature was demoed to the team\n      severity: medium\n",
    );

    checkgate_cmd()
        .args(["source", "story-done"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("team"));

    checkgate_cmd()
        .args(["show", "story-done"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("# Team Story Done"));
}

// =============================================================================
// Tracking
// =============================================================================

#[test]
fn test_track_flow() {
    let temp_dir = init_project();
    let dir = temp_dir.path();

    checkgate_cmd()
        .args([
            "track", "start", "story-done", "-t", "story", "-a", "1.2", "--epic", "1", "--story",
            "2", "--by", "alice",
        ])
        .current_dir(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("#1"));

    checkgate_cmd()
        .args(["track", "record", "1", "tests-pass", "pass"])
        .current_dir(dir)
        .assert()
        .success();

    checkgate_cmd()
        .args(["track", "record", "1", "docs-updated", "fail"])
        .current_dir(dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("notes are required"));

    checkgate_cmd()
        .args(["track", "record", "1", "docs-updated", "fail", "-n", "README stale"])
        .current_dir(dir)
        .assert()
        .success();

    checkgate_cmd()
        .args(["track", "complete", "1"])
        .current_dir(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("fail"));

    checkgate_cmd()
        .args(["track", "record", "1", "code-reviewed", "pass"])
        .current_dir(dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already completed"));

    let results = stdout_json(checkgate_cmd().args(["results", "1", "--json"]).current_dir(dir));
    assert_eq!(results["execution"]["overall_status"], "fail");
    assert_eq!(results["execution"]["executed_by"], "alice");
    assert_eq!(results["summary"]["total"], 2);

    let failed = stdout_json(checkgate_cmd().args(["failed", "1", "--json"]).current_dir(dir));
    assert_eq!(failed.as_array().unwrap().len(), 1);
    assert_eq!(failed[0]["item_id"], "docs-updated");

    checkgate_cmd()
        .args(["story", "1", "2"])
        .current_dir(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("story-done"));

    let history = stdout_json(
        checkgate_cmd()
            .args(["history", "story-done", "--json"])
            .current_dir(dir),
    );
    assert_eq!(history["stats"]["failed"], 1);
    assert_eq!(history["stats"]["most_failed_items"][0]["item_id"], "docs-updated");
}

#[test]
fn test_track_start_unknown_checklist() {
    let temp_dir = init_project();

    checkgate_cmd()
        .args(["track", "start", "ghost", "-t", "story", "-a", "1.1"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_import_then_reports() {
    let temp_dir = init_project();
    let dir = temp_dir.path();
    write(
        dir,
        "results.json",
        r#"{
  "checklist_name": "story-done",
  "checklist_version": "1.0.0",
  "artifact_type": "story",
  "artifact_id": "3.4",
  "executed_by": "ci",
  "item_results": [
    {"item_id": "acceptance-criteria", "status": "pass"},
    {"item_id": "docs-updated", "status": "na"}
  ]
}"#,
    );

    checkgate_cmd()
        .args(["import", "results.json"])
        .current_dir(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported"))
        .stdout(predicate::str::contains("pass"));

    let pending = stdout_json(
        checkgate_cmd()
            .args([
                "pending", "story", "3.4", "-r", "story-done", "-r", "security", "--json",
            ])
            .current_dir(dir),
    );
    assert_eq!(pending, serde_json::json!(["security"]));

    let report = stdout_json(
        checkgate_cmd()
            .args(["compliance", "--type", "story", "--json"])
            .current_dir(dir),
    );
    assert_eq!(report["total_executions"], 1);
    assert_eq!(report["overall_pass_rate"], 100.0);

    let later = stdout_json(
        checkgate_cmd()
            .args(["compliance", "--until", "2000-01-01", "--json"])
            .current_dir(dir),
    );
    assert_eq!(later["total_executions"], 0);
}

#[test]
fn test_import_reports_missing_fields() {
    let temp_dir = init_project();
    write(temp_dir.path(), "partial.json", r#"{"checklist_name": "story-done"}"#);

    checkgate_cmd()
        .args(["import", "partial.json"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("checklist_version"))
        .stderr(predicate::str::contains("item_results"));
}
