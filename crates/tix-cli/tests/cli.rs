use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tix(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tix").unwrap();
    cmd.arg("--root").arg(root.path());
    cmd
}

fn init(root: &TempDir) {
    tix(root).arg("init").assert().success();
}

#[test]
fn init_creates_workspace() {
    let root = TempDir::new().unwrap();
    tix(&root)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized tix workspace"));
    assert!(root.path().join(".tix/config.yaml").exists());
}

#[test]
fn new_and_ls() {
    let root = TempDir::new().unwrap();
    init(&root);
    tix(&root)
        .args(["new", "1234", "Fix", "login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 1234: Fix login"));
    tix(&root)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("1234"))
        .stdout(predicate::str::contains("Fix login"));
}

#[test]
fn new_duplicate_fails() {
    let root = TempDir::new().unwrap();
    init(&root);
    tix(&root).args(["new", "1234", "A"]).assert().success();
    tix(&root)
        .args(["new", "1234", "B"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn commands_require_init() {
    let root = TempDir::new().unwrap();
    tix(&root)
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn status_shows_allowed_moves() {
    let root = TempDir::new().unwrap();
    init(&root);
    tix(&root).args(["new", "1234", "A"]).assert().success();
    tix(&root)
        .args(["status", "1234"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Allowed:"))
        .stdout(predicate::str::contains("Started"));
}

#[test]
fn status_transitions() {
    let root = TempDir::new().unwrap();
    init(&root);
    tix(&root).args(["new", "1234", "A"]).assert().success();
    tix(&root)
        .args(["status", "1234", "started"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started"));
    tix(&root)
        .args(["status", "1234", "working"])
        .assert()
        .success();
    // Done is not reachable straight from Working.
    tix(&root)
        .args(["status", "1234", "done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot switch"));
}

#[test]
fn refresh_advances_ready_to_done() {
    let root = TempDir::new().unwrap();
    init(&root);
    tix(&root).args(["new", "1234", "A"]).assert().success();
    for status in ["started", "working", "waiting", "ready"] {
        tix(&root).args(["status", "1234", status]).assert().success();
    }
    // With no release process configured, Ready tickets finish on refresh.
    tix(&root)
        .args(["refresh", "1234"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Done"));
}

#[test]
fn go_and_work_flow() {
    let root = TempDir::new().unwrap();
    init(&root);
    tix(&root).args(["new", "1234", "A"]).assert().success();

    tix(&root)
        .args(["go", "1234"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Working on 1234"));
    tix(&root)
        .args(["work", "comment", "fix", "bug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fix bug"));
    tix(&root).args(["work", "off"]).assert().success();

    // A second stop has nothing to close.
    tix(&root)
        .args(["work", "off"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not open"));
}

#[test]
fn work_log_reports_day() {
    let root = TempDir::new().unwrap();
    init(&root);
    tix(&root).args(["new", "1234", "A"]).assert().success();
    tix(&root).args(["go", "1234"]).assert().success();
    tix(&root)
        .args(["work", "log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1234"));
    tix(&root)
        .args(["work", "log", "--date", "2000-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No work recorded"));
}

#[test]
fn offline_toggle() {
    let root = TempDir::new().unwrap();
    init(&root);
    tix(&root)
        .arg("offline")
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline mode: off"));
    tix(&root)
        .args(["offline", "on"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline mode: on"));
    tix(&root)
        .args(["offline", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 'on' or 'off'"));
}

#[test]
fn json_output_is_parseable() {
    let root = TempDir::new().unwrap();
    init(&root);
    tix(&root).args(["new", "1234", "Fix login"]).assert().success();

    let output = tix(&root).args(["--json", "show", "1234"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["code"], "1234");
    assert_eq!(value["title"], "Fix login");
}
