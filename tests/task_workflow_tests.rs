// Integration tests for task status workflow commands
// These drive the merit binary end-to-end against a temporary database

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use std::fs;
mod test_env;

/// Helper to create a temporary database and set it as the data location
fn setup_test_env() -> (TempDir, std::sync::MutexGuard<'static, ()>) {
    let guard = test_env::lock_test_env();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let config_dir = temp_dir.path().join(".merit");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("rc"), format!("data.location={}\n", db_path.display())).unwrap();
    (temp_dir, guard)
}

fn new_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("merit").unwrap();
    cmd.env("HOME", temp_dir.path());
    cmd.env_remove("MERIT_USER");
    cmd
}

fn ok(temp_dir: &TempDir, args: &[&str]) {
    new_cmd(temp_dir).args(args).assert().success();
}

/// acme/ops with an admin, two members, and task 1 assigned to alice
fn seed(temp_dir: &TempDir) {
    ok(temp_dir, &["org", "add", "acme"]);
    ok(temp_dir, &["dept", "add", "acme", "ops"]);
    for user in ["admin", "alice", "bob"] {
        ok(temp_dir, &["user", "add", user]);
    }
    ok(temp_dir, &["user", "grant", "admin", "department_admin", "--dept", "acme/ops"]);
    ok(temp_dir, &["user", "grant", "alice", "department_member", "--dept", "acme/ops"]);
    ok(temp_dir, &["user", "grant", "bob", "department_member", "--dept", "acme/ops"]);
    ok(temp_dir, &["--as", "admin", "task", "add", "acme/ops", "Restock", "shelves", "--assign", "alice", "--points", "5"]);
}

fn statuses_json(temp_dir: &TempDir, user: &str) -> serde_json::Value {
    let output = new_cmd(temp_dir)
        .args(&["--as", user, "task", "statuses", "1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

fn option_statuses(value: &serde_json::Value) -> Vec<String> {
    value["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["status"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_task_add_requires_admin() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);

    new_cmd(&temp_dir)
        .args(&["--as", "alice", "task", "add", "acme/ops", "Sneaky", "task"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Adding a task requires an admin role in acme/ops"));
}

#[test]
fn test_task_add_and_show() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);

    new_cmd(&temp_dir)
        .args(&["task", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task 1: Restock shelves"))
        .stdout(predicate::str::contains("Not Started"))
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("acme/ops"));
}

#[test]
fn test_admin_is_offered_all_statuses() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);

    let value = statuses_json(&temp_dir, "admin");
    assert_eq!(
        option_statuses(&value),
        vec!["not_started", "in_progress", "completed", "verified_completed"]
    );
    assert_eq!(value["assigned"], false);
    assert_eq!(value["options"][3]["label"], "Verified");
}

#[test]
fn test_assigned_member_is_offered_three_statuses() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);

    let value = statuses_json(&temp_dir, "alice");
    assert_eq!(option_statuses(&value), vec!["not_started", "in_progress", "completed"]);
    assert_eq!(value["assigned"], true);
    assert_eq!(value["roles"], serde_json::json!(["department_member"]));
}

#[test]
fn test_unassigned_member_is_read_only() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);

    let value = statuses_json(&temp_dir, "bob");
    assert_eq!(option_statuses(&value), vec!["not_started"]);

    new_cmd(&temp_dir)
        .args(&["--as", "bob", "task", "set", "1", "in_progress"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cannot set task 1 to 'In Progress'"));
}

#[test]
fn test_member_moves_own_task_but_cannot_verify() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);

    new_cmd(&temp_dir)
        .args(&["--as", "alice", "task", "set", "1", "In Progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task 1: Not Started -> In Progress"));

    new_cmd(&temp_dir)
        .args(&["--as", "alice", "task", "set", "1", "completed"])
        .assert()
        .success();

    new_cmd(&temp_dir)
        .args(&["--as", "alice", "task", "set", "1", "verified"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cannot set task 1 to 'Verified'"))
        .stderr(predicate::str::contains("Allowed: Not Started, In Progress, Completed"));
}

#[test]
fn test_member_viewing_verified_task_keeps_current_option() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    ok(&temp_dir, &["--as", "admin", "task", "set", "1", "verified"]);

    let value = statuses_json(&temp_dir, "alice");
    assert_eq!(
        option_statuses(&value),
        vec!["not_started", "in_progress", "completed", "verified_completed"]
    );

    let value = statuses_json(&temp_dir, "bob");
    assert_eq!(option_statuses(&value), vec!["verified_completed"]);
}

#[test]
fn test_admin_can_move_backwards() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    ok(&temp_dir, &["--as", "admin", "task", "set", "1", "verified"]);

    new_cmd(&temp_dir)
        .args(&["--as", "admin", "task", "set", "1", "not-started"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task 1: Verified -> Not Started"));
}

#[test]
fn test_setting_current_status_is_noop() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);

    new_cmd(&temp_dir)
        .args(&["--as", "bob", "task", "set", "1", "not_started"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task 1 is already Not Started"));

    new_cmd(&temp_dir)
        .args(&["history", "task", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No status changes recorded."));
}

#[test]
fn test_status_changes_are_recorded() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    ok(&temp_dir, &["--as", "alice", "task", "set", "1", "in_progress"]);
    ok(&temp_dir, &["--as", "admin", "task", "set", "1", "verified"]);

    new_cmd(&temp_dir)
        .args(&["history", "task", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not_started -> in_progress  by alice"))
        .stdout(predicate::str::contains("in_progress -> verified_completed  by admin"));
}

#[test]
fn test_organization_admin_role_applies_to_departments() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    ok(&temp_dir, &["user", "add", "carol"]);
    ok(&temp_dir, &["user", "grant", "carol", "organization_admin", "--org", "acme"]);

    let value = statuses_json(&temp_dir, "carol");
    assert_eq!(option_statuses(&value).len(), 4);

    new_cmd(&temp_dir)
        .args(&["--as", "carol", "task", "add", "acme/ops", "Inventory"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created task 2: Inventory"));
}

#[test]
fn test_actor_from_environment_and_rc() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);

    new_cmd(&temp_dir)
        .env("MERIT_USER", "alice")
        .args(&["task", "statuses", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("as 'alice'"));

    let rc = temp_dir.path().join(".merit").join("rc");
    let mut content = fs::read_to_string(&rc).unwrap();
    content.push_str("user.name=bob\n");
    fs::write(&rc, content).unwrap();

    new_cmd(&temp_dir)
        .args(&["task", "statuses", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("as 'bob'"));

    // --as wins over rc
    new_cmd(&temp_dir)
        .args(&["--as", "admin", "task", "statuses", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("as 'admin'"));
}

#[test]
fn test_missing_actor_is_user_error() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);

    new_cmd(&temp_dir)
        .args(&["task", "statuses", "1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No acting user"));

    new_cmd(&temp_dir)
        .args(&["--as", "ghost", "task", "statuses", "1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Acting user 'ghost' not found"));
}

#[test]
fn test_assign_and_list_mine() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    ok(&temp_dir, &["--as", "admin", "task", "add", "acme/ops", "Count", "stock"]);

    new_cmd(&temp_dir)
        .args(&["--as", "alice", "task", "assign", "2", "bob"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("requires an admin role"));

    ok(&temp_dir, &["--as", "admin", "task", "assign", "2", "bob"]);

    let output = new_cmd(&temp_dir)
        .args(&["--as", "bob", "task", "list", "--mine", "--json"])
        .output()
        .unwrap();
    let tasks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Count stock");
    assert_eq!(tasks[0]["assignee"], "bob");

    ok(&temp_dir, &["--as", "admin", "task", "unassign", "2"]);
    let value = statuses_json(&temp_dir, "alice");
    assert_eq!(value["assigned"], true);
}

#[test]
fn test_task_delete() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);

    new_cmd(&temp_dir)
        .args(&["--as", "admin", "task", "delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted task 1"));

    new_cmd(&temp_dir)
        .args(&["task", "show", "1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Task 1 not found"));
}
