//! E2E CLI tests covering:
//! - Note lifecycle (`create`, `put`, `content`, `meta`, `delete`, `notes`)
//! - Bundle round trip (`export` from one tenant, `merge` into another)
//! - Re-upload idempotency and name-collision renames, including a
//!   renamed note uploaded again
//! - Auxiliary files, `validate`, `provision`
//! - Error reporting with stable error codes
//!
//! Each test runs the `notelog` binary as a subprocess against a temp data dir.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command for `user` whose data and config live under `dir`.
fn nl_cmd(dir: &Path, user: &str) -> Command {
    let config = dir.join("config.toml");
    if !config.exists() {
        std::fs::write(&config, "").expect("write config");
    }
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("notelog"));
    cmd.current_dir(dir);
    cmd.env("NOTELOG_CONFIG", &config);
    cmd.env("NOTELOG_DATA_DIR", dir.join("tenants"));
    cmd.env("NOTELOG_LOG", "error");
    cmd.env_remove("NOTELOG_USER");
    cmd.env_remove("NOTELOG_FORMAT");
    cmd.args(["--user", user]);
    cmd
}

/// Run with `--json` and parse stdout.
fn json_of(dir: &Path, user: &str, args: &[&str]) -> Value {
    let output = nl_cmd(dir, user)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

/// Create a note with one content version; returns `(id, version_id)`.
fn note_with_content(dir: &Path, user: &str, name: &str, content: &str) -> (String, String) {
    let note = json_of(dir, user, &["create", name]);
    let id = note["id"].as_str().expect("id").to_string();
    let output = nl_cmd(dir, user)
        .args(["put", &id, "--json"])
        .write_stdin(content)
        .output()
        .expect("put should not crash");
    assert!(output.status.success());
    let put: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    (id, put["versionId"].as_str().expect("versionId").to_string())
}

/// Names of the live notes in a `notes --json` listing.
fn note_names(listing: &Value) -> Vec<String> {
    let mut names: Vec<String> = listing["NotesCompact"]
        .as_array()
        .expect("NotesCompact")
        .iter()
        .map(|n| n[1].as_str().expect("name").to_string())
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Note lifecycle
// ---------------------------------------------------------------------------

#[test]
fn create_put_and_read_back() {
    let dir = TempDir::new().expect("tempdir");
    let (id, ver) = note_with_content(dir.path(), "alice", "groceries", "milk\neggs\n");

    nl_cmd(dir.path(), "alice")
        .args(["content", &ver])
        .assert()
        .success()
        .stdout("milk\neggs\n");

    let listing = json_of(dir.path(), "alice", &["notes"]);
    assert_eq!(listing["Ver"], "1");
    assert_eq!(listing["LastChangeID"], 2);
    let note = &listing["NotesCompact"][0];
    assert_eq!(note[0], Value::String(id));
    assert_eq!(note[1], "groceries");
    assert_eq!(note[6], Value::String(ver));
}

#[test]
fn notes_since_current_change_id_reports_no_changes() {
    let dir = TempDir::new().expect("tempdir");
    json_of(dir.path(), "alice", &["create", "a"]);
    let listing = json_of(dir.path(), "alice", &["notes", "--since", "1"]);
    assert!(listing.is_null());
}

#[test]
fn meta_updates_flags_and_keeps_name() {
    let dir = TempDir::new().expect("tempdir");
    let (id, _) = note_with_content(dir.path(), "alice", "todo", "x");
    let note = json_of(dir.path(), "alice", &["meta", &id, "--starred", "true"]);
    assert_eq!(note["isStarred"], true);
    assert_eq!(note["name"], "todo");

    let listing = json_of(dir.path(), "alice", &["notes"]);
    assert_eq!(listing["NotesCompact"][0][2], 1);
}

#[test]
fn deleted_note_disappears_from_listing() {
    let dir = TempDir::new().expect("tempdir");
    let (keep, _) = note_with_content(dir.path(), "alice", "keep", "1");
    let (gone, _) = note_with_content(dir.path(), "alice", "gone", "2");
    json_of(dir.path(), "alice", &["delete", &gone]);

    let listing = json_of(dir.path(), "alice", &["notes"]);
    let ids: Vec<&str> = listing["NotesCompact"]
        .as_array()
        .expect("array")
        .iter()
        .map(|n| n[0].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec![keep.as_str()]);
}

#[test]
fn duplicate_name_is_rejected_with_code() {
    let dir = TempDir::new().expect("tempdir");
    json_of(dir.path(), "alice", &["create", "inbox"]);
    nl_cmd(dir.path(), "alice")
        .args(["create", "inbox"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E4003"));
}

#[test]
fn unknown_note_error_is_json_in_json_mode() {
    let dir = TempDir::new().expect("tempdir");
    let output = nl_cmd(dir.path(), "alice")
        .args(["delete", "nope1234", "--json"])
        .output()
        .expect("delete should not crash");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(err["error"]["error_code"], "E4001");
}

#[test]
fn tenants_are_isolated() {
    let dir = TempDir::new().expect("tempdir");
    json_of(dir.path(), "alice@example.com", &["create", "secret"]);
    let listing = json_of(dir.path(), "bob@example.com", &["notes"]);
    assert!(listing.is_null());
}

#[test]
fn missing_user_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("config.toml"), "").expect("config");
    Command::new(assert_cmd::cargo::cargo_bin!("notelog"))
        .env("NOTELOG_CONFIG", dir.path().join("config.toml"))
        .env("NOTELOG_DATA_DIR", dir.path())
        .env_remove("NOTELOG_USER")
        .arg("notes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOTELOG_USER"));
}

// ---------------------------------------------------------------------------
// Bundle sync
// ---------------------------------------------------------------------------

#[test]
fn export_then_merge_into_empty_tenant() {
    let dir = TempDir::new().expect("tempdir");
    let (_, ver) = note_with_content(dir.path(), "client", "journal", "day one");
    let bundle = dir.path().join("bundle.zip");
    json_of(dir.path(), "client", &["export", bundle.to_str().expect("utf8")]);

    let report = json_of(dir.path(), "server", &["merge", bundle.to_str().expect("utf8")]);
    assert_eq!(report["appended"], 2);
    assert_eq!(report["tenant"], "server");

    nl_cmd(dir.path(), "server")
        .args(["content", &ver])
        .assert()
        .success()
        .stdout("day one");
    json_of(dir.path(), "server", &["validate"]);
}

#[test]
fn merging_same_bundle_twice_appends_nothing() {
    let dir = TempDir::new().expect("tempdir");
    note_with_content(dir.path(), "client", "journal", "day one");
    let bundle = dir.path().join("bundle.zip");
    json_of(dir.path(), "client", &["export", bundle.to_str().expect("utf8")]);
    let path = bundle.to_str().expect("utf8");

    json_of(dir.path(), "server", &["merge", path]);
    let again = json_of(dir.path(), "server", &["merge", path]);
    assert_eq!(again["appended"], 0);
    assert_eq!(again["skipped"], 2);
    assert_eq!(note_names(&json_of(dir.path(), "server", &["notes"])), vec!["journal"]);
}

#[test]
fn colliding_name_with_new_content_is_renamed() {
    let dir = TempDir::new().expect("tempdir");
    note_with_content(dir.path(), "server", "scratch", "server text");
    note_with_content(dir.path(), "client", "scratch", "client text");
    let bundle = dir.path().join("bundle.zip");
    json_of(dir.path(), "client", &["export", bundle.to_str().expect("utf8")]);

    let report = json_of(dir.path(), "server", &["merge", bundle.to_str().expect("utf8")]);
    assert_eq!(report["renamed"].as_object().expect("renamed").len(), 1);
    assert_eq!(report["reserved_present"][0], "scratch");
    assert_eq!(
        note_names(&json_of(dir.path(), "server", &["notes"])),
        vec!["scratch", "scratch-0"]
    );
}

#[test]
fn renamed_note_survives_second_upload_of_same_bundle() {
    let dir = TempDir::new().expect("tempdir");
    note_with_content(dir.path(), "server", "scratch", "server text");
    let (client_id, _) = note_with_content(dir.path(), "client", "scratch", "client text");
    json_of(dir.path(), "client", &["meta", &client_id, "--starred", "true"]);
    let bundle = dir.path().join("bundle.zip");
    let path = bundle.to_str().expect("utf8");
    json_of(dir.path(), "client", &["export", path]);

    json_of(dir.path(), "server", &["merge", path]);
    let again = json_of(dir.path(), "server", &["merge", path]);
    assert_eq!(again["appended"], 0);
    assert_eq!(
        note_names(&json_of(dir.path(), "server", &["notes"])),
        vec!["scratch", "scratch-0"]
    );
}

#[test]
fn merge_of_garbage_is_a_malformed_bundle() {
    let dir = TempDir::new().expect("tempdir");
    let bogus = dir.path().join("bogus.zip");
    std::fs::write(&bogus, b"not a zip").expect("write");
    nl_cmd(dir.path(), "server")
        .args(["merge", bogus.to_str().expect("utf8")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

// ---------------------------------------------------------------------------
// Files and maintenance
// ---------------------------------------------------------------------------

#[test]
fn write_file_overwrites_and_lists_once() {
    let dir = TempDir::new().expect("tempdir");
    nl_cmd(dir.path(), "alice")
        .args(["write-file", "settings.json"])
        .write_stdin(r#"{"theme":"dark"}"#)
        .assert()
        .success();
    nl_cmd(dir.path(), "alice")
        .args(["write-file", "settings.json"])
        .write_stdin(r#"{"theme":"light"}"#)
        .assert()
        .success();

    nl_cmd(dir.path(), "alice")
        .args(["read-file", "settings.json"])
        .assert()
        .success()
        .stdout(r#"{"theme":"light"}"#);
    let files = json_of(dir.path(), "alice", &["files"]);
    assert_eq!(files, serde_json::json!(["settings.json"]));
}

#[test]
fn provision_creates_defaults_once() {
    let dir = TempDir::new().expect("tempdir");
    let first = json_of(dir.path(), "alice", &["provision"]);
    assert_eq!(first["created"], 3);
    let second = json_of(dir.path(), "alice", &["provision"]);
    assert_eq!(second["created"], 0);
    assert_eq!(
        note_names(&json_of(dir.path(), "alice", &["notes"])),
        vec!["daily journal", "inbox", "scratch"]
    );
}

#[test]
fn validate_reports_record_count() {
    let dir = TempDir::new().expect("tempdir");
    note_with_content(dir.path(), "alice", "a", "1");
    let summary = json_of(dir.path(), "alice", &["validate"]);
    assert_eq!(summary["records"], 2);
    assert_eq!(summary["data_bytes"], 1);
}
