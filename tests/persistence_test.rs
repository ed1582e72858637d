#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

mod common;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: create an event and register a person
    let first = common::command_file(&[
        r#"{"op": "create_event", "event": {"name": "Launch", "starts_at": "2026-11-01T10:00:00Z", "location": "Tallinn"}}"#,
        r#"{"op": "register_individual", "event_id": 1, "payment_method": "cash", "individual": {"first_name": "Mari", "last_name": "Maasikas", "personal_code": "1"}}"#,
    ])
    .unwrap();

    let output1 = Command::new(cargo_bin!())
        .arg(first.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());

    // 2. Second run: the registration is still there and still enforced
    let second = common::command_file(&[
        r#"{"op": "register_existing_individual", "individual_id": 1, "event_id": 1}"#,
        r#"{"op": "list_members", "event_id": 1}"#,
    ])
    .unwrap();

    let output2 = Command::new(cargo_bin!())
        .arg(second.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());

    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    let stderr2 = String::from_utf8_lossy(&output2.stderr);
    assert!(stderr2.contains("already registered to event 1"));
    assert!(stdout2.contains(r#""personal_code":"1""#));
}

#[test]
fn test_rocksdb_delete_cascade_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let first = common::command_file(&[
        r#"{"op": "create_event", "event": {"name": "Launch", "starts_at": "2026-11-01T10:00:00Z", "location": "Tallinn"}}"#,
        r#"{"op": "register_organization", "event_id": 1, "payment_method": "transfer", "organization": {"name": "Acme", "registry_code": "100", "participant_count": 2}}"#,
        r#"{"op": "delete_organization", "organization_id": 1}"#,
    ])
    .unwrap();
    let output1 = Command::new(cargo_bin!())
        .arg(first.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(String::from_utf8_lossy(&output1.stdout).contains(r#"{"deleted":true}"#));

    let second = common::command_file(&[r#"{"op": "list_members", "event_id": 1}"#]).unwrap();
    let output2 = Command::new(cargo_bin!())
        .arg(second.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");

    assert!(
        String::from_utf8_lossy(&output2.stdout)
            .contains(r#"{"members":{"individuals":[],"organizations":[]}}"#)
    );
}
