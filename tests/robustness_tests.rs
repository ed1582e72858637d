use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_malformed_lines_are_skipped() {
    let file = common::command_file(&[
        r#"{"op": "create_event", "event": {"name": "Launch", "starts_at": "2026-11-01T10:00:00Z", "location": "Tallinn"}}"#,
        // Unknown operation
        r#"{"op": "teleport", "event_id": 1}"#,
        // Not JSON at all
        "register jane please",
        // Missing required payment method
        r#"{"op": "register_individual", "event_id": 1, "individual": {"first_name": "A", "last_name": "B", "personal_code": "1"}}"#,
        r#"{"op": "list_events"}"#,
    ])
    .unwrap();

    Command::new(cargo_bin!())
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Error reading command"))
        .stdout(predicate::str::contains(r#"{"events":[{"id":1,"#));
}

#[test]
fn test_failed_commands_do_not_stop_the_batch() {
    let file = common::command_file(&[
        r#"{"op": "create_event", "event": {"name": "Launch", "starts_at": "2026-11-01T10:00:00Z", "location": "Tallinn"}}"#,
        r#"{"op": "register_individual", "event_id": 1, "payment_method": "cash", "individual": {"first_name": "A", "last_name": "B", "personal_code": "1"}}"#,
        r#"{"op": "register_individual", "event_id": 1, "payment_method": "cash", "individual": {"first_name": "A", "last_name": "B", "personal_code": "1"}}"#,
        r#"{"op": "register_existing_individual", "individual_id": 1, "event_id": 1}"#,
        r#"{"op": "register_individual", "event_id": 7, "payment_method": "cash", "individual": {"first_name": "C", "last_name": "D", "personal_code": "2"}}"#,
        r#"{"op": "register_individual", "event_id": 1, "payment_method": "gold", "individual": {"first_name": "C", "last_name": "D", "personal_code": "2"}}"#,
        r#"{"op": "delete_individual", "individual_id": 99}"#,
        r#"{"op": "list_available", "event_id": 1}"#,
    ])
    .unwrap();

    Command::new(cargo_bin!())
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Error processing command: duplicate individual"))
        .stderr(predicate::str::contains("already registered to event 1"))
        .stderr(predicate::str::contains("event with ID 7 not found"))
        .stderr(predicate::str::contains("payment method not found: gold"))
        .stdout(predicate::str::contains(r#"{"deleted":false}"#))
        .stdout(predicate::str::contains(
            r#"{"available":{"individuals":[],"organizations":[]}}"#,
        ));
}
