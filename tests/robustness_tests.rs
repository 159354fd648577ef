mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_unknown_script_directive_is_rejected() {
    let dir = tempdir().unwrap();
    let frames = common::write_script(dir.path(), "frames", &["product123", "#blur"]).unwrap();

    Command::new(cargo_bin!("scanpay"))
        .arg("scan")
        .arg("--frames")
        .arg(&frames)
        .arg("--log")
        .arg(dir.path().join("log.jsonl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("#blur"));
}

#[test]
fn test_negative_balance_is_rejected() {
    let dir = tempdir().unwrap();
    let frames = common::write_script(dir.path(), "frames", &["product123"]).unwrap();

    Command::new(cargo_bin!("scanpay"))
        .arg("scan")
        .arg("--frames")
        .arg(&frames)
        .arg("--log")
        .arg(dir.path().join("log.jsonl"))
        .arg("--balance=-5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("initial_balance"));
}

#[test]
fn test_corrupt_log_is_refused() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("log.jsonl");
    std::fs::write(&log, "this is not a record\n").unwrap();

    Command::new(cargo_bin!("scanpay"))
        .arg("receipt")
        .arg("--log")
        .arg(&log)
        .assert()
        .failure();
}

#[test]
fn test_unwritable_log_location_fails_before_scanning() {
    let dir = tempdir().unwrap();
    let frames = common::write_script(dir.path(), "frames", &["product123"]).unwrap();

    Command::new(cargo_bin!("scanpay"))
        .arg("scan")
        .arg("--frames")
        .arg(&frames)
        .arg("--log")
        .arg(dir.path().join("missing").join("log.jsonl"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("paid").not());
}

#[test]
fn test_stalled_camera_ends_session() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("log.jsonl");
    let config = common::write_config(
        dir.path(),
        r#"{"tick_rate_hz": 200, "frame_timeout_ms": 5, "max_consecutive_failures": 3}"#,
    )
    .unwrap();
    let frames = common::write_script(
        dir.path(),
        "frames",
        &["#timeout", "#error lens cap on", "#none", "product123"],
    )
    .unwrap();

    Command::new(cargo_bin!("scanpay"))
        .arg("scan")
        .arg("--frames")
        .arg(&frames)
        .arg("--config")
        .arg(&config)
        .arg("--log")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("scanner stopped (DeviceLost)"))
        .stdout(predicate::str::contains("balance: 100.00"))
        .stdout(predicate::str::contains("paid").not());

    assert!(common::read_log(&log).unwrap().is_empty());
}

#[test]
fn test_missing_frame_script() {
    Command::new(cargo_bin!("scanpay"))
        .arg("scan")
        .arg("--frames")
        .arg("does/not/exist.frames")
        .assert()
        .failure();
}

#[test]
fn test_tick_rate_above_limit_is_rejected() {
    let dir = tempdir().unwrap();
    let frames = common::write_script(dir.path(), "frames", &["product123"]).unwrap();

    Command::new(cargo_bin!("scanpay"))
        .arg("scan")
        .arg("--frames")
        .arg(&frames)
        .arg("--log")
        .arg(dir.path().join("log.jsonl"))
        .arg("--tick-rate")
        .arg("2000000000")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tick_rate_hz"));
}

#[test]
fn test_sub_cent_catalog_price_is_rejected() {
    let dir = tempdir().unwrap();
    let frames = common::write_script(dir.path(), "frames", &["bolt"]).unwrap();
    let catalog = dir.path().join("catalog.csv");
    std::fs::write(&catalog, "id,name,price\nbolt,Bolt,0.005\n").unwrap();

    Command::new(cargo_bin!("scanpay"))
        .arg("scan")
        .arg("--frames")
        .arg(&frames)
        .arg("--catalog")
        .arg(&catalog)
        .arg("--log")
        .arg(dir.path().join("log.jsonl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("finer than a cent"));
}

#[test]
fn test_receipt_does_not_touch_the_log() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("log.jsonl");

    // Missing log: empty receipt, no file created
    Command::new(cargo_bin!("scanpay"))
        .arg("receipt")
        .arg("--log")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("No transactions recorded."));
    assert!(!log.exists());

    // A line still being written is skipped but kept
    let frames = common::write_script(dir.path(), "frames", &["product123"]).unwrap();
    Command::new(cargo_bin!("scanpay"))
        .arg("scan")
        .arg("--frames")
        .arg(&frames)
        .arg("--log")
        .arg(&log)
        .arg("--tick-rate")
        .arg("500")
        .assert()
        .success();
    let mut contents = std::fs::read(&log).unwrap();
    contents.extend_from_slice(br#"{"sequence_no":2,"item_na"#);
    std::fs::write(&log, &contents).unwrap();

    Command::new(cargo_bin!("scanpay"))
        .arg("receipt")
        .arg("--log")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("TOTAL (1 items)"));
    assert_eq!(std::fs::read(&log).unwrap(), contents);
}
