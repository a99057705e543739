//! # P7Pack CLI Check Command Tests
//!
//! File: cli/tests/check.rs
//!
//! ## Overview
//!
//! Integration tests for `p7pack check`, the engine readiness probe.
//!

mod common;
use common::*;
use predicates::prelude::*;

#[test]
#[cfg(unix)]
fn test_check_reports_banner() {
    let sandbox = Sandbox::new(FAKE_ENGINE);
    p7pack_cmd()
        .current_dir(sandbox.dir.path())
        .arg("check")
        .arg("--engine")
        .arg(&sandbox.engine)
        .assert()
        .success()
        .stdout(predicate::str::contains("is available"))
        .stdout(predicate::str::contains("7-Zip (fake)"));
}

#[test]
#[cfg(unix)]
fn test_check_engine_from_env() {
    let sandbox = Sandbox::new(FAKE_ENGINE);
    p7pack_cmd()
        .current_dir(sandbox.dir.path())
        .env("P7PACK_ENGINE", &sandbox.engine)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("fake-7z"));
}

#[test]
fn test_check_missing_engine_fails() {
    let dir = tempfile::tempdir().unwrap();
    p7pack_cmd()
        .current_dir(dir.path())
        .args(["check", "--engine", "/nonexistent/p7pack-test-7z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("command not found"));
}
