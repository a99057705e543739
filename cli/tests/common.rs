//! # P7Pack CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Besides locating
//! the compiled `p7pack` binary, this module builds a `Sandbox`: a temporary
//! directory holding a fake `7z` engine script, input files, and a work root,
//! so archive jobs can run end to end without p7zip installed.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Stand-in for `7z`. Prints a banner without arguments; otherwise writes the
/// archive named on its command line (three volumes when `-v` is given).
pub const FAKE_ENGINE: &str = r#"#!/bin/sh
if [ "$#" -eq 0 ]; then
  echo "7-Zip (fake) 0.0 : test double"
  exit 0
fi
out=""
vol=""
for arg in "$@"; do
  case "$arg" in
    a) ;;
    -v*) vol="${arg#-v}" ;;
    -*) ;;
    *) if [ -z "$out" ]; then out="$arg"; fi ;;
  esac
done
echo "Scanning the drive:"
echo " 35% 1 + input"
echo "Everything is Ok"
if [ -n "$vol" ]; then
  printf 'first-volume' > "$out.001"
  printf 'second' > "$out.002"
  printf 'x' > "$out.003"
else
  printf 'tiny-archive' > "$out"
fi
"#;

/// Fails like a real engine run that could not open its input.
pub const FAILING_ENGINE: &str = r#"#!/bin/sh
if [ "$#" -eq 0 ]; then
  exit 0
fi
echo "Scanning the drive:"
echo "ERROR: simulated engine failure" >&2
exit 2
"#;

/// # Get P7Pack Command (`p7pack_cmd`)
///
/// Creates an `assert_cmd::Command` pointing at the compiled `p7pack` binary.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn p7pack_cmd() -> Command {
    let mut cmd = Command::cargo_bin("p7pack").expect("Failed to find p7pack binary for testing");
    cmd.env_remove("P7PACK_ENGINE").env_remove("RUST_LOG");
    cmd
}

/// Temporary directory with an engine script, inputs, and a work root.
pub struct Sandbox {
    pub dir: TempDir,
    pub engine: PathBuf,
    pub work_root: PathBuf,
}

impl Sandbox {
    pub fn new(engine_script: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create sandbox directory");
        let engine = dir.path().join("fake-7z");
        write_executable(&engine, engine_script);
        let work_root = dir.path().join("work");
        Sandbox {
            dir,
            engine,
            work_root,
        }
    }

    /// Writes an input file and returns its path.
    pub fn input(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("Failed to write input file");
        path
    }

    /// `p7pack compress` wired to this sandbox's engine and work root.
    pub fn compress(&self) -> Command {
        let mut cmd = p7pack_cmd();
        cmd.current_dir(self.dir.path())
            .arg("compress")
            .arg("--engine")
            .arg(&self.engine)
            .arg("--work-root")
            .arg(&self.work_root);
        cmd
    }
}

#[cfg(unix)]
fn write_executable(path: &Path, contents: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, contents).expect("Failed to write engine script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .expect("Failed to mark engine script executable");
}

#[cfg(not(unix))]
fn write_executable(path: &Path, contents: &str) {
    fs::write(path, contents).expect("Failed to write engine script");
}
