//! # P7Pack Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! Filesystem helpers for job working storage. See `io` for the per-job
//! directory convention.
//!

/// Directory creation for job working storage (e.g., `create_job_dir`).
pub mod io;
