//! # P7Pack Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared building blocks used by the command handlers. Command-specific
//! wiring lives in `commands::`, configuration and errors in `core::`.
//!
//! - **`archive`**: The archive-job pipeline: option resolution, engine command
//!   building, artifact collection, statistics and the job state machine.
//! - **`fs`**: Per-job working directories.
//! - **`process`**: Spawning and supervising the engine process, line
//!   classification of its output.
//! - **`system`**: Engine readiness probe with a process-wide cached result.
//! - **`ui`**: Size formatting and the console used for job reports.
//!

/// The archive-job pipeline.
pub mod archive;
/// Working-storage helpers.
pub mod fs;
/// Engine process supervision.
pub mod process;
/// Engine readiness checks.
pub mod system;
/// Terminal output helpers.
pub mod ui;
