//! # P7Pack Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! This module declares the command handlers exposed by the `p7pack` binary.
//! Each command defines its own Clap arguments struct and an async handler
//! that `main.rs` routes to.
//!
//! ## Commands
//!
//! - `compress`: Run one archive job with the 7z engine
//! - `check`: Re-probe the 7z engine and report its banner
//!

/// Engine readiness probe (`p7pack check`).
pub mod check;
/// Archive creation (`p7pack compress`).
pub mod compress;
