//! # P7Pack Engine Check Handler
//!
//! File: cli/src/commands/check.rs
//!
//! ## Overview
//!
//! Implements `p7pack check`, an explicit readiness probe for the archiving
//! engine. Unlike the check performed before a job, this always re-runs the
//! probe instead of trusting a cached result.
//!
//! ```bash
//! p7pack check
//! p7pack check --engine /usr/local/bin/7zz
//! ```
//!
use crate::common::system;
use crate::core::config;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Arguments for `p7pack check`.
#[derive(Parser, Debug)]
#[command(about = "Verify that the 7z engine is installed and runnable")]
pub struct CheckArgs {
    /// Path to the 7z executable (defaults to the configured engine).
    #[arg(long, env = "P7PACK_ENGINE")]
    engine: Option<PathBuf>,
}

/// Handler for `p7pack check`.
pub async fn handle_check(args: CheckArgs) -> Result<()> {
    let cfg = config::load_config().context("Failed to load P7Pack configuration")?;
    let binary = args
        .engine
        .unwrap_or_else(|| PathBuf::from(&cfg.engine.binary));
    info!("Checking archiving engine {}", binary.display());

    println!("Checking archiving engine '{}'...", binary.display());
    let status = system::recheck_engine(&binary).await?;
    println!("✓ {} is available", status.binary.display());
    if let Some(banner) = &status.banner {
        println!("  {}", banner);
    }
    Ok(())
}
