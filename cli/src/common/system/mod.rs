//! # P7Pack System Checks (`common::system`)
//!
//! File: cli/src/common/system/mod.rs
//!
//! ## Overview
//!
//! Verifies that the archiving engine can be executed before any job is
//! accepted. The probe runs the engine without arguments; if the process
//! spawns, the engine is considered installed and the first banner line of its
//! output (e.g. `7-Zip [64] 16.02 : Copyright (c) ...`) is recorded.
//!
//! ## State
//!
//! The result is stored process-wide. It is checked once, by the first job
//! whose request passed validation (`ensure_engine_ready`), and only
//! re-probed on explicit demand (`recheck_engine`, used by `p7pack check`) or
//! when a different binary is requested.
//!
use crate::core::error::ArchiveError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::RwLock;
use tokio::process::Command;
use tracing::{debug, info};

/// Outcome of a successful readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub binary: PathBuf,
    /// First non-empty line the engine printed, if any.
    pub banner: Option<String>,
}

static ENGINE_STATUS: RwLock<Option<EngineStatus>> = RwLock::new(None);

/// Returns the cached status for `binary`, probing only if it has not been checked yet.
///
/// # Errors
///
/// `ArchiveError::EngineUnavailable` if the binary cannot be spawned. Failures
/// are not cached, so the next call probes again.
pub async fn ensure_engine_ready(binary: &Path) -> Result<EngineStatus, ArchiveError> {
    if let Some(status) = cached_status(binary) {
        debug!("Using cached engine status for {}", binary.display());
        return Ok(status);
    }
    recheck_engine(binary).await
}

/// Probes `binary` unconditionally and replaces the cached status.
pub async fn recheck_engine(binary: &Path) -> Result<EngineStatus, ArchiveError> {
    let status = probe(binary).await;
    let mut cache = ENGINE_STATUS
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *cache = status.as_ref().ok().cloned();
    status
}

fn cached_status(binary: &Path) -> Option<EngineStatus> {
    ENGINE_STATUS
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .as_ref()
        .filter(|status| status.binary == binary)
        .cloned()
}

async fn probe(binary: &Path) -> Result<EngineStatus, ArchiveError> {
    debug!("Probing archiving engine {}", binary.display());
    let output = Command::new(binary)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ArchiveError::EngineUnavailable {
            binary: binary.display().to_string(),
            reason: if e.kind() == std::io::ErrorKind::NotFound {
                "command not found. Ensure p7zip (7z) is installed.".to_string()
            } else {
                e.to_string()
            },
        })?;

    let banner = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string);
    info!(
        "Archiving engine {} is available ({})",
        binary.display(),
        banner.as_deref().unwrap_or("no banner")
    );
    Ok(EngineStatus {
        binary: binary.to_path_buf(),
        banner,
    })
}
