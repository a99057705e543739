//! # P7Pack Working Storage (`common::fs::io`)
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! Each archive job writes into its own directory under the configured work
//! root, named `p7zip_output_<8 hex chars>`. The directory is created with
//! `create_dir`, so two jobs can never share one, and it is deliberately not
//! removed afterwards: the returned artifact lives inside it.
//!
//! ```rust
//! let work_dir = io::create_job_dir(Path::new("/tmp"))?;
//! // -> /tmp/p7zip_output_1a2b3c4d
//! ```
//!
use crate::core::error::ArchiveError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

const JOB_DIR_PREFIX: &str = "p7zip_output_";

/// Ensures that a directory exists at the specified path.
///
/// Creates it (and any missing parents) if needed. Fails if the path exists
/// but is not a directory.
pub fn ensure_dir_exists(path: &Path) -> Result<(), ArchiveError> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| ArchiveError::io(format!("creating directory {}", path.display()), e))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        return Err(ArchiveError::io(
            format!("preparing {}", path.display()),
            std::io::Error::other("path exists but is not a directory"),
        ));
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// Creates a fresh, exclusive working directory for one job under `work_root`.
pub fn create_job_dir(work_root: &Path) -> Result<PathBuf, ArchiveError> {
    ensure_dir_exists(work_root)?;
    let suffix = Uuid::new_v4().simple().to_string();
    let dir = work_root.join(format!("{}{}", JOB_DIR_PREFIX, &suffix[..8]));
    fs::create_dir(&dir)
        .map_err(|e| ArchiveError::io(format!("creating job directory {}", dir.display()), e))?;
    info!("Created job working directory: {}", dir.display());
    Ok(dir)
}
