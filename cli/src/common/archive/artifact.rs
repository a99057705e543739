//! # P7Pack Artifact Collection (`common::archive::artifact`)
//!
//! File: cli/src/common/archive/artifact.rs
//!
//! ## Overview
//!
//! After the engine exits successfully this module checks what it actually
//! wrote. A zero exit status does not prove the archive exists, so the check
//! runs unconditionally and a missing artifact fails the job.
//!
//! - Single archive: `<work_dir>/compressed.<fmt>` must exist.
//! - Split archive: every `compressed.<fmt>.<digits>` file in the working
//!   directory is collected and ordered by its numeric index. The lowest index
//!   is the primary artifact; the remaining volumes are still reported so a
//!   caller can fetch them.
//!
use super::options::NormalizedOptions;
use crate::core::error::ArchiveError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// One produced file and its size on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
}

/// Files produced by one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSet {
    Single(Artifact),
    /// Non-empty, sorted by volume index.
    Volumes(Vec<Artifact>),
}

impl ArtifactSet {
    /// The artifact returned to the caller.
    pub fn primary(&self) -> &Artifact {
        match self {
            ArtifactSet::Single(artifact) => artifact,
            // The collector never builds an empty volume list.
            ArtifactSet::Volumes(volumes) => &volumes[0],
        }
    }

    /// Every produced file, ordered by volume index for split archives.
    pub fn members(&self) -> &[Artifact] {
        match self {
            ArtifactSet::Single(artifact) => std::slice::from_ref(artifact),
            ArtifactSet::Volumes(volumes) => volumes,
        }
    }

    /// Number of produced files; always at least one.
    pub fn len(&self) -> usize {
        self.members().len()
    }

    /// Sum of all member sizes, not just the primary.
    pub fn total_bytes(&self) -> u64 {
        self.members().iter().map(|artifact| artifact.size).sum()
    }
}

/// Locates and validates the artifacts the engine wrote into `work_dir`.
///
/// # Errors
///
/// `ArchiveError::MissingOutput` when the expected archive (or every volume)
/// is absent, `ArchiveError::Io` when the directory cannot be read.
pub fn collect(options: &NormalizedOptions, work_dir: &Path) -> Result<ArtifactSet, ArchiveError> {
    if options.is_split() {
        collect_volumes(options, work_dir)
    } else {
        let output_path = options.output_path(work_dir);
        match std::fs::metadata(&output_path) {
            Ok(metadata) if metadata.is_file() => {
                info!(
                    "Found archive {} ({} bytes)",
                    output_path.display(),
                    metadata.len()
                );
                Ok(ArtifactSet::Single(Artifact {
                    path: output_path,
                    size: metadata.len(),
                }))
            }
            _ => Err(ArchiveError::MissingOutput(format!(
                "Output file was not created: {}. Compression may have failed silently.",
                output_path.display()
            ))),
        }
    }
}

fn collect_volumes(options: &NormalizedOptions, work_dir: &Path) -> Result<ArtifactSet, ArchiveError> {
    let prefix = format!("{}.", options.base_name);
    let mut indexed = Vec::new();

    for entry in WalkDir::new(work_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            ArchiveError::io(
                format!("listing {}", work_dir.display()),
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let Some(index) = volume_index(&name, &prefix) else {
            debug!("Ignoring non-volume file {}", name);
            continue;
        };
        let size = entry
            .metadata()
            .map_err(|e| {
                ArchiveError::io(
                    format!("reading metadata of {}", entry.path().display()),
                    e.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("metadata lookup failed")),
                )
            })?
            .len();
        indexed.push((
            index,
            Artifact {
                path: entry.into_path(),
                size,
            },
        ));
    }

    if indexed.is_empty() {
        return Err(ArchiveError::MissingOutput(format!(
            "No output volumes found in {}. Expected pattern: {}",
            work_dir.display(),
            options.volume_pattern().unwrap_or_else(|| format!("{}*", prefix))
        )));
    }

    indexed.sort_by_key(|(index, _)| *index);
    info!("Found {} volume(s) in {}", indexed.len(), work_dir.display());
    Ok(ArtifactSet::Volumes(
        indexed.into_iter().map(|(_, artifact)| artifact).collect(),
    ))
}

/// Parses the numeric suffix of `name` if it is `<prefix><digits>`.
fn volume_index(name: &str, prefix: &str) -> Option<u64> {
    let suffix = name.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}
