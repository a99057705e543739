//! # P7Pack Option Resolution (`common::archive::options`)
//!
//! File: cli/src/common/archive/options.rs
//!
//! ## Overview
//!
//! Turns a raw, format-agnostic `JobRequest` into `NormalizedOptions`: inputs
//! are checked and sized, the compression method is reconciled with what the
//! target format supports, and the output naming convention is fixed.
//!
//! ## Compatibility rules
//!
//! | Format | Method handling |
//! |--------|-----------------|
//! | `7z`   | every method is native |
//! | `zip`  | LZMA2 is substituted by LZMA (non-fatal notice) |
//! | `tar`  | no method selection, compression follows the level only |
//!
//! Resolution never spawns a process; any request-shape problem surfaces as
//! `ArchiveError::InvalidOption` before the engine is touched.
//!
use crate::core::error::ArchiveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Name of the archive file inside a job's working directory, minus the extension.
pub const OUTPUT_STEM: &str = "compressed";

/// Container formats the engine is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    #[serde(rename = "7z")]
    SevenZip,
    Zip,
    Tar,
}

impl ArchiveFormat {
    /// The engine's `-t` token, which is also the file extension.
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveFormat::SevenZip => "7z",
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7z" => Ok(ArchiveFormat::SevenZip),
            "zip" => Ok(ArchiveFormat::Zip),
            "tar" => Ok(ArchiveFormat::Tar),
            other => Err(format!(
                "unknown archive format '{}' (expected one of: 7z, zip, tar)",
                other
            )),
        }
    }
}

/// Compression methods understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionMethod {
    #[serde(rename = "LZMA", alias = "lzma")]
    Lzma,
    #[serde(rename = "LZMA2", alias = "lzma2")]
    Lzma2,
    #[serde(rename = "PPMd", alias = "ppmd")]
    Ppmd,
    #[serde(rename = "BZip2", alias = "bzip2")]
    Bzip2,
    #[serde(rename = "Deflate", alias = "deflate")]
    Deflate,
    #[serde(rename = "Copy", alias = "copy")]
    Copy,
}

impl CompressionMethod {
    pub const ALL: [CompressionMethod; 6] = [
        CompressionMethod::Lzma,
        CompressionMethod::Lzma2,
        CompressionMethod::Ppmd,
        CompressionMethod::Bzip2,
        CompressionMethod::Deflate,
        CompressionMethod::Copy,
    ];

    /// The engine's native spelling of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionMethod::Lzma => "LZMA",
            CompressionMethod::Lzma2 => "LZMA2",
            CompressionMethod::Ppmd => "PPMd",
            CompressionMethod::Bzip2 => "BZip2",
            CompressionMethod::Deflate => "Deflate",
            CompressionMethod::Copy => "Copy",
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CompressionMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "unknown compression method '{}' (expected one of: LZMA, LZMA2, PPMd, BZip2, Deflate, Copy)",
                    wanted
                )
            })
    }
}

/// Human-readable name for a compression level.
pub fn level_name(level: u8) -> String {
    match level {
        0 => "Store (no compression)".to_string(),
        1 => "Fastest".to_string(),
        3 => "Fast".to_string(),
        5 => "Normal".to_string(),
        7 => "Maximum".to_string(),
        9 => "Ultra".to_string(),
        other => format!("Level {}", other),
    }
}

/// Archive password. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Wraps a password; an empty string means "no encryption" and yields `None`.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Password(raw))
        }
    }

    /// The clear-text password, for building the engine's `-p` argument only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(****)")
    }
}

/// A raw archive request as received from the caller.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub input_files: Vec<PathBuf>,
    pub compression_level: u8,
    pub compression_method: CompressionMethod,
    pub archive_format: ArchiveFormat,
    pub password: Option<Password>,
    pub solid_archive: bool,
    /// Size string such as `100m` or `1g`; `None` or empty disables splitting.
    pub volume_size: Option<String>,
}

/// How method and format interact for one combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Native,
    Substitute(CompressionMethod),
    /// The format takes no method selection at all.
    NotApplicable,
    /// No current combination maps here; resolving one fails the job.
    #[allow(dead_code)]
    Unsupported,
}

/// Static format × method compatibility table.
pub fn compatibility(format: ArchiveFormat, method: CompressionMethod) -> Compatibility {
    match (format, method) {
        (ArchiveFormat::SevenZip, _) => Compatibility::Native,
        (ArchiveFormat::Zip, CompressionMethod::Lzma2) => {
            Compatibility::Substitute(CompressionMethod::Lzma)
        }
        (ArchiveFormat::Zip, _) => Compatibility::Native,
        (ArchiveFormat::Tar, _) => Compatibility::NotApplicable,
    }
}

/// An input file resolved to an absolute path with its size at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub size: u64,
}

/// How produced files are named in the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeNaming {
    /// `compressed.<format>`
    Single,
    /// `compressed.<format>.001`, `.002`, ...
    Numbered,
}

/// A validated request, ready for command building.
#[derive(Debug, Clone)]
pub struct NormalizedOptions {
    pub inputs: Vec<InputFile>,
    pub level: u8,
    pub method: CompressionMethod,
    pub format: ArchiveFormat,
    pub password: Option<Password>,
    pub solid: bool,
    pub volume_size: Option<String>,
    pub base_name: String,
    pub naming: VolumeNaming,
    /// Non-fatal notices raised during resolution (e.g. method substitution).
    pub notices: Vec<String>,
}

impl NormalizedOptions {
    /// Sum of input sizes as measured during resolution.
    pub fn total_input_bytes(&self) -> u64 {
        self.inputs.iter().map(|input| input.size).sum()
    }

    /// Whether the engine was asked to write numbered volumes.
    pub fn is_split(&self) -> bool {
        self.naming == VolumeNaming::Numbered
    }

    /// File name of the 1-based volume `index`, e.g. `compressed.7z.002`.
    pub fn volume_name(&self, index: u32) -> String {
        format!("{}.{:03}", self.base_name, index)
    }

    /// Path handed to the engine as its archive argument.
    pub fn output_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.base_name)
    }

    /// The artifact that is returned to the caller when the job succeeds.
    pub fn primary_output_path(&self, work_dir: &Path) -> PathBuf {
        match self.naming {
            VolumeNaming::Single => work_dir.join(&self.base_name),
            VolumeNaming::Numbered => work_dir.join(self.volume_name(1)),
        }
    }

    /// Glob-style description of the volume files, used in diagnostics.
    pub fn volume_pattern(&self) -> Option<String> {
        self.is_split().then(|| format!("{}.*", self.base_name))
    }
}

/// Validates a request and produces normalized options.
///
/// # Errors
///
/// `ArchiveError::InvalidOption` when the input list is empty, an input is
/// missing or not a regular file, the level is out of range, the volume size
/// is malformed, or the method/format pair is unsupported.
pub fn resolve(request: JobRequest) -> Result<NormalizedOptions, ArchiveError> {
    if request.input_files.is_empty() {
        return Err(ArchiveError::InvalidOption(
            "No input files were given".to_string(),
        ));
    }
    if request.compression_level > 9 {
        return Err(ArchiveError::InvalidOption(format!(
            "Compression level must be between 0 and 9, got {}",
            request.compression_level
        )));
    }

    let mut notices = Vec::new();
    let method = match compatibility(request.archive_format, request.compression_method) {
        Compatibility::Native | Compatibility::NotApplicable => request.compression_method,
        Compatibility::Substitute(replacement) => {
            let notice = format!(
                "{} doesn't support {}, using {} instead",
                request.archive_format.as_str().to_ascii_uppercase(),
                request.compression_method,
                replacement
            );
            warn!("{}", notice);
            notices.push(notice);
            replacement
        }
        Compatibility::Unsupported => {
            return Err(ArchiveError::InvalidOption(format!(
                "Compression method {} is not supported for {} archives",
                request.compression_method, request.archive_format
            )));
        }
    };

    let volume_size = request
        .volume_size
        .map(|size| size.trim().to_string())
        .filter(|size| !size.is_empty());
    if let Some(size) = &volume_size {
        validate_volume_size(size)?;
    }

    let mut inputs = Vec::with_capacity(request.input_files.len());
    for path in &request.input_files {
        inputs.push(resolve_input(path)?);
    }

    let base_name = format!("{}.{}", OUTPUT_STEM, request.archive_format);
    let naming = if volume_size.is_some() {
        VolumeNaming::Numbered
    } else {
        VolumeNaming::Single
    };

    let options = NormalizedOptions {
        inputs,
        level: request.compression_level,
        method,
        format: request.archive_format,
        password: request.password,
        solid: request.solid_archive,
        volume_size,
        base_name,
        naming,
        notices,
    };
    info!(
        "Resolved {} input file(s), {} bytes total, format={}, level={}",
        options.inputs.len(),
        options.total_input_bytes(),
        options.format,
        options.level
    );
    debug!("Normalized options: {:?}", options);
    Ok(options)
}

fn resolve_input(path: &Path) -> Result<InputFile, ArchiveError> {
    let metadata = std::fs::metadata(path).map_err(|_| {
        ArchiveError::InvalidOption(format!("Input file does not exist: {}", path.display()))
    })?;
    if !metadata.is_file() {
        return Err(ArchiveError::InvalidOption(format!(
            "Input path is not a regular file: {}",
            path.display()
        )));
    }
    let absolute = std::path::absolute(path)
        .map_err(|e| ArchiveError::io(format!("resolving {}", path.display()), e))?;
    Ok(InputFile {
        path: absolute,
        size: metadata.len(),
    })
}

/// Accepts `<digits>` optionally followed by one of `b`, `k`, `m`, `g` (any case).
fn validate_volume_size(size: &str) -> Result<(), ArchiveError> {
    let digits = size.trim_end_matches(|c: char| matches!(c.to_ascii_lowercase(), 'b' | 'k' | 'm' | 'g'));
    let unit_len = size.len() - digits.len();
    let valid = unit_len <= 1
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && digits.parse::<u64>().map_or(false, |n| n > 0);
    if valid {
        Ok(())
    } else {
        Err(ArchiveError::InvalidOption(format!(
            "Invalid volume size '{}' (expected a number with an optional b/k/m/g unit, e.g. 100m)",
            size
        )))
    }
}
