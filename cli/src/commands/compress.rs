//! # P7Pack Compress Handler
//!
//! File: cli/src/commands/compress.rs
//!
//! ## Overview
//!
//! This module implements `p7pack compress`, which archives a list of files
//! with the external `7z` engine and prints the path of the resulting archive.
//!
//! ## Architecture
//!
//! 1. Load configuration (`core::config`) and overlay command-line flags.
//! 2. Run an `ArchiveJob` (`common::archive::job`). It validates the request,
//!    confirms the engine is installed, then streams engine output.
//! 3. Print the primary artifact path, or the whole result as JSON with `--json`.
//!
//! ## Usage
//!
//! ```bash
//! # 7z archive at the configured defaults (level 5, LZMA2, solid)
//! p7pack compress notes.txt data.csv
//!
//! # Maximum compression, zip container, password protected
//! p7pack compress -l 9 -f zip -p s3cret report.pdf
//!
//! # Split into 100 MB volumes and emit a machine-readable summary
//! p7pack compress --volume-size 100m --json big.iso
//! ```
//!
use crate::common::archive::job::{ArchiveJob, JobSettings};
use crate::common::archive::options::{ArchiveFormat, CompressionMethod, JobRequest, Password};
use crate::common::process::SupervisorOptions;
use crate::common::ui::Console;
use crate::core::config::{self, Config};
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Arguments for `p7pack compress`.
#[derive(Parser, Debug)]
#[command(about = "Compress files into a single archive using the 7z engine")]
pub struct CompressArgs {
    /// Files to compress, in the order they are added to the archive.
    files: Vec<PathBuf>,

    /// Compression level: 0=store, 1=fastest, 3=fast, 5=normal, 7=maximum, 9=ultra.
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=9))]
    level: Option<u8>,

    /// Compression method: LZMA, LZMA2, PPMd, BZip2, Deflate or Copy.
    #[arg(short, long)]
    method: Option<CompressionMethod>,

    /// Archive format: 7z, zip or tar.
    #[arg(short, long)]
    format: Option<ArchiveFormat>,

    /// Encrypt the archive with this password (7z archives also encrypt file names).
    #[arg(short, long)]
    password: Option<String>,

    /// Create a solid archive (7z only).
    #[arg(long, overrides_with = "no_solid")]
    solid: bool,

    /// Disable solid compression (7z only).
    #[arg(long, overrides_with = "solid")]
    no_solid: bool,

    /// Split the archive into volumes of this size, e.g. 100m or 1g.
    #[arg(long)]
    volume_size: Option<String>,

    /// Path to the 7z executable.
    #[arg(long, env = "P7PACK_ENGINE")]
    engine: Option<PathBuf>,

    /// Directory under which per-job working directories are created.
    #[arg(long)]
    work_root: Option<PathBuf>,

    /// Kill the engine if it runs longer than this many seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Show engine stderr in the progress stream instead of capturing it.
    #[arg(long)]
    merge_stderr: bool,

    /// Print the job result as JSON on stdout (progress goes to stderr).
    #[arg(long)]
    json: bool,
}

/// Handler for `p7pack compress`.
pub async fn handle_compress(args: CompressArgs, cancel: CancellationToken) -> Result<()> {
    info!("Handling compress command...");
    debug!("Compress args: {:?}", args);

    let cfg = config::load_config().context("Failed to load P7Pack configuration")?;
    let settings = job_settings(&args, &cfg);
    let request = job_request(&args, &cfg);

    let console = Console::new(args.json);
    let result = match ArchiveJob::new(&settings, console).run(request, &cancel).await {
        Ok(result) => result,
        Err(failure) => {
            eprintln!("\n{}", failure.diagnostics());
            return Err(failure.into());
        }
    };

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&result).context("Failed to serialize job result")?;
        println!("{}", rendered);
    } else {
        println!("{}", result.artifact.display());
    }
    Ok(())
}

/// Command-line values win over configured defaults.
fn job_request(args: &CompressArgs, cfg: &Config) -> JobRequest {
    let solid_archive = if args.solid {
        true
    } else if args.no_solid {
        false
    } else {
        cfg.defaults.solid
    };
    JobRequest {
        input_files: args.files.clone(),
        compression_level: args.level.unwrap_or(cfg.defaults.level),
        compression_method: args.method.unwrap_or(cfg.defaults.method),
        archive_format: args.format.unwrap_or(cfg.defaults.format),
        password: args.password.clone().and_then(Password::new),
        solid_archive,
        volume_size: args.volume_size.clone(),
    }
}

fn job_settings(args: &CompressArgs, cfg: &Config) -> JobSettings {
    let timeout = match args.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => cfg.engine.timeout(),
    };
    JobSettings {
        engine: args
            .engine
            .clone()
            .unwrap_or_else(|| PathBuf::from(&cfg.engine.binary)),
        work_root: args
            .work_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(&cfg.output.work_root)),
        supervisor: SupervisorOptions {
            merge_stderr: args.merge_stderr || cfg.engine.merge_stderr,
            timeout,
        },
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CompressArgs {
        CompressArgs::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn test_defaults_come_from_config() {
        let args = parse(&["compress", "a.txt", "b.txt"]);
        let cfg = Config::default();
        let request = job_request(&args, &cfg);

        assert_eq!(
            request.input_files,
            vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]
        );
        assert_eq!(request.compression_level, 5);
        assert_eq!(request.compression_method, CompressionMethod::Lzma2);
        assert_eq!(request.archive_format, ArchiveFormat::SevenZip);
        assert!(request.solid_archive);
        assert!(request.password.is_none());
        assert!(request.volume_size.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&[
            "compress",
            "-l",
            "9",
            "-m",
            "ppmd",
            "-f",
            "zip",
            "-p",
            "pw",
            "--no-solid",
            "--volume-size",
            "100m",
            "a.txt",
        ]);
        let request = job_request(&args, &Config::default());

        assert_eq!(request.compression_level, 9);
        assert_eq!(request.compression_method, CompressionMethod::Ppmd);
        assert_eq!(request.archive_format, ArchiveFormat::Zip);
        assert_eq!(request.password.as_ref().map(|p| p.expose()), Some("pw"));
        assert!(!request.solid_archive);
        assert_eq!(request.volume_size.as_deref(), Some("100m"));
    }

    #[test]
    fn test_solid_flags_last_one_wins() {
        let args = parse(&["compress", "--no-solid", "--solid", "a.txt"]);
        let mut cfg = Config::default();
        cfg.defaults.solid = false;
        assert!(job_request(&args, &cfg).solid_archive);
    }

    #[test]
    fn test_empty_password_means_none() {
        let args = parse(&["compress", "-p", "", "a.txt"]);
        assert!(job_request(&args, &Config::default()).password.is_none());
    }

    #[test]
    fn test_level_out_of_range_rejected_by_parser() {
        assert!(CompressArgs::try_parse_from(["compress", "-l", "10", "a.txt"]).is_err());
    }

    #[test]
    fn test_unknown_method_rejected_by_parser() {
        assert!(CompressArgs::try_parse_from(["compress", "-m", "zstd", "a.txt"]).is_err());
    }

    #[test]
    fn test_settings_from_config_and_flags() {
        let mut cfg = Config::default();
        cfg.engine.binary = "/opt/7zz".into();
        cfg.engine.timeout_secs = Some(120);
        cfg.output.work_root = "/var/tmp/p7".into();

        let settings = job_settings(&parse(&["compress", "a.txt"]), &cfg);
        assert_eq!(settings.engine, PathBuf::from("/opt/7zz"));
        assert_eq!(settings.work_root, PathBuf::from("/var/tmp/p7"));
        assert_eq!(settings.supervisor.timeout, Some(Duration::from_secs(120)));
        assert!(!settings.supervisor.merge_stderr);

        let settings = job_settings(
            &parse(&[
                "compress",
                "--engine",
                "/usr/bin/7z",
                "--timeout",
                "0",
                "--merge-stderr",
                "a.txt",
            ]),
            &cfg,
        );
        assert_eq!(settings.engine, PathBuf::from("/usr/bin/7z"));
        assert_eq!(settings.supervisor.timeout, None);
        assert!(settings.supervisor.merge_stderr);
    }
}
