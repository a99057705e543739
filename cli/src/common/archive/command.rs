//! # P7Pack Engine Command Builder (`common::archive::command`)
//!
//! File: cli/src/common/archive/command.rs
//!
//! ## Overview
//!
//! Maps `NormalizedOptions` onto the argument vector of the `7z` engine. The
//! mapping is a pure function: no filesystem access, no process knowledge, so
//! the same options and output path always yield the same vector.
//!
//! ## Argument layout
//!
//! ```text
//! 7z a -t<fmt> -mx=<level> [method/solid flags] [-p<pw> [-mhe=on]] [-v<size>] -bsp1 -bt <output> <inputs...>
//! ```
//!
//! - `7z`: `-m0=<method>` and `-ms=on|off`
//! - `zip`: `-mm=<token>` through `ZIP_METHOD_TOKENS`, no solidity flag
//! - `tar`: neither method nor solidity flags
//! - header encryption (`-mhe=on`) is only emitted for `7z` with a password
//!
use super::options::{ArchiveFormat, CompressionMethod, NormalizedOptions};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// `zip` method tokens. LZMA2 has no zip encoding and maps to LZMA.
const ZIP_METHOD_TOKENS: &[(CompressionMethod, &str)] = &[
    (CompressionMethod::Lzma, "LZMA"),
    (CompressionMethod::Lzma2, "LZMA"),
    (CompressionMethod::Ppmd, "PPMd"),
    (CompressionMethod::Bzip2, "BZip2"),
    (CompressionMethod::Deflate, "Deflate"),
    (CompressionMethod::Copy, "Copy"),
];

/// Token used for any method missing from `ZIP_METHOD_TOKENS`.
const ZIP_FALLBACK_TOKEN: &str = "Deflate";

/// Commands at or above this many arguments are abbreviated in diagnostics.
const DISPLAY_FULL_LIMIT: usize = 20;
const DISPLAY_HEAD: usize = 10;

/// Looks up the zip method token for `method`.
pub fn zip_method_token(method: CompressionMethod) -> &'static str {
    ZIP_METHOD_TOKENS
        .iter()
        .find(|(candidate, _)| *candidate == method)
        .map(|(_, token)| *token)
        .unwrap_or(ZIP_FALLBACK_TOKEN)
}

/// A fully built engine command for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Archive path passed to the engine.
    pub output_path: PathBuf,
    /// The artifact expected once the engine succeeds (first volume when split).
    pub primary_output: PathBuf,
    /// `compressed.<fmt>.*` when splitting was requested.
    pub volume_pattern: Option<String>,
    /// Number of trailing input path arguments.
    pub input_count: usize,
}

impl EngineInvocation {
    /// Arguments as (lossy) UTF-8 strings.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    /// Renders the command for logs and error reports.
    ///
    /// The password argument is masked. Long commands show the first ten
    /// elements followed by the number of input files.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.to_string_lossy().into_owned());
        parts.extend(self.args_lossy().into_iter().map(|arg| {
            if arg.starts_with("-p") {
                "-p****".to_string()
            } else {
                arg
            }
        }));

        if parts.len() < DISPLAY_FULL_LIMIT {
            parts.join(" ")
        } else {
            format!(
                "{}... [+{} files]",
                parts[..DISPLAY_HEAD].join(" "),
                self.input_count
            )
        }
    }
}

/// Builds the engine invocation for `options`, writing to `output_path`.
pub fn build(options: &NormalizedOptions, program: &Path, output_path: &Path) -> EngineInvocation {
    let mut args: Vec<OsString> = vec![
        "a".into(),
        format!("-t{}", options.format).into(),
        format!("-mx={}", options.level).into(),
    ];

    match options.format {
        ArchiveFormat::SevenZip => {
            args.push(format!("-m0={}", options.method).into());
            let solid = if options.solid { "on" } else { "off" };
            args.push(format!("-ms={}", solid).into());
        }
        ArchiveFormat::Zip => {
            args.push(format!("-mm={}", zip_method_token(options.method)).into());
        }
        ArchiveFormat::Tar => {}
    }

    if let Some(password) = &options.password {
        args.push(format!("-p{}", password.expose()).into());
        if options.format == ArchiveFormat::SevenZip {
            args.push("-mhe=on".into());
        }
    }

    if let Some(size) = &options.volume_size {
        args.push(format!("-v{}", size).into());
    }

    args.push("-bsp1".into());
    args.push("-bt".into());

    args.push(output_path.as_os_str().to_owned());
    args.extend(options.inputs.iter().map(|input| input.path.as_os_str().to_owned()));

    let work_dir = output_path.parent().unwrap_or_else(|| Path::new(""));
    EngineInvocation {
        program: program.to_path_buf(),
        args,
        output_path: output_path.to_path_buf(),
        primary_output: options.primary_output_path(work_dir),
        volume_pattern: options.volume_pattern(),
        input_count: options.inputs.len(),
    }
}
