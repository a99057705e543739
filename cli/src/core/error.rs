//! # P7Pack Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout P7Pack. Archive jobs
//! need errors that a caller can match on (an engine exit code, a missing
//! artifact) while the CLI plumbing around them only needs to attach context
//! and print a message.
//!
//! ## Architecture
//!
//! The error system consists of three components:
//! - `ArchiveError`: a `thiserror` enum covering every way a job stage can fail
//! - `JobFailure`: the terminal error of a job, wrapping an `ArchiveError` with
//!   the stage it failed in and diagnostics (attempted command, input preview)
//! - `Result<T>`: a type alias for `anyhow::Result<T>` for application code
//!
//! ## Examples
//!
//! ```rust
//! if request.input_files.is_empty() {
//!     return Err(ArchiveError::InvalidOption("No input files were given".into()));
//! }
//!
//! // Application code adds context with anyhow
//! let cfg = config::load_config().context("Failed to load configuration")?;
//!
//! // Callers can downcast to inspect a failed job
//! if let Some(failure) = err.downcast_ref::<JobFailure>() {
//!     eprintln!("failed while {}", failure.stage);
//! }
//! ```
//!
use crate::common::archive::job::JobState;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the stages of an archive job.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Archiving engine '{binary}' is not available: {reason}")]
    EngineUnavailable { binary: String, reason: String },

    #[error("Compression failed with {}. Diagnostic output:\n{diagnostic_text}", describe_exit(.exit_code))]
    EngineExecution {
        exit_code: Option<i32>,
        diagnostic_text: String,
    },

    #[error("Expected output missing: {0}")]
    MissingOutput(String),

    #[error("Engine did not finish within {}s and was terminated", .0.as_secs())]
    Timeout(Duration),

    #[error("Job cancelled; engine process was terminated")]
    Cancelled,

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    /// Builds an `Io` variant with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ArchiveError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Renders an engine exit status. `None` means the process was killed by a signal.
fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Terminal error of an archive job.
///
/// Carries the stage that failed plus enough context for a human to diagnose
/// the failure: the command that was attempted (password redacted) and the
/// first few input paths.
#[derive(Error, Debug)]
#[error("Archive job failed during {stage}: {source}")]
pub struct JobFailure {
    pub stage: JobState,
    pub source: ArchiveError,
    pub command: Option<String>,
    pub inputs_preview: Vec<String>,
    pub omitted_inputs: usize,
}

impl JobFailure {
    /// Multi-line diagnostic report printed by the CLI after a failed job.
    pub fn diagnostics(&self) -> String {
        let mut report = String::new();
        if let Some(command) = &self.command {
            report.push_str("7z command that was attempted:\n");
            report.push_str(command);
            report.push('\n');
        }
        if !self.inputs_preview.is_empty() {
            report.push_str("\nFile paths being compressed:\n");
            for path in &self.inputs_preview {
                report.push_str(&format!("  - {}\n", path));
            }
            if self.omitted_inputs > 0 {
                report.push_str(&format!("  ... and {} more\n", self.omitted_inputs));
            }
        }
        report
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Validating => "validation",
            JobState::Building => "command building",
            JobState::Running => "engine execution",
            JobState::Collecting => "artifact collection",
            JobState::Reporting => "reporting",
            JobState::Done => "completion",
            JobState::Failed => "failure handling",
        };
        f.write_str(name)
    }
}

/// Type alias for Result using anyhow::Error for application-level code.
pub type Result<T> = anyhow::Result<T>;
