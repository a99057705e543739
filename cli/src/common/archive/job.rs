//! # P7Pack Archive Job (`common::archive::job`)
//!
//! File: cli/src/common/archive/job.rs
//!
//! ## Overview
//!
//! Sequences one archive job from request to artifact:
//!
//! ```text
//! Validating -> Building -> Running -> Collecting -> Reporting -> Done
//!      \            \           \            \             \
//!       `------------`-----------`------------`-------------`--> Failed
//! ```
//!
//! - **Validating**: `options::resolve` checks and normalizes the request.
//! - **Building**: the engine's readiness is confirmed (cached per process),
//!   a job directory is created and the engine command built.
//! - **Running**: the engine is supervised; a non-zero exit fails the job.
//! - **Collecting**: the produced archive or volumes are located.
//! - **Reporting**: statistics are computed and printed.
//!
//! There are no retries and no partial results: one engine invocation either
//! produces the archive or the job fails with a `JobFailure` carrying the
//! stage, the attempted command and a preview of the inputs.
//!
use super::artifact::{self, Artifact, ArtifactSet};
use super::command::{self, EngineInvocation};
use super::options::{self, level_name, ArchiveFormat, JobRequest, NormalizedOptions};
use super::stats::{self, CompressionStats};
use crate::common::fs::io;
use crate::common::process::{self, SupervisorOptions};
use crate::common::system;
use crate::common::ui::{format_signed_size, format_size, Console};
use crate::core::error::{ArchiveError, JobFailure};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

/// Number of input paths included in failure diagnostics.
const INPUT_PREVIEW_LEN: usize = 5;

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Validating,
    Building,
    Running,
    Collecting,
    Reporting,
    Done,
    Failed,
}

/// Environment a job runs in, derived from configuration.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub engine: PathBuf,
    pub work_root: PathBuf,
    pub supervisor: SupervisorOptions,
}

/// What a successful job hands back.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    /// The primary artifact (first volume when split).
    pub artifact: PathBuf,
    /// Every produced file, in volume order.
    pub artifacts: Vec<Artifact>,
    pub work_dir: PathBuf,
    #[serde(flatten)]
    pub stats: CompressionStats,
    /// Non-fatal notices, e.g. a substituted compression method.
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Runs a single archive job through its state machine.
pub struct ArchiveJob<'a> {
    settings: &'a JobSettings,
    console: Console,
    state: JobState,
    command: Option<String>,
    inputs_preview: Vec<String>,
    omitted_inputs: usize,
}

impl<'a> ArchiveJob<'a> {
    pub fn new(settings: &'a JobSettings, console: Console) -> Self {
        ArchiveJob {
            settings,
            console,
            state: JobState::Validating,
            command: None,
            inputs_preview: Vec::new(),
            omitted_inputs: 0,
        }
    }

    /// Executes the job. The engine is never spawned if validation fails.
    #[instrument(skip_all, fields(inputs = request.input_files.len(), format = %request.archive_format))]
    pub async fn run(
        mut self,
        request: JobRequest,
        cancel: &CancellationToken,
    ) -> Result<JobResult, JobFailure> {
        let started_at = Utc::now();
        let clock = Instant::now();
        self.inputs_preview = request
            .input_files
            .iter()
            .take(INPUT_PREVIEW_LEN)
            .map(|path| path.display().to_string())
            .collect();
        self.omitted_inputs = request.input_files.len().saturating_sub(INPUT_PREVIEW_LEN);

        self.console.banner("🗜️  P7ZIP FILE COMPRESSION");
        self.console.line(&format!(
            "\n📥 Processing {} input file(s)...",
            request.input_files.len()
        ));

        // Validating
        let options = options::resolve(request).map_err(|e| self.fail(e))?;
        self.print_inputs(&options);

        // Building
        self.advance(JobState::Building);
        system::ensure_engine_ready(&self.settings.engine)
            .await
            .map_err(|e| self.fail(e))?;
        let work_dir = io::create_job_dir(&self.settings.work_root).map_err(|e| self.fail(e))?;
        let invocation = command::build(
            &options,
            &self.settings.engine,
            &options.output_path(&work_dir),
        );
        self.command = Some(invocation.display());
        debug!(
            "Expecting {} (volumes: {})",
            invocation.primary_output.display(),
            invocation.volume_pattern.as_deref().unwrap_or("none")
        );
        self.print_settings(&options, &invocation);

        // Running
        self.advance(JobState::Running);
        let console = self.console;
        let outcome = process::run(&invocation, &self.settings.supervisor, cancel, &mut |line| {
            if !line.text.is_empty() {
                console.line(&format!("{} {}", line.kind.marker(), line.text));
            }
        })
        .await
        .map_err(|e| self.fail(e))?;
        if !outcome.success() {
            self.console.banner("❌ COMPRESSION FAILED");
            return Err(self.fail(ArchiveError::EngineExecution {
                exit_code: outcome.exit_code,
                diagnostic_text: outcome.diagnostic_text,
            }));
        }
        info!(
            "Engine finished in {:.2}s",
            outcome.elapsed.as_secs_f64()
        );
        self.console.rule();
        self.console.line("✅ Compression completed successfully!");

        // Collecting
        self.advance(JobState::Collecting);
        let artifacts = artifact::collect(&options, &work_dir).map_err(|e| self.fail(e))?;
        self.print_artifacts(&artifacts);

        // Reporting
        self.advance(JobState::Reporting);
        let stats = stats::report(options.total_input_bytes(), artifacts.total_bytes());
        self.print_stats(&stats);

        self.advance(JobState::Done);
        let result = JobResult {
            artifact: artifacts.primary().path.clone(),
            artifacts: artifacts.members().to_vec(),
            work_dir,
            stats,
            warnings: options.notices,
            started_at,
            elapsed_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            "Archive job finished: {} ({} bytes -> {} bytes)",
            result.artifact.display(),
            stats.total_input_bytes,
            stats.total_output_bytes
        );
        Ok(result)
    }

    fn advance(&mut self, next: JobState) {
        debug!("Job state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Moves to `Failed` and wraps `source` with the job's diagnostics.
    fn fail(&mut self, source: ArchiveError) -> JobFailure {
        let stage = self.state;
        error!("Archive job failed during {}: {}", stage, source);
        self.state = JobState::Failed;
        JobFailure {
            stage,
            source,
            command: self.command.clone(),
            inputs_preview: self.inputs_preview.clone(),
            omitted_inputs: self.omitted_inputs,
        }
    }

    fn print_inputs(&self, options: &NormalizedOptions) {
        for (idx, input) in options.inputs.iter().enumerate() {
            self.console.line(&format!(
                "  [{}] {} ({})",
                idx + 1,
                display_name(&input.path),
                format_size(input.size)
            ));
        }
        self.console.line(&format!(
            "\n📊 Total input size: {}",
            format_size(options.total_input_bytes())
        ));
        for notice in &options.notices {
            self.console.line(&format!("⚠️  Warning: {}", notice));
        }
    }

    fn print_settings(&self, options: &NormalizedOptions, invocation: &EngineInvocation) {
        self.console.line(&format!(
            "\n⚙️  Compression level: {} ({})",
            options.level,
            level_name(options.level)
        ));
        match options.format {
            ArchiveFormat::SevenZip => {
                self.console
                    .line(&format!("⚙️  Compression method: {}", options.method));
                if options.solid {
                    self.console.line("⚙️  Solid archive: enabled");
                }
            }
            ArchiveFormat::Zip => {
                self.console
                    .line(&format!("⚙️  Compression method: {}", options.method));
            }
            ArchiveFormat::Tar => {
                self.console
                    .line("⚙️  Archive format: tar (compression via level only)");
            }
        }
        if options.password.is_some() {
            self.console.line("🔒 Password protection: enabled");
        }
        if let Some(size) = &options.volume_size {
            self.console.line(&format!("📦 Volume size: {}", size));
        }
        self.console.line("\n🚀 Starting compression...");
        self.console.line(&format!(
            "📦 Output format: {}",
            options.format.as_str().to_ascii_uppercase()
        ));
        self.console.line(&format!("Command: {}", invocation.display()));
        self.console.rule();
    }

    fn print_artifacts(&self, artifacts: &ArtifactSet) {
        if let ArtifactSet::Volumes(volumes) = artifacts {
            self.console
                .line(&format!("\n📦 Created {} volume(s)", artifacts.len()));
            for volume in volumes {
                self.console.line(&format!(
                    "  • {} ({})",
                    display_name(&volume.path),
                    format_size(volume.size)
                ));
            }
            self.console.line(&format!(
                "\n⚠️  Returning first volume: {}",
                display_name(&artifacts.primary().path)
            ));
            self.console
                .line("   Note: Download all volumes manually to extract");
        }
    }

    fn print_stats(&self, stats: &CompressionStats) {
        self.console.line("\n📊 COMPRESSION STATISTICS");
        self.console.line(&format!(
            "  Original size:   {}",
            format_size(stats.total_input_bytes)
        ));
        self.console.line(&format!(
            "  Compressed size: {}",
            format_size(stats.total_output_bytes)
        ));
        self.console.line(&format!(
            "  Compression ratio: {:.1}% reduction",
            stats.ratio_percent
        ));
        self.console.line(&format!(
            "  Space saved: {}",
            format_signed_size(stats.space_saved_bytes)
        ));
        self.console.banner("✨ Process complete!");
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
