//! # P7Pack Archive Jobs (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! Everything needed to turn a request into an archive produced by the
//! external `7z` engine. The submodules form a pipeline, leaves first:
//!
//! - **`options`**: validates a `JobRequest` into `NormalizedOptions`
//!   (format/method compatibility, input checks, output naming).
//! - **`command`**: maps normalized options onto the engine's argument vector.
//! - **`artifact`**: locates and validates the archive or split volumes.
//! - **`stats`**: compression ratio and space saved.
//! - **`job`**: the `ArchiveJob` state machine that drives the others and the
//!   process supervisor in `common::process`.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::job::{ArchiveJob, JobSettings};
//! use crate::common::ui::Console;
//!
//! # async fn run(settings: JobSettings, request: JobRequest) -> anyhow::Result<()> {
//! let cancel = CancellationToken::new();
//! let result = ArchiveJob::new(&settings, Console::new(false))
//!     .run(request, &cancel)
//!     .await?;
//! println!("{}", result.artifact.display());
//! # Ok(())
//! # }
//! ```
//!

pub mod artifact;
pub mod command;
pub mod job;
pub mod options;
pub mod stats;
