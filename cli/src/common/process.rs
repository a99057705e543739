//! # P7Pack Process Supervision (`common::process`)
//!
//! File: cli/src/common/process.rs
//!
//! ## Overview
//!
//! Runs the archiving engine as a child process and supervises it until it
//! exits. Output is consumed while the engine runs, one line at a time, so a
//! long compression stays observable from the first progress line.
//!
//! ## Architecture
//!
//! - The child is spawned with piped stdout and stderr and `kill_on_drop`.
//! - Both pipes are split on `\n` and read with `tokio::select!` in the
//!   supervising task. Bytes that are not UTF-8 are replaced, never fatal. Every
//!   stdout line (and every stderr line when `merge_stderr` is set) is
//!   classified and passed to the caller's observer in emission order.
//! - When stderr is not merged it is captured and becomes the diagnostic text.
//! - `run` returns only after the child has exited and both pipes are drained.
//! - A non-zero exit is not an error here; it is part of `ProcessOutcome`.
//! - An optional timeout and a `CancellationToken` both kill the child and
//!   surface as `ArchiveError::Timeout` / `ArchiveError::Cancelled`.
//!
//! ## Usage
//!
//! ```rust
//! let outcome = process::run(&invocation, &SupervisorOptions::default(), &cancel, &mut |line| {
//!     println!("{} {}", line.kind.marker(), line.text);
//! })
//! .await?;
//! if !outcome.success() {
//!     eprintln!("{}", outcome.diagnostic_text);
//! }
//! ```
//!
use crate::common::archive::command::EngineInvocation;
use crate::core::error::ArchiveError;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

/// Lines that mark a successful step in the engine's output.
const SUCCESS_MARKERS: [&str; 5] = ["Everything", "OK", "Compressing", "Adding", "files,"];
const ERROR_MARKERS: [&str; 2] = ["ERROR", "Error"];

/// Trailing lines kept as diagnostics when stderr is merged into the stream.
const MERGED_DIAGNOSTIC_LINES: usize = 20;

/// How an output line is surfaced. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Progress,
    Success,
    Error,
    Plain,
}

impl LineKind {
    /// Classifies one line of engine output.
    ///
    /// # Arguments
    ///
    /// * `line` - A decoded output line without its terminator.
    ///
    /// # Returns
    ///
    /// * `LineKind` - `Progress` if the line contains `%`; otherwise `Success`
    ///   for any success marker, `Error` for `ERROR`/`Error`, else `Plain`.
    ///   The first matching rule wins.
    pub fn classify(line: &str) -> LineKind {
        if line.contains('%') {
            LineKind::Progress
        } else if SUCCESS_MARKERS.iter().any(|marker| line.contains(marker)) {
            LineKind::Success
        } else if ERROR_MARKERS.iter().any(|marker| line.contains(marker)) {
            LineKind::Error
        } else {
            LineKind::Plain
        }
    }

    /// Prefix used when echoing the line to a terminal.
    pub fn marker(self) -> &'static str {
        match self {
            LineKind::Progress => "⏳",
            LineKind::Success => "✓",
            LineKind::Error => "❌",
            LineKind::Plain => " ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One line of engine output, in the order it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub kind: LineKind,
    pub text: String,
}

/// Supervision knobs, normally taken from `[engine]` in the config.
#[derive(Debug, Clone, Default)]
pub struct SupervisorOptions {
    pub merge_stderr: bool,
    pub timeout: Option<Duration>,
}

/// Result of one supervised engine run.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub diagnostic_text: String,
    pub lines: Vec<OutputLine>,
    pub elapsed: Duration,
}

impl ProcessOutcome {
    /// `true` only for an exit code of zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Spawns the engine and supervises it to completion.
///
/// # Errors
///
/// - `ArchiveError::EngineUnavailable` if the process cannot be spawned.
/// - `ArchiveError::Timeout` / `ArchiveError::Cancelled` if the run was cut short.
/// - `ArchiveError::Io` if reading a pipe or waiting on the child fails.
#[instrument(skip_all, fields(program = %invocation.program.display()))]
pub async fn run(
    invocation: &EngineInvocation,
    options: &SupervisorOptions,
    cancel: &CancellationToken,
    observer: &mut dyn FnMut(&OutputLine),
) -> Result<ProcessOutcome, ArchiveError> {
    let started = Instant::now();
    let deadline = options.timeout.map(|timeout| started + timeout);

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ArchiveError::EngineUnavailable {
            binary: invocation.program.display().to_string(),
            reason: e.to_string(),
        })?;
    info!("Spawned engine process (pid {:?})", child.id());

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ArchiveError::io("capturing engine stdout", pipe_missing()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ArchiveError::io("capturing engine stderr", pipe_missing()))?;
    let mut stdout_lines = BufReader::new(stdout).split(b'\n');
    let mut stderr_lines = BufReader::new(stderr).split(b'\n');
    let mut stdout_open = true;
    let mut stderr_open = true;

    let mut lines = Vec::new();
    let mut captured_stderr = Vec::new();

    while stdout_open || stderr_open {
        tokio::select! {
            line = stdout_lines.next_segment(), if stdout_open => {
                match line.map_err(|e| ArchiveError::io("reading engine stdout", e))? {
                    Some(raw) => {
                        emit(OutputStream::Stdout, decode_line(&raw), &mut lines, observer)
                    }
                    None => stdout_open = false,
                }
            }
            line = stderr_lines.next_segment(), if stderr_open => {
                match line.map_err(|e| ArchiveError::io("reading engine stderr", e))? {
                    Some(raw) if options.merge_stderr => {
                        emit(OutputStream::Stderr, decode_line(&raw), &mut lines, observer)
                    }
                    Some(raw) => {
                        let text = decode_line(&raw);
                        trace!("engine stderr: {}", text);
                        captured_stderr.push(text);
                    }
                    None => stderr_open = false,
                }
            }
            _ = cancel.cancelled() => {
                return Err(terminate(&mut child, Interrupt::Cancelled, options).await);
            }
            _ = sleep_until(deadline) => {
                return Err(terminate(&mut child, Interrupt::TimedOut, options).await);
            }
        }
    }

    let waited = tokio::select! {
        status = child.wait() => Ok(status),
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        _ = sleep_until(deadline) => Err(Interrupt::TimedOut),
    };
    let status = match waited {
        Ok(status) => status.map_err(|e| ArchiveError::io("waiting for engine process", e))?,
        Err(interrupt) => return Err(terminate(&mut child, interrupt, options).await),
    };

    let elapsed = started.elapsed();
    let diagnostic_text = if options.merge_stderr {
        let tail_start = lines.len().saturating_sub(MERGED_DIAGNOSTIC_LINES);
        lines[tail_start..]
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        captured_stderr.join("\n")
    };

    let outcome = ProcessOutcome {
        exit_code: exit_code(status),
        diagnostic_text,
        lines,
        elapsed,
    };
    debug!(
        "Engine exited with {:?} after {:.2}s ({} output lines)",
        outcome.exit_code,
        elapsed.as_secs_f64(),
        outcome.lines.len()
    );
    Ok(outcome)
}

/// Engine output carries raw file-name bytes; invalid UTF-8 is replaced, a
/// trailing `\r` dropped.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

fn emit(
    stream: OutputStream,
    text: String,
    lines: &mut Vec<OutputLine>,
    observer: &mut dyn FnMut(&OutputLine),
) {
    let line = OutputLine {
        stream,
        kind: LineKind::classify(&text),
        text,
    };
    observer(&line);
    lines.push(line);
}

/// Resolves at `deadline`, or never when there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Why a run was cut short before the engine exited on its own.
#[derive(Debug, Clone, Copy)]
enum Interrupt {
    Cancelled,
    TimedOut,
}

/// Kills the child, reaps it and returns the error matching `interrupt`.
async fn terminate(
    child: &mut Child,
    interrupt: Interrupt,
    options: &SupervisorOptions,
) -> ArchiveError {
    let reason = match interrupt {
        Interrupt::Cancelled => ArchiveError::Cancelled,
        Interrupt::TimedOut => ArchiveError::Timeout(options.timeout.unwrap_or_default()),
    };
    warn!("Terminating engine process: {}", reason);
    if let Err(e) = child.kill().await {
        warn!("Failed to kill engine process: {}", e);
    }
    reason
}

fn exit_code(status: ExitStatus) -> Option<i32> {
    status.code()
}

fn pipe_missing() -> std::io::Error {
    std::io::Error::other("pipe was not attached to the child process")
}

// --- Unit Tests ---
#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn shell(script: &str) -> EngineInvocation {
        EngineInvocation {
            program: PathBuf::from("sh"),
            args: vec![OsString::from("-c"), OsString::from(script)],
            output_path: PathBuf::from("/nonexistent/compressed.7z"),
            primary_output: PathBuf::from("/nonexistent/compressed.7z"),
            volume_pattern: None,
            input_count: 0,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(LineKind::classify(" 42% 3 + file.txt"), LineKind::Progress);
        assert_eq!(LineKind::classify("Everything is Ok"), LineKind::Success);
        assert_eq!(LineKind::classify("Adding  a.txt"), LineKind::Success);
        assert_eq!(LineKind::classify("Files read from disk: 2, files, 3"), LineKind::Success);
        assert_eq!(LineKind::classify("ERROR: cannot open"), LineKind::Error);
        assert_eq!(LineKind::classify("System Error:"), LineKind::Error);
        assert_eq!(LineKind::classify("Scanning the drive:"), LineKind::Plain);
        assert_eq!(LineKind::classify(""), LineKind::Plain);
    }

    #[tokio::test]
    async fn test_run_streams_lines_in_order() {
        let invocation = shell("echo 'Scanning'; echo ' 50%'; echo 'Everything is Ok'; echo oops >&2");
        let mut seen = Vec::new();
        let outcome = run(
            &invocation,
            &SupervisorOptions::default(),
            &CancellationToken::new(),
            &mut |line| seen.push((line.kind, line.text.clone())),
        )
        .await
        .unwrap();

        assert!(outcome.success());
        assert_eq!(
            seen,
            vec![
                (LineKind::Plain, "Scanning".to_string()),
                (LineKind::Progress, " 50%".to_string()),
                (LineKind::Success, "Everything is Ok".to_string()),
            ]
        );
        assert_eq!(outcome.lines.len(), 3);
        assert_eq!(outcome.diagnostic_text, "oops");
    }

    #[test]
    fn test_decode_line_is_lossy_and_strips_cr() {
        assert_eq!(decode_line(b"Everything is Ok\r"), "Everything is Ok");
        assert_eq!(decode_line(b"caf\xe9.txt"), "caf\u{FFFD}.txt");
        assert_eq!(decode_line(b""), "");
    }

    #[tokio::test]
    async fn test_run_survives_non_utf8_output() {
        let invocation = shell(
            "printf ' 10%% + caf\\351.txt\\n'; printf 'bad \\351\\n' >&2; echo 'Everything is Ok'; exit 0",
        );
        let mut seen = Vec::new();
        let outcome = run(
            &invocation,
            &SupervisorOptions::default(),
            &CancellationToken::new(),
            &mut |line| seen.push(line.text.clone()),
        )
        .await
        .unwrap();

        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(
            seen,
            vec![
                " 10% + caf\u{FFFD}.txt".to_string(),
                "Everything is Ok".to_string()
            ]
        );
        assert_eq!(outcome.lines[0].kind, LineKind::Progress);
        assert_eq!(outcome.diagnostic_text, "bad \u{FFFD}");
    }

    #[tokio::test]
    async fn test_run_reports_nonzero_exit_without_error() {
        let invocation = shell("echo 'ERROR: no such file' >&2; exit 2");
        let outcome = run(
            &invocation,
            &SupervisorOptions::default(),
            &CancellationToken::new(),
            &mut |_| {},
        )
        .await
        .unwrap();

        assert!(!outcome.success());
        assert_eq!(outcome.exit_code, Some(2));
        assert!(outcome.diagnostic_text.contains("no such file"));
    }

    #[tokio::test]
    async fn test_run_merged_stderr_joins_stream() {
        let invocation = shell("echo out; echo 'ERROR: bad' >&2; exit 1");
        let options = SupervisorOptions {
            merge_stderr: true,
            timeout: None,
        };
        let outcome = run(&invocation, &options, &CancellationToken::new(), &mut |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.lines.len(), 2);
        let err_line = outcome
            .lines
            .iter()
            .find(|l| l.stream == OutputStream::Stderr)
            .unwrap();
        assert_eq!(err_line.kind, LineKind::Error);
        assert!(outcome.diagnostic_text.contains("ERROR: bad"));
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let mut invocation = shell("true");
        invocation.program = PathBuf::from("/definitely/not/a/real/7z-binary");
        let err = run(
            &invocation,
            &SupervisorOptions::default(),
            &CancellationToken::new(),
            &mut |_| {},
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ArchiveError::EngineUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let invocation = shell("sleep 5");
        let options = SupervisorOptions {
            merge_stderr: false,
            timeout: Some(Duration::from_millis(200)),
        };
        let started = std::time::Instant::now();
        let err = run(&invocation, &options, &CancellationToken::new(), &mut |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_run_cancelled() {
        let invocation = shell("sleep 5");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let err = run(&invocation, &SupervisorOptions::default(), &cancel, &mut |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Cancelled));
    }
}
