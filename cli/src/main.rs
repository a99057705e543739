//! # P7Pack Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the P7Pack CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Wiring Ctrl-C to job cancellation
//! - Routing execution to the command handlers
//!
//! ## Examples
//!
//! ```bash
//! # Compress two files into compressed.7z
//! p7pack compress notes.txt data.csv
//!
//! # Verify the engine with debug logging
//! p7pack -vv check
//! ```
//!
//! Command processing flow:
//! 1. Parse command-line args via Clap
//! 2. Configure logging based on verbosity level
//! 3. Route to the appropriate command handler
//! 4. Print any error and exit with status 1
//!
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Command handlers (compress, check)
mod common; // Archive pipeline, process supervision, fs and ui helpers
mod core; // Configuration and error types

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "p7pack",
    about = "🗜️  P7Pack: archive files with the 7z engine",
    long_about = "Creates 7z, zip or tar archives by driving the external 7z engine.\n\
                  Streams engine progress, validates the produced archive or volumes,\n\
                  and reports compression statistics.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// All available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "c")]
    Compress(commands::compress::CompressArgs),
    Check(commands::check::CheckArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling job...");
            on_interrupt.cancel();
        }
    });

    let command_result = match cli.command {
        Commands::Compress(args) => commands::compress::handle_compress(args, cancel).await,
        Commands::Check(args) => commands::check::handle_check(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
