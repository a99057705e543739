//! # P7Pack Compression Statistics (`common::archive::stats`)
//!
//! File: cli/src/common/archive/stats.rs
//!
//! Computes the compression ratio and space saved for a finished job.
//! A ratio of `0` is reported for empty input instead of dividing by zero,
//! and negative values (the archive grew) are reported unchanged.
//!
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionStats {
    pub total_input_bytes: u64,
    pub total_output_bytes: u64,
    /// `(1 - output / input) * 100`; negative means expansion.
    pub ratio_percent: f64,
    /// `input - output`; negative means expansion.
    pub space_saved_bytes: i64,
}

/// Computes compression statistics for one job.
///
/// # Arguments
///
/// * `total_input_bytes` - Sum of the input file sizes at resolution time.
/// * `total_output_bytes` - Sum of every produced archive or volume.
///
/// # Returns
///
/// * `CompressionStats` - `ratio_percent` is `(1 - output / input) * 100`,
///   `0.0` for empty input, and negative when the archive grew. Space saved
///   is signed for the same reason.
pub fn report(total_input_bytes: u64, total_output_bytes: u64) -> CompressionStats {
    let ratio_percent = if total_input_bytes == 0 {
        0.0
    } else {
        (1.0 - total_output_bytes as f64 / total_input_bytes as f64) * 100.0
    };
    CompressionStats {
        total_input_bytes,
        total_output_bytes,
        ratio_percent,
        space_saved_bytes: total_input_bytes as i64 - total_output_bytes as i64,
    }
}
