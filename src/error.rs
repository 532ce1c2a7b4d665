//! Error types for dataset splitting.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, SplitError>;

/// Fatal errors that abort a split before or while it is planned.
///
/// Recoverable problems (malformed label lines, a missing label directory,
/// per-file transfer failures) are reported as warnings instead.
#[derive(Error, Debug)]
pub enum SplitError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source images directory not found at '{}'", .0.display())]
    MissingImageDir(PathBuf),

    #[error("No image files found in '{}'", .0.display())]
    NoImages(PathBuf),

    #[error("Ratios must sum to 1.0 (got {train} + {val} + {test} = {sum})")]
    InvalidRatios {
        train: f64,
        val: f64,
        test: f64,
        sum: f64,
    },

    #[error("Each ratio must lie between 0.0 and 1.0 (got {0})")]
    RatioOutOfRange(f64),

    #[error("Expected exactly 3 ratios, got {0}")]
    InvalidRatioCount(usize),

    /// Failed to serialize the split manifest
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}
