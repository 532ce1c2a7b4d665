use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, SplitError};

/// Seed used when none is given on the command line
pub const DEFAULT_SEED: u64 = 42;

/// Allowed deviation of the ratio sum from 1.0
pub const RATIO_TOLERANCE: f64 = 1e-3;

/// Command-line arguments for splitting a YOLO dataset into train/val/test sets.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Source directory containing 'images' and 'labels' subdirectories
    #[arg(short = 's', long = "source_dir", default_value = "datas")]
    pub source_dir: PathBuf,

    /// Destination directory where 'train', 'val' and 'test' are created
    #[arg(short = 'd', long = "dest_dir", default_value = "datasets")]
    pub dest_dir: PathBuf,

    /// Train, val and test ratios; must sum to 1.0
    #[arg(
        long = "ratios",
        num_args = 3,
        value_names = ["TRAIN", "VAL", "TEST"],
        default_values_t = [0.8, 0.1, 0.1],
        value_parser = validate_ratio
    )]
    pub ratios: Vec<f64>,

    /// Copy files instead of moving them, leaving the source intact
    #[arg(long = "copy")]
    pub copy: bool,

    /// Seed for random shuffling
    #[arg(long = "seed", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Ignore labels and split all images uniformly at random
    #[arg(long = "no_stratify")]
    pub no_stratify: bool,

    /// Compute and report the split without touching any file
    #[arg(long = "dry_run")]
    pub dry_run: bool,

    /// Write the stem-to-split assignment as JSON to this path
    #[arg(long = "manifest")]
    pub manifest: Option<PathBuf>,
}

impl Args {
    pub fn images_dir(&self) -> PathBuf {
        self.source_dir.join("images")
    }

    pub fn labels_dir(&self) -> PathBuf {
        self.source_dir.join("labels")
    }

    pub fn transfer_mode(&self) -> TransferMode {
        if self.copy {
            TransferMode::Copy
        } else {
            TransferMode::Move
        }
    }

    pub fn to_ratios(&self) -> Result<Ratios> {
        match self.ratios.as_slice() {
            &[train, val, test] => Ratios::new(train, val, test),
            other => Err(SplitError::InvalidRatioCount(other.len())),
        }
    }
}

/// How the materializer transfers files into the destination tree
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    pub fn verb(&self) -> &'static str {
        match self {
            TransferMode::Copy => "Copying",
            TransferMode::Move => "Moving",
        }
    }
}

/// Validated train/val/test proportions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ratios {
    train: f64,
    val: f64,
    test: f64,
}

impl Ratios {
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self> {
        for value in [train, val, test] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SplitError::RatioOutOfRange(value));
            }
        }

        let sum = train + val + test;
        if (sum - 1.0).abs() > RATIO_TOLERANCE {
            return Err(SplitError::InvalidRatios {
                train,
                val,
                test,
                sum,
            });
        }

        Ok(Self { train, val, test })
    }

    pub fn train(&self) -> f64 {
        self.train
    }

    pub fn val(&self) -> f64 {
        self.val
    }

    pub fn test(&self) -> f64 {
        self.test
    }
}

impl Default for Ratios {
    fn default() -> Self {
        Self {
            train: 0.8,
            val: 0.1,
            test: 0.1,
        }
    }
}

// Each ratio on its own must lie in [0.0, 1.0]; the sum is checked by `Ratios::new`
fn validate_ratio(s: &str) -> std::result::Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("RATIO must be between 0.0 and 1.0".to_string()),
    }
}
