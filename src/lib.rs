//! Stratified train/val/test splitter for YOLO datasets
//!
//! This library partitions a directory of images and YOLO label files into
//! train, validation and test subsets, keeping the per-class composition of
//! each subset close to that of the source data.

pub mod allocate;
pub mod config;
pub mod error;
pub mod group;
pub mod index;
pub mod io;
pub mod materialize;
pub mod split;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use allocate::{allocate_group, allocation_counts, AllocationCounts, GroupAllocation};
pub use config::{Args, Ratios, TransferMode, DEFAULT_SEED};
pub use error::{Result, SplitError};
pub use group::group_by_composition;
pub use index::{index_dataset, DatasetIndex};
pub use io::{setup_output_directories, write_manifest, OutputDirs};
pub use materialize::materialize;
pub use split::{plan_split, seeded_rng, SplitPlan};
pub use types::{CompositionKey, ImageRecord, IndexWarning, ProcessingStats, Split};

/// Run a complete split as configured by `args`.
///
/// Ratios are validated before any file is read. Returns the plan together with
/// the materialization statistics, which are `None` for a dry run.
pub fn run(args: &Args) -> Result<(SplitPlan, Option<ProcessingStats>)> {
    let ratios = args.to_ratios()?;
    log::info!(
        "Splitting dataset with ratios: Train={}%, Val={}%, Test={}%",
        ratios.train() * 100.0,
        ratios.val() * 100.0,
        ratios.test() * 100.0
    );

    let index = index_dataset(&args.images_dir(), &args.labels_dir())?;
    let plan = plan_split(&index, ratios, args.seed, !args.no_stratify);
    plan.print_summary();

    if let Some(manifest) = &args.manifest {
        write_manifest(&plan, manifest)?;
        log::info!("Wrote split manifest to {}", manifest.display());
    }

    if args.dry_run {
        log::info!("Dry run, no files were touched.");
        return Ok((plan, None));
    }

    let mode = args.transfer_mode();
    log::info!("Action: {} files.", mode.verb());
    let output_dirs = setup_output_directories(&args.dest_dir)?;
    let stats = materialize(&plan, &index, &output_dirs, mode);
    stats.print_summary();

    Ok((plan, Some(stats)))
}
