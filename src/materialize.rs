use indicatif::ProgressBar;
use log::{error, info, warn};
use rayon::prelude::*;
use std::path::Path;

use crate::config::TransferMode;
use crate::index::DatasetIndex;
use crate::io::{OutputDirs, SplitDirs};
use crate::split::SplitPlan;
use crate::types::{ImageRecord, ProcessingStats, Split, LABEL_EXTENSION};
use crate::utils::{create_progress_bar, transfer_file};

/// Copy or move every planned image and its label into the output tree.
///
/// The plan is fully computed beforehand, so files are transferred in parallel.
/// A failed transfer is logged and counted but does not stop the others.
pub fn materialize(
    plan: &SplitPlan,
    index: &DatasetIndex,
    output_dirs: &OutputDirs,
    mode: TransferMode,
) -> ProcessingStats {
    info!("{} files into {} splits...", mode.verb(), Split::ALL.len());

    Split::ALL
        .iter()
        .map(|&split| {
            let stems = plan.stems(split);
            if stems.is_empty() {
                return ProcessingStats::new();
            }

            let label = split.as_str();
            let pb = create_progress_bar(stems.len() as u64, label);
            let stats = process_split_in_parallel(stems, index, output_dirs.get(split), mode, &pb);
            pb.finish_with_message(format!("{} processing complete", label));
            stats
        })
        .fold(ProcessingStats::new(), ProcessingStats::merge)
}

/// Transfer a batch of stems in parallel
pub fn process_split_in_parallel(
    stems: &[String],
    index: &DatasetIndex,
    dirs: &SplitDirs,
    mode: TransferMode,
    pb: &ProgressBar,
) -> ProcessingStats {
    stems
        .par_iter()
        .map(|stem| {
            let stats = match index.get(stem) {
                Some(record) => transfer_record(record, dirs, mode),
                None => {
                    error!("Stem {} is not part of the dataset index", stem);
                    ProcessingStats {
                        total_images: 1,
                        failed_transfers: 1,
                        ..ProcessingStats::default()
                    }
                }
            };
            pb.inc(1);
            stats
        })
        .reduce(ProcessingStats::new, ProcessingStats::merge)
}

/// Transfer one image and, if present, its label file
pub fn transfer_record(record: &ImageRecord, dirs: &SplitDirs, mode: TransferMode) -> ProcessingStats {
    let mut stats = ProcessingStats::new();
    stats.total_images = 1;

    let Some(file_name) = record.image_path.file_name() else {
        error!("Image path has no file name: {:?}", record.image_path);
        stats.failed_transfers += 1;
        return stats;
    };

    let image_dest = dirs.images_dir.join(file_name);
    if report_transfer(&record.image_path, &image_dest, mode) {
        stats.transferred_images += 1;
    } else {
        stats.failed_transfers += 1;
    }

    match &record.label_path {
        Some(label_path) => {
            let label_dest = dirs
                .labels_dir
                .join(format!("{}.{}", record.stem, LABEL_EXTENSION));
            if report_transfer(label_path, &label_dest, mode) {
                stats.transferred_labels += 1;
            } else {
                stats.failed_transfers += 1;
            }
        }
        None => stats.missing_labels += 1,
    }

    stats
}

fn report_transfer(src: &Path, dest: &Path, mode: TransferMode) -> bool {
    if dest.exists() {
        warn!("Overwriting existing file {}", dest.display());
    }
    match transfer_file(src, dest, mode) {
        Ok(()) => true,
        Err(e) => {
            error!(
                "Error {} {} to {}: {}",
                mode.verb().to_lowercase(),
                src.display(),
                dest.display(),
                e
            );
            false
        }
    }
}
