use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::allocate::AllocationCounts;
use crate::config::Ratios;
use crate::error::Result;
use crate::split::{GroupSummary, SplitPlan};
use crate::types::Split;
use crate::utils::create_output_directory;

/// Image and label directories of one split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDirs {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

// Paths to the output directories for the train/val/test splits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub train: SplitDirs,
    pub val: SplitDirs,
    pub test: SplitDirs,
}

impl OutputDirs {
    pub fn get(&self, split: Split) -> &SplitDirs {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }
}

/// Set up `<dest>/{train,val,test}/{images,labels}`
pub fn setup_output_directories(dest_dir: &Path) -> Result<OutputDirs> {
    let split_dirs = |split: Split| -> Result<SplitDirs> {
        let split_dir = dest_dir.join(split.as_str());
        Ok(SplitDirs {
            images_dir: create_output_directory(&split_dir.join("images"))?,
            labels_dir: create_output_directory(&split_dir.join("labels"))?,
        })
    };

    Ok(OutputDirs {
        train: split_dirs(Split::Train)?,
        val: split_dirs(Split::Val)?,
        test: split_dirs(Split::Test)?,
    })
}

/// Serialized form of a split plan
#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub seed: u64,
    pub ratios: Ratios,
    pub stratified: bool,
    pub counts: AllocationCounts,
    pub groups: &'a [GroupSummary],
    pub assignments: BTreeMap<String, Split>,
}

impl<'a> From<&'a SplitPlan> for Manifest<'a> {
    fn from(plan: &'a SplitPlan) -> Self {
        Self {
            seed: plan.seed,
            ratios: plan.ratios,
            stratified: plan.stratified,
            counts: plan.counts(),
            groups: &plan.groups,
            assignments: plan.assignments(),
        }
    }
}

/// Write the plan as pretty-printed JSON to `path`
pub fn write_manifest(plan: &SplitPlan, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_output_directory(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &Manifest::from(plan))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
