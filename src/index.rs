//! Indexing of the source dataset: image listing and label parsing.

use glob::{glob_with, MatchOptions, Pattern};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SplitError};
use crate::types::{ImageRecord, IndexWarning, IMG_FORMATS, LABEL_EXTENSION};

/// Every image of the source dataset together with its annotated classes
#[derive(Debug, Clone)]
pub struct DatasetIndex {
    // Kept sorted by stem; `get` relies on it
    records: Vec<ImageRecord>,
    pub warnings: Vec<IndexWarning>,
    /// False when the label directory is missing and no stratification is possible
    pub labels_available: bool,
}

impl DatasetIndex {
    /// Build an index from records in any order
    pub fn new(
        mut records: Vec<ImageRecord>,
        warnings: Vec<IndexWarning>,
        labels_available: bool,
    ) -> Self {
        records.sort_by(|a, b| a.stem.cmp(&b.stem));
        Self {
            records,
            warnings,
            labels_available,
        }
    }

    /// Records sorted by stem
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn class_sets(&self) -> BTreeMap<&str, &BTreeSet<i64>> {
        self.records
            .iter()
            .map(|record| (record.stem.as_str(), &record.classes))
            .collect()
    }

    pub fn get(&self, stem: &str) -> Option<&ImageRecord> {
        self.records
            .binary_search_by(|record| record.stem.as_str().cmp(stem))
            .ok()
            .map(|idx| &self.records[idx])
    }
}

/// Index the images in `images_dir` and the labels in `labels_dir`.
///
/// A missing image directory is fatal. A missing label directory is not: every
/// image is indexed as background and `labels_available` is false.
pub fn index_dataset(images_dir: &Path, labels_dir: &Path) -> Result<DatasetIndex> {
    if !images_dir.is_dir() {
        return Err(SplitError::MissingImageDir(images_dir.to_path_buf()));
    }

    let mut warnings = Vec::new();
    let images = list_images(images_dir, &mut warnings)?;
    if images.is_empty() {
        return Err(SplitError::NoImages(images_dir.to_path_buf()));
    }
    info!("Found {} images in {}", images.len(), images_dir.display());

    if !labels_dir.is_dir() {
        let warning = IndexWarning::MissingLabelDir(labels_dir.to_path_buf());
        warn!("{}", warning);
        warnings.push(warning);

        let records = images
            .into_iter()
            .map(|(stem, image_path)| ImageRecord {
                stem,
                image_path,
                label_path: None,
                classes: BTreeSet::new(),
            })
            .collect();

        return Ok(DatasetIndex {
            records,
            warnings,
            labels_available: false,
        });
    }

    // Label files are read in parallel; collect keeps the stem order
    let indexed: Vec<(ImageRecord, Vec<IndexWarning>)> = images
        .into_par_iter()
        .map(|(stem, image_path)| index_image(stem, image_path, labels_dir))
        .collect();

    let mut records = Vec::with_capacity(indexed.len());
    for (record, record_warnings) in indexed {
        warnings.extend(record_warnings);
        records.push(record);
    }

    let background = records.iter().filter(|r| r.classes.is_empty()).count();
    info!(
        "Indexed {} images ({} background, {} warnings)",
        records.len(),
        background,
        warnings.len()
    );

    Ok(DatasetIndex {
        records,
        warnings,
        labels_available: true,
    })
}

/// List the images directly inside `images_dir`, keyed by stem.
///
/// Extensions are matched case-insensitively. When several images share a stem
/// the first one in `IMG_FORMATS` order is kept and the others are reported.
pub fn list_images(
    images_dir: &Path,
    warnings: &mut Vec<IndexWarning>,
) -> Result<BTreeMap<String, PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let escaped_dir = Pattern::escape(&images_dir.to_string_lossy());

    let mut images: BTreeMap<String, PathBuf> = BTreeMap::new();
    for ext in IMG_FORMATS {
        let pattern = format!("{}/*.{}", escaped_dir, ext);
        let entries = glob_with(&pattern, options)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let mut paths: Vec<PathBuf> = collect_entries(entries, warnings)
            .into_iter()
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        for path in paths {
            let Some(stem) = utf8_stem(&path) else {
                let warning = IndexWarning::NonUtf8Name(path);
                warn!("{}", warning);
                warnings.push(warning);
                continue;
            };
            match images.get(&stem) {
                Some(kept) => {
                    let warning = IndexWarning::DuplicateStem {
                        stem,
                        kept: kept.clone(),
                        skipped: path,
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                }
                None => {
                    images.insert(stem, path);
                }
            }
        }
    }

    Ok(images)
}

/// Keep the readable entries of a directory listing, reporting the others
fn collect_entries<I, E>(entries: I, warnings: &mut Vec<IndexWarning>) -> Vec<PathBuf>
where
    I: IntoIterator<Item = std::result::Result<PathBuf, E>>,
    E: Display,
{
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                let warning = IndexWarning::UnreadableEntry(e.to_string());
                warn!("{}", warning);
                warnings.push(warning);
                None
            }
        })
        .collect()
}

/// File stem of `path`, or `None` when it is missing or not valid UTF-8
fn utf8_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

fn index_image(
    stem: String,
    image_path: PathBuf,
    labels_dir: &Path,
) -> (ImageRecord, Vec<IndexWarning>) {
    let label_path = labels_dir.join(format!("{}.{}", stem, LABEL_EXTENSION));
    let mut warnings = Vec::new();

    if !label_path.is_file() {
        debug!("No label file for {}, treating as background", stem);
        let record = ImageRecord {
            stem,
            image_path,
            label_path: None,
            classes: BTreeSet::new(),
        };
        return (record, warnings);
    }

    let classes = match fs::read_to_string(&label_path) {
        Ok(contents) => {
            let (classes, line_warnings) = parse_label_contents(&contents, &label_path);
            warnings.extend(line_warnings);
            classes
        }
        Err(e) => {
            let warning = IndexWarning::UnreadableLabel {
                path: label_path.clone(),
                message: e.to_string(),
            };
            warn!("{}", warning);
            warnings.push(warning);
            BTreeSet::new()
        }
    };

    let record = ImageRecord {
        stem,
        image_path,
        label_path: Some(label_path),
        classes,
    };
    (record, warnings)
}

/// Collect the class ids of a YOLO label file.
///
/// The first whitespace-separated token of every line is the class id; the rest
/// of the line is ignored. Lines that are blank after trimming, or whose first
/// token is not an integer, are skipped with a warning. Empty lines are ignored.
pub fn parse_label_contents(contents: &str, path: &Path) -> (BTreeSet<i64>, Vec<IndexWarning>) {
    let mut classes = BTreeSet::new();
    let mut warnings = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        let parsed = line
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<i64>().ok());

        match parsed {
            Some(class_id) => {
                classes.insert(class_id);
            }
            None => {
                let warning = IndexWarning::MalformedLine {
                    path: path.to_path_buf(),
                    line_number: idx + 1,
                    content: line.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    (classes, warnings)
}
