use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Supported image extensions, in the order used to resolve stems shared by several images
pub const IMG_FORMATS: &[&str] = &["jpg", "jpeg", "png"];

/// Extension of YOLO label files
pub const LABEL_EXTENSION: &str = "txt";

/// The subset an image is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical, order-independent set of class ids present in one image.
///
/// The ids are kept sorted and deduplicated, so two keys are equal exactly
/// when they contain the same ids. The empty key identifies background images.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CompositionKey(Vec<i64>);

impl CompositionKey {
    pub fn new<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        let ids: BTreeSet<i64> = ids.into_iter().collect();
        Self(ids.into_iter().collect())
    }

    pub fn ids(&self) -> &[i64] {
        &self.0
    }

    pub fn is_background(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&BTreeSet<i64>> for CompositionKey {
    fn from(ids: &BTreeSet<i64>) -> Self {
        Self(ids.iter().copied().collect())
    }
}

impl fmt::Display for CompositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("{background}");
        }
        let ids: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "{{{}}}", ids.join(","))
    }
}

/// One image of the source dataset and the classes annotated in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub stem: String,
    pub image_path: PathBuf,
    pub label_path: Option<PathBuf>,
    pub classes: BTreeSet<i64>,
}

impl ImageRecord {
    pub fn composition(&self) -> CompositionKey {
        CompositionKey::from(&self.classes)
    }
}

/// Non-fatal problems found while indexing the source dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexWarning {
    /// The label directory does not exist; the split falls back to unstratified
    MissingLabelDir(PathBuf),
    /// A label line whose first token is not an integer class id
    MalformedLine {
        path: PathBuf,
        line_number: usize,
        content: String,
    },
    /// A label file that could not be read; its image is treated as background
    UnreadableLabel { path: PathBuf, message: String },
    /// A directory entry that could not be read while listing images
    UnreadableEntry(String),
    /// An image whose file name is not valid UTF-8; it is skipped
    NonUtf8Name(PathBuf),
    /// Two images share a stem; only the first one is kept
    DuplicateStem {
        stem: String,
        kept: PathBuf,
        skipped: PathBuf,
    },
}

impl fmt::Display for IndexWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexWarning::MissingLabelDir(path) => write!(
                f,
                "Source labels directory not found at '{}'. Proceeding with an unstratified split.",
                path.display()
            ),
            IndexWarning::MalformedLine {
                path,
                line_number,
                content,
            } => write!(
                f,
                "Skipping malformed line {} in {}: {:?}",
                line_number,
                path.display(),
                content
            ),
            IndexWarning::UnreadableLabel { path, message } => write!(
                f,
                "Failed to read label file {}: {}. Treating image as background.",
                path.display(),
                message
            ),
            IndexWarning::UnreadableEntry(message) => {
                write!(f, "Skipping unreadable directory entry: {}", message)
            }
            IndexWarning::NonUtf8Name(path) => {
                write!(f, "Skipping image with non UTF-8 file name: {:?}", path)
            }
            IndexWarning::DuplicateStem {
                stem,
                kept,
                skipped,
            } => write!(
                f,
                "Duplicate image stem '{}': keeping {}, skipping {}",
                stem,
                kept.display(),
                skipped.display()
            ),
        }
    }
}

// Struct to hold materialization statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_images: usize,
    pub transferred_images: usize,
    pub transferred_labels: usize,
    pub missing_labels: usize,
    pub failed_transfers: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine the counters of two partial runs
    pub fn merge(mut self, other: Self) -> Self {
        self.total_images += other.total_images;
        self.transferred_images += other.transferred_images;
        self.transferred_labels += other.transferred_labels;
        self.missing_labels += other.missing_labels;
        self.failed_transfers += other.failed_transfers;
        self
    }

    pub fn print_summary(&self) {
        log::info!("=== Materialization Summary ===");
        log::info!("Total images: {}", self.total_images);
        log::info!("Images transferred: {}", self.transferred_images);
        log::info!("Labels transferred: {}", self.transferred_labels);
        log::info!("Images without label file: {}", self.missing_labels);

        if self.failed_transfers > 0 {
            log::warn!("Failed transfers: {}", self.failed_transfers);
        }
    }
}
