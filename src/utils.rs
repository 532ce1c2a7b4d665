use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::TransferMode;

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let template = format!(
        "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
        label
    );
    let style = ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Create an output directory if needed and return its path.
///
/// Existing directories are kept as they are; files already inside may be overwritten.
pub fn create_output_directory(path: &Path) -> io::Result<PathBuf> {
    if path.exists() {
        debug!("Directory {:?} already exists, reusing it", path);
    }
    fs::create_dir_all(path)?;
    Ok(path.to_path_buf())
}

/// Copy or move a single file to `dest`
pub fn transfer_file(src: &Path, dest: &Path, mode: TransferMode) -> io::Result<()> {
    match mode {
        TransferMode::Copy => fs::copy(src, dest).map(|_| ()),
        TransferMode::Move => match fs::rename(src, dest) {
            Ok(()) => Ok(()),
            // Rename fails across filesystems; copy and remove instead
            Err(_) => {
                fs::copy(src, dest)?;
                fs::remove_file(src)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_transfer_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("src.txt");
        File::create(&src).unwrap().write_all(b"0 0.5 0.5 0.1 0.1\n").unwrap();

        let copied = temp_dir.path().join("copied.txt");
        transfer_file(&src, &copied, TransferMode::Copy).unwrap();
        assert!(src.exists());
        assert_eq!(fs::read(&copied).unwrap(), fs::read(&src).unwrap());

        let moved = temp_dir.path().join("moved.txt");
        transfer_file(&src, &moved, TransferMode::Move).unwrap();
        assert!(!src.exists());
        assert!(moved.exists());
    }

    #[test]
    fn test_create_output_directory_keeps_contents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("train/images");
        create_output_directory(&dir).unwrap();
        File::create(dir.join("keep.jpg")).unwrap();

        create_output_directory(&dir).unwrap();
        assert!(dir.join("keep.jpg").exists());
    }
}
