//! Input file discovery

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use tidyform_core::rules::{SUPPORTED_EXTENSIONS, is_ignored_file, is_supported_file};

/// Resolve a command-line target to the files it names, sorted by path
///
/// A file target is taken as is, provided it has a supported suffix. A
/// directory target yields its supported, non-ignored files, descending into
/// non-hidden subdirectories when `recursive` is set.
pub fn collect(target: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(target)
        .with_context(|| format!("Failed to access {}", target.display()))?;

    if !metadata.is_dir() {
        if !is_supported_file(&file_name(target)) {
            bail!(
                "Only {} files can be formatted: {}",
                SUPPORTED_EXTENSIONS.join(", "),
                target.display()
            );
        }
        return Ok(vec![target.to_path_buf()]);
    }

    let mut files = Vec::new();
    collect_dir(target, recursive, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_dir(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read directory {}", dir.display()))?;
        let path = entry.path();
        let name = file_name(&path);

        if path.is_dir() {
            if recursive && !name.starts_with('.') {
                collect_dir(&path, recursive, files)?;
            }
        } else if is_supported_file(&name) && !is_ignored_file(&name) {
            files.push(path);
        } else {
            log::debug!("skipping {}", path.display());
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
