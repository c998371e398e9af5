//! Input discovery: every file under a folder, filtered by name.

use crate::common::constants::{FILE_FILTER_SUFFIX, FILE_FILTER_TOKENS};
use crate::domain::{PipelineResult, SpaceError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn path_exists(folder: impl AsRef<Path>) -> bool {
    folder.as_ref().exists()
}

/// Every regular file below `folder`, recursively, sorted by path.
pub fn collect_all_filenames(folder: impl AsRef<Path>) -> PipelineResult<Vec<PathBuf>> {
    let folder = folder.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(|source| {
            let location = source
                .path()
                .unwrap_or(folder)
                .display()
                .to_string();
            SpaceError::io_system(
                "IO.INPUT_DIRECTORY",
                format!("failed to read input directory '{}': {}", location, source),
            )
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Whether the full path carries every filter token and the text suffix.
///
/// Case-sensitive literal matching, directories included in the tested string.
pub fn is_candidate_file(path: &Path) -> bool {
    let text = path.to_string_lossy();
    FILE_FILTER_TOKENS.iter().all(|token| text.contains(token))
        && text.ends_with(FILE_FILTER_SUFFIX)
}

pub fn filter_filenames(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|path| is_candidate_file(path))
        .cloned()
        .collect()
}

/// Filtered input files below `folder`.
pub fn discover_input_files(folder: impl AsRef<Path>) -> PipelineResult<Vec<PathBuf>> {
    let folder = folder.as_ref();
    if !path_exists(folder) {
        return Err(SpaceError::invalid_input(
            "INPUT.PATH_NOT_FOUND",
            format!("input folder '{}' does not exist", folder.display()),
        ));
    }

    let all = collect_all_filenames(folder)?;
    let accepted = filter_filenames(&all);
    tracing::info!(
        folder = %folder.display(),
        scanned = all.len(),
        "found {} files",
        accepted.len()
    );

    if accepted.is_empty() {
        return Err(SpaceError::empty_input(
            "INPUT.NO_MATCHING_FILES",
            format!(
                "no file under '{}' has a path containing {} and ending in '{}'",
                folder.display(),
                FILE_FILTER_TOKENS.join(", "),
                FILE_FILTER_SUFFIX
            ),
        ));
    }

    Ok(accepted)
}
