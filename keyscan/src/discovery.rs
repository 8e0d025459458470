use ignore::WalkBuilder;
use std::path::PathBuf;
use tracing::debug;

use crate::config::ScanConfig;
use crate::errors::{ScanError, ScanResult};
use crate::filters::should_include_file;

/// Lists the files under `config.root_path` that are eligible for scanning.
///
/// Only regular files passing the extension, ignore and binary filters are kept. Unless
/// `recursive` is set, only direct children of the root are considered. The list is
/// sorted so chunk assignment is reproducible between runs.
pub fn collect_files(config: &ScanConfig) -> ScanResult<Vec<PathBuf>> {
    let root = &config.root_path;
    if !root.exists() {
        return Err(ScanError::directory_not_found(root));
    }
    if !root.is_dir() {
        return Err(ScanError::not_a_directory(root));
    }

    let mut walker = WalkBuilder::new(root);
    walker
        .hidden(true)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .max_depth(if config.recursive { None } else { Some(1) });

    let mut files: Vec<PathBuf> = walker
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| {
            should_include_file(
                entry.path(),
                &config.file_extensions,
                &config.ignore_patterns,
            )
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    debug!("Found {} files to scan in {}", files.len(), root.display());
    Ok(files)
}
