/// Path filters applied while listing the scan directory.
///
/// These are free functions rather than a trait; discovery composes them through
/// [`should_include_file`].
use glob::Pattern;
use std::path::Path;

/// Checks if a file should be included in the scan based on its extension
pub fn has_valid_extension(path: &Path, extensions: &Option<Vec<String>>) -> bool {
    match extensions {
        None => true,
        Some(exts) => path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext_str| exts.iter().any(|e| e.eq_ignore_ascii_case(ext_str))),
    }
}

/// Checks if a file should be ignored based on ignore patterns
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();
    let normalized_path = path_str.replace('\\', "/");

    ignore_patterns.iter().any(|pattern| {
        Pattern::new(pattern)
            .map(|p| p.matches(&normalized_path))
            .unwrap_or(false)
    })
}

/// Checks if a file is likely to be binary
pub fn is_likely_binary(path: &Path) -> bool {
    const BINARY_EXTENSIONS: &[&str] = &[
        "exe", "dll", "so", "dylib", "bin", "obj", "o", "class", "jar", "png", "jpg", "jpeg",
        "gif", "bmp", "ico", "pdf", "zip", "tar", "gz", "7z", "rar",
    ];

    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext_str| {
            BINARY_EXTENSIONS
                .iter()
                .any(|&bin_ext| bin_ext.eq_ignore_ascii_case(ext_str))
        })
}

/// Determines if a file should be scanned
pub fn should_include_file(
    path: &Path,
    extensions: &Option<Vec<String>>,
    ignore_patterns: &[String],
) -> bool {
    !is_likely_binary(path)
        && has_valid_extension(path, extensions)
        && !should_ignore(path, ignore_patterns)
}
