//! File filtering: extension allow-lists, glob ignore patterns, and a
//! cheap binary-file heuristic.
//!
//! These are free functions on purpose. The engine calls
//! [`should_include_file`] once per walked path, before any I/O happens,
//! so everything here works on the path alone.

use glob::Pattern;
use std::path::Path;

/// Checks if a file passes the extension allow-list. An empty list (`None`)
/// admits every extension.
pub fn has_valid_extension(path: &Path, extensions: &Option<Vec<String>>) -> bool {
    let Some(exts) = extensions else {
        return true;
    };
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            exts.iter().any(|e| e.eq_ignore_ascii_case(ext))
        })
}

/// Checks if a file should be skipped based on ignore patterns.
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    // Build artifacts and VCS internals are never worth searching.
    if path_str.contains("/target/") || path_str.contains("/.git/") {
        return true;
    }

    ignore_patterns.iter().any(|pattern| {
        if let Ok(p) = Pattern::new(pattern) {
            // Normalize separators so one pattern style works everywhere.
            let normalized_path = path_str.replace('\\', "/");
            p.matches(&normalized_path)
        } else {
            false
        }
    })
}

/// Checks if a file is likely to be binary, judged by extension alone.
pub fn is_likely_binary(path: &Path) -> bool {
    const BINARY_EXTENSIONS: &[&str] = &[
        "exe", "dll", "so", "dylib", "bin", "obj", "o", "class", "jar", "war", "ear", "png", "jpg",
        "jpeg", "gif", "bmp", "ico", "pdf", "doc", "docx", "xls", "xlsx", "zip", "tar", "gz", "7z",
        "rar",
    ];

    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            BINARY_EXTENSIONS
                .iter()
                .any(|&bin_ext| bin_ext.eq_ignore_ascii_case(ext))
        })
}

/// Determines if a file should be included in the search.
pub fn should_include_file(
    path: &Path,
    extensions: &Option<Vec<String>>,
    ignore_patterns: &[String],
) -> bool {
    !is_likely_binary(path)
        && has_valid_extension(path, extensions)
        && !should_ignore(path, ignore_patterns)
}
