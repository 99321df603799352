//! Feature file discovery

use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

/// Extension of Gherkin feature files
const FEATURE_EXTENSION: &str = "feature";

/// Directories to skip
const SKIP_DIRS: &[&str] = &["target", "node_modules", ".git"];

/// Check if a path matches any of the exclude patterns
fn matches_exclude(path: &Path, exclude_patterns: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    exclude_patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
    })
}

/// Check if path contains any skip directories
fn in_skip_dir(path: &Path) -> bool {
    path.components().any(|component| {
        matches!(component, std::path::Component::Normal(name)
            if SKIP_DIRS.iter().any(|skip| name.to_string_lossy() == *skip))
    })
}

fn is_feature_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(FEATURE_EXTENSION))
}

/// Find all feature files in the given paths.
///
/// Explicit file arguments are taken as-is when they carry the `.feature`
/// extension; directories are walked recursively. The result is sorted and
/// deduplicated so scenario order is stable between runs.
#[must_use]
pub fn find_feature_files(paths: &[PathBuf], exclude: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let exclude_patterns: Vec<Pattern> = exclude
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pat) => Some(pat),
            Err(e) => {
                tracing::warn!(pattern = %p, error = %e, "ignoring invalid exclude pattern");
                None
            }
        })
        .collect();

    for path in paths {
        if path.is_file() {
            if is_feature_file(path) && !matches_exclude(path, &exclude_patterns) {
                files.push(path.clone());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(Result::ok)
            {
                let file_path = entry.path();
                let relative = file_path.strip_prefix(path).unwrap_or(file_path);

                if in_skip_dir(relative) || !file_path.is_file() || !is_feature_file(file_path) {
                    continue;
                }

                if matches_exclude(file_path, &exclude_patterns) {
                    tracing::debug!(path = %file_path.display(), "excluding feature file");
                    continue;
                }

                files.push(file_path.to_path_buf());
            }
        } else {
            tracing::warn!(path = %path.display(), "path does not exist, skipping");
        }
    }

    files.sort();
    files.dedup();
    files
}
