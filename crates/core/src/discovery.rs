//! Discovery of candidate files for batch conversion.
//!
//! Matches glob patterns against file names under a root directory, either
//! directly within it or at any depth. The result is deduplicated and sorted
//! so repeated runs over an unchanged directory yield the same task order.

use crate::error::{ConvertError, Result};
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Patterns used when the caller supplies none.
pub const DEFAULT_PATTERNS: &[&str] = &["*.pdf", "*.docx", "*.pptx", "*.txt", "*.html"];

/// Find files under `root` whose names match any of `patterns`.
///
/// With `recursive` set, patterns match at any depth; otherwise only entries
/// directly within `root` are considered. A file matching several patterns
/// appears once. Fails with [`ConvertError::DirectoryNotFound`] when `root`
/// is not a directory; zero matches is not an error.
pub fn discover(root: &Path, patterns: Option<&[String]>, recursive: bool) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(ConvertError::DirectoryNotFound(root.to_path_buf()));
    }

    let compiled = compile_patterns(patterns)?;
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut matched: BTreeSet<PathBuf> = BTreeSet::new();
    for entry in WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let name = match entry.file_name().to_str() {
            Some(name) => name,
            None => continue,
        };
        if compiled.iter().any(|p| p.matches(name)) {
            matched.insert(entry.into_path());
        }
    }

    debug!("Discovered {} files under {:?}", matched.len(), root);
    Ok(matched.into_iter().collect())
}

fn compile_patterns(patterns: Option<&[String]>) -> Result<Vec<Pattern>> {
    let defaults: Vec<String>;
    let patterns: &[String] = match patterns {
        Some(p) if !p.is_empty() => p,
        _ => {
            defaults = DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect();
            info!("No patterns given, using defaults: {:?}", DEFAULT_PATTERNS);
            defaults.as_slice()
        }
    };

    patterns
        .iter()
        .map(|p| {
            Pattern::new(p)
                .map_err(|e| ConvertError::InvalidConfig(format!("invalid pattern '{p}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    fn setup_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.docx");
        touch(dir.path(), "b.txt");
        touch(dir.path(), "c.html");
        touch(dir.path(), "notes.md");
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&sub, "d.pdf");
        touch(&sub, "e.docx");
        dir
    }

    #[test]
    fn test_discover_default_patterns_non_recursive() {
        let dir = setup_tree();
        let files = discover(dir.path(), None, false).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.docx", "b.txt", "c.html"]);
    }

    #[test]
    fn test_discover_default_patterns_recursive() {
        let dir = setup_tree();
        let files = discover(dir.path(), None, true).unwrap();
        assert_eq!(files.len(), 5);
        assert!(files.iter().any(|p| p.ends_with("sub/d.pdf")));
    }

    #[test]
    fn test_discover_custom_patterns() {
        let dir = setup_tree();
        let patterns = vec!["*.md".to_string()];
        let files = discover(dir.path(), Some(&patterns), false).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("notes.md"));
    }

    #[test]
    fn test_discover_deduplicates_overlapping_patterns() {
        let dir = setup_tree();
        let patterns = vec!["*.docx".to_string(), "a.*".to_string()];
        let files = discover(dir.path(), Some(&patterns), false).unwrap();
        // a.docx matches both patterns but appears once
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.docx"));
    }

    #[test]
    fn test_discover_is_deterministic() {
        let dir = setup_tree();
        let first = discover(dir.path(), None, true).unwrap();
        for _ in 0..5 {
            let again = discover(dir.path(), None, true).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_discover_sorted_by_path() {
        let dir = setup_tree();
        let files = discover(dir.path(), None, true).unwrap();
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn test_discover_missing_root() {
        let result = discover(Path::new("/definitely/not/a/dir"), None, true);
        assert!(matches!(result, Err(ConvertError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_discover_zero_matches_is_ok() {
        let dir = TempDir::new().unwrap();
        let files = discover(dir.path(), None, true).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let patterns = vec!["[".to_string()];
        let result = discover(dir.path(), Some(&patterns), false);
        assert!(matches!(result, Err(ConvertError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_pattern_list_falls_back_to_defaults() {
        let dir = setup_tree();
        let patterns: Vec<String> = vec![];
        let files = discover(dir.path(), Some(&patterns), false).unwrap();
        assert_eq!(files.len(), 3);
    }
}
