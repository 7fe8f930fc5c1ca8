//! Input path resolution with a data-directory fallback.

use bounds_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve `path` as given, then under `data_dir`.
pub fn resolve_with_fallback(path: &Path, data_dir: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    let fallback = data_dir.join(path);
    if fallback.is_file() {
        debug!(path = %fallback.display(), "Resolved under data directory");
        Some(fallback)
    } else {
        None
    }
}

/// Resolve the tick table path.
pub fn resolve_input(path: &Path, data_dir: &Path) -> Result<PathBuf> {
    resolve_with_fallback(path, data_dir).ok_or_else(|| Error::InputFileNotFound(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ticks.csv");
        std::fs::write(&file, "x").unwrap();

        let resolved = resolve_input(&file, Path::new("does-not-exist")).unwrap();
        assert_eq!(resolved, file);
    }

    #[test]
    fn test_data_dir_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("000001.csv"), "x").unwrap();

        let resolved = resolve_input(Path::new("000001.csv"), dir.path()).unwrap();
        assert_eq!(resolved, dir.path().join("000001.csv"));
    }

    #[test]
    fn test_missing_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(Path::new("missing.csv"), dir.path()).unwrap_err();
        assert!(matches!(err, Error::InputFileNotFound(p) if p == Path::new("missing.csv")));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_with_fallback(dir.path(), dir.path()).is_none());
    }
}
