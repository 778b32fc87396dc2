//! Finding notebooks under a directory.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::FormatResult;

/// Directory Jupyter uses for autosave copies.
pub const CHECKPOINT_DIR: &str = ".ipynb_checkpoints";

/// Notebook file extension.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

fn is_checkpoint_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == CHECKPOINT_DIR
}

/// Whether `path` names a notebook file.
pub fn is_notebook(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == NOTEBOOK_EXTENSION)
}

/// Every notebook under `root`, recursively, sorted by path.
///
/// Checkpoint directories are not descended into.
pub fn discover(root: impl AsRef<Path>) -> FormatResult<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut notebooks = Vec::new();

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_checkpoint_dir(e))
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && is_notebook(entry.path()) {
            notebooks.push(entry.into_path());
        }
    }

    notebooks.sort();
    tracing::debug!("Found {} notebook(s) under {}", notebooks.len(), root.display());
    Ok(notebooks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/nested")).unwrap();
        fs::write(dir.path().join("z.ipynb"), "{}").unwrap();
        fs::write(dir.path().join("a.ipynb"), "{}").unwrap();
        fs::write(dir.path().join("b/nested/m.ipynb"), "{}").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();

        let found = discover(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.ipynb"),
                PathBuf::from("b/nested/m.ipynb"),
                PathBuf::from("z.ipynb"),
            ]
        );
    }

    #[test]
    fn test_discover_skips_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".ipynb_checkpoints")).unwrap();
        fs::write(dir.path().join(".ipynb_checkpoints/a-checkpoint.ipynb"), "{}").unwrap();
        fs::write(dir.path().join("a.ipynb"), "{}").unwrap();

        let found = discover(dir.path()).unwrap();
        assert_eq!(found, vec![dir.path().join("a.ipynb")]);
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_discover_missing_root_is_error() {
        assert!(discover("/no/such/root").unwrap_err().is_io());
    }
}
