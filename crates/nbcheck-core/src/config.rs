//! Run configuration.
//!
//! Built by the CLI from its flags and consumed by the dispatcher.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// What to do with each document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Execute cells, capture fresh outputs and save them.
    #[default]
    Execute,
    /// Inspect saved outputs only; never execute or write.
    Check,
}

/// Which documents to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every notebook found under `root`.
    All { root: PathBuf },
    /// Exactly the named documents, in the order given.
    Targets(Vec<PathBuf>),
}

/// Configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: RunMode,
    pub scope: Scope,
    /// Execute without saving results.
    pub dry_run: bool,
}

impl RunConfig {
    /// Process every notebook under `root`.
    pub fn all(root: impl AsRef<Path>) -> Self {
        Self {
            mode: RunMode::Execute,
            scope: Scope::All {
                root: root.as_ref().to_path_buf(),
            },
            dry_run: false,
        }
    }

    /// Process the given documents only.
    pub fn targets(targets: Vec<PathBuf>) -> Self {
        Self {
            mode: RunMode::Execute,
            scope: Scope::Targets(targets),
            dry_run: false,
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether document files may be written.
    pub fn writes_documents(&self) -> bool {
        self.mode == RunMode::Execute && !self.dry_run
    }

    /// Reject configurations that cannot be run.
    pub fn validate(&self) -> Result<()> {
        match &self.scope {
            Scope::All { root } if !root.is_dir() => Err(Error::Config(format!(
                "{} is not a directory",
                root.display()
            ))),
            Scope::Targets(targets) if targets.is_empty() => {
                Err(Error::Config("no documents named".to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_mode_never_writes() {
        let config = RunConfig::all(".").with_mode(RunMode::Check);
        assert!(!config.writes_documents());
        assert!(RunConfig::all(".").writes_documents());
        assert!(!RunConfig::all(".").with_dry_run(true).writes_documents());
    }

    #[test]
    fn test_validate_root() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        assert!(RunConfig::all(temp.path()).validate().is_ok());

        let missing = temp.path().join("missing");
        let err = RunConfig::all(&missing).validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_targets() {
        assert!(RunConfig::targets(vec![]).validate().is_err());
        assert!(RunConfig::targets(vec![PathBuf::from("a.ipynb")]).validate().is_ok());
    }
}
