// LogCutter - app/staging.rs
//
// Run-scoped local staging directory for files fetched from a remote host.
// Exclusively owned by one run. Cleanup is explicit and best-effort: every
// entry is attempted and each failure is reported individually.

use crate::util::constants;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    cleaned: bool,
}

impl StagingArea {
    /// Create a fresh, uniquely named `<parent>/logcutter-staging-*`
    /// directory (mode 0700 on Unix).
    ///
    /// The directory is detached from `tempfile`'s drop guard: removal goes
    /// through [`StagingArea::cleanup`] so every failed deletion is reported.
    pub fn create(parent: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(parent)?;
        let root = tempfile::Builder::new()
            .prefix(&format!("{}-", constants::STAGING_DIR_PREFIX))
            .tempdir_in(parent)?
            .keep();
        tracing::debug!(staging = %root.display(), "Staging area created");
        Ok(Self {
            root,
            cleaned: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Where a fetched file with this base name lands.
    pub fn staged_path(&self, file_name: &std::ffi::OsStr) -> PathBuf {
        self.root.join(file_name)
    }

    /// Delete everything below the staging root (files before their
    /// directories), then the root itself. Returns one message per failed
    /// deletion; never stops early. A second call is a no-op.
    pub fn cleanup(&mut self) -> Vec<String> {
        if self.cleaned {
            return Vec::new();
        }
        self.cleaned = true;

        let mut errors = Vec::new();
        let mut record = |path: &Path, e: &dyn std::fmt::Display| {
            tracing::error!(path = %path.display(), error = %e, "Staging cleanup failed");
            errors.push(format!("{}: {e}", path.display()));
        };

        let walker = walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .contents_first(true);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(&self.root).to_path_buf();
                    record(&path, &e);
                    continue;
                }
            };
            let result = if entry.file_type().is_dir() {
                std::fs::remove_dir(entry.path())
            } else {
                std::fs::remove_file(entry.path())
            };
            match result {
                Ok(()) => tracing::trace!(path = %entry.path().display(), "Removed staged entry"),
                Err(e) => record(entry.path(), &e),
            }
        }

        if let Err(e) = std::fs::remove_dir(&self.root) {
            record(&self.root, &e);
        }

        if errors.is_empty() {
            tracing::debug!(staging = %self.root.display(), "Staging area removed");
        }
        errors
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if !self.cleaned {
            tracing::warn!(staging = %self.root.display(), "Staging area dropped without cleanup");
            self.cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_cleanup_nested_contents() {
        let parent = tempfile::tempdir().unwrap();
        let mut staging = StagingArea::create(parent.path()).unwrap();
        let root = staging.path().to_path_buf();
        assert!(root.is_dir(), "staging directory must persist until cleanup");
        assert!(root.starts_with(parent.path()));
        assert!(root
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(constants::STAGING_DIR_PREFIX));

        std::fs::write(root.join("a.log"), "a").unwrap();
        std::fs::create_dir(root.join("nested")).unwrap();
        std::fs::write(root.join("nested").join("b.log"), "b").unwrap();

        assert!(staging.cleanup().is_empty());
        assert!(!root.exists());
        assert!(staging.cleanup().is_empty(), "second cleanup is a no-op");
    }

    #[test]
    fn test_missing_root_is_reported_not_fatal() {
        let parent = tempfile::tempdir().unwrap();
        let mut staging = StagingArea::create(parent.path()).unwrap();
        std::fs::remove_dir(staging.path()).unwrap();
        let errors = staging.cleanup();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_missing_parent_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("var").join("staging");
        let mut staging = StagingArea::create(&parent).unwrap();
        assert!(staging.path().starts_with(&parent));
        assert!(staging.cleanup().is_empty());
        assert!(parent.is_dir(), "only the run directory is removed");
    }

    #[test]
    fn test_two_areas_do_not_collide() {
        let parent = tempfile::tempdir().unwrap();
        let mut a = StagingArea::create(parent.path()).unwrap();
        let mut b = StagingArea::create(parent.path()).unwrap();
        assert_ne!(a.path(), b.path());
        a.cleanup();
        b.cleanup();
    }
}
