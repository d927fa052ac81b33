// LogCutter - core/inventory.rs
//
// Remote inventory: turns the requested remote paths into the list of log
// files to fetch. Written against the `RemoteFs` trait so the listing policy
// is independent of the SSH transport.

use crate::core::model::{RemoteFileRef, RemoteSkip, RemoteStat};
use crate::util::error::RemoteError;
use std::path::{Path, PathBuf};

/// The remote-file-listing operations the inventory needs.
pub trait RemoteFs {
    /// Stat a remote path, following symlinks.
    fn stat(&mut self, path: &Path) -> Result<RemoteStat, RemoteError>;

    /// Full paths of the immediate children of a remote directory.
    fn read_dir(&mut self, path: &Path) -> Result<Vec<PathBuf>, RemoteError>;
}

/// Files selected for transfer, plus the requested paths that were skipped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RemoteInventory {
    pub files: Vec<RemoteFileRef>,
    pub skipped: Vec<RemoteSkip>,
}

impl RemoteInventory {
    /// Remote paths to hand to the bulk transfer.
    pub fn fetch_list(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// True when any requested path ends with a path separator. The policy then
/// applies to the whole batch: every entry is expanded as a directory.
pub fn forces_directory_expansion(requested: &[String]) -> bool {
    requested.iter().any(|p| p.ends_with('/'))
}

/// List the remote files to fetch for `requested`.
///
/// - Each path is stat-ed; a failed stat is logged and the path skipped.
/// - Directories (by stat, or every path when the batch forces directory
///   expansion) contribute their immediate children whose name ends with
///   `suffix` and whose own stat says regular file. Deeper levels are not
///   visited.
/// - Other paths are taken as-is.
///
/// Overlapping requests are not deduplicated.
pub fn list_remote_files<R: RemoteFs + ?Sized>(
    fs: &mut R,
    requested: &[String],
    suffix: &str,
) -> RemoteInventory {
    let force_dirs = forces_directory_expansion(requested);
    let mut inventory = RemoteInventory::default();

    tracing::debug!(
        requested = requested.len(),
        force_dirs,
        suffix,
        "Remote listing starting"
    );

    for raw in requested {
        let path = PathBuf::from(raw);
        let stat = match fs.stat(&path) {
            Ok(stat) => stat,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Remote stat failed; skipping");
                inventory.skipped.push(RemoteSkip {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };

        if stat.is_dir || force_dirs {
            expand_remote_dir(fs, &path, suffix, &mut inventory);
        } else {
            inventory.files.push(RemoteFileRef {
                path,
                is_directory: false,
            });
        }
    }

    tracing::info!(
        files = inventory.files.len(),
        skipped = inventory.skipped.len(),
        "Remote listing complete"
    );
    inventory
}

fn expand_remote_dir<R: RemoteFs + ?Sized>(
    fs: &mut R,
    dir: &Path,
    suffix: &str,
    inventory: &mut RemoteInventory,
) {
    let children = match fs.read_dir(dir) {
        Ok(children) => children,
        Err(e) => {
            tracing::error!(dir = %dir.display(), error = %e, "Remote directory listing failed");
            inventory.skipped.push(RemoteSkip {
                path: dir.to_path_buf(),
                error: e.to_string(),
            });
            return;
        }
    };

    for child in children {
        let matches_suffix = child
            .file_name()
            .is_some_and(|n| n.to_string_lossy().ends_with(suffix));
        if !matches_suffix {
            tracing::trace!(path = %child.display(), "Suffix does not match");
            continue;
        }
        match fs.stat(&child) {
            Ok(stat) if stat.is_file => inventory.files.push(RemoteFileRef {
                path: child,
                is_directory: false,
            }),
            Ok(_) => tracing::trace!(path = %child.display(), "Not a regular file"),
            Err(e) => {
                tracing::error!(
                    path = %child.display(),
                    error = %e,
                    "Remote stat failed; skipping"
                );
                inventory.skipped.push(RemoteSkip {
                    path: child,
                    error: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory remote filesystem used by unit tests.

    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Default)]
    pub struct FakeRemoteFs {
        /// Regular files and directories keyed by full path.
        pub entries: BTreeMap<PathBuf, bool>,
    }

    impl FakeRemoteFs {
        pub fn with_file(mut self, path: &str) -> Self {
            self.entries.insert(PathBuf::from(path), false);
            self
        }

        pub fn with_dir(mut self, path: &str) -> Self {
            self.entries.insert(PathBuf::from(path), true);
            self
        }
    }

    impl RemoteFs for FakeRemoteFs {
        fn stat(&mut self, path: &Path) -> Result<RemoteStat, RemoteError> {
            let key = PathBuf::from(path.to_string_lossy().trim_end_matches('/'));
            match self.entries.get(&key) {
                Some(&is_dir) => Ok(RemoteStat {
                    is_dir,
                    is_file: !is_dir,
                }),
                None => Err(RemoteError::NotFound {
                    path: path.to_path_buf(),
                }),
            }
        }

        fn read_dir(&mut self, path: &Path) -> Result<Vec<PathBuf>, RemoteError> {
            let dir = PathBuf::from(path.to_string_lossy().trim_end_matches('/'));
            match self.entries.get(&dir) {
                Some(true) => Ok(self
                    .entries
                    .keys()
                    .filter(|p| p.parent() == Some(dir.as_path()))
                    .cloned()
                    .collect()),
                Some(false) => Err(RemoteError::NotFound { path: dir }),
                None => Err(RemoteError::NotFound { path: dir }),
            }
        }
    }
}
