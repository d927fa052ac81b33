// LogCutter - core/discovery.rs
//
// Expansion of user-requested local paths into the list of files to cut.
//
// A regular file is taken as-is. A directory contributes its immediate
// regular-file children (no recursion), optionally filtered by include
// globs. Missing or unreadable paths are non-fatal: they become per-path
// outcomes and the rest of the batch is still expanded.

use crate::core::model::{FileOutcome, SkipReason};
use std::io;
use std::path::{Path, PathBuf};

/// Configuration for local path expansion.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Glob patterns (filename-only) a directory child MUST match to be
    /// included. An empty list includes every regular file. Explicitly named
    /// files are never filtered.
    pub include_patterns: Vec<String>,
}

/// Files selected for cutting, plus the requested paths that were skipped.
#[derive(Debug, Default)]
pub struct LocalInventory {
    pub files: Vec<PathBuf>,
    pub skipped: Vec<FileOutcome>,
}

/// Expand `paths` into regular files, in request order. Children of one
/// directory are ordered by file name.
pub fn expand_local_paths(paths: &[PathBuf], config: &DiscoveryConfig) -> LocalInventory {
    let include_pats = compile_patterns(&config.include_patterns);
    let mut inventory = LocalInventory::default();

    for path in paths {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(dir = %path.display(), "Processing log directory");
                expand_directory(path, &include_pats, &mut inventory);
            }
            Ok(meta) if meta.is_file() => {
                tracing::debug!(file = %path.display(), "Processing a single log file");
                inventory.files.push(path.clone());
            }
            Ok(_) => {
                tracing::warn!(path = %path.display(), "Not a regular file or directory; skipping");
                inventory.skipped.push(FileOutcome::Failed {
                    source: path.clone(),
                    error: "not a regular file or directory".to_string(),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::error!(path = %path.display(), "Log file or directory does not exist");
                inventory.skipped.push(FileOutcome::Skipped {
                    source: path.clone(),
                    reason: SkipReason::PathNotFound,
                });
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Cannot access path");
                inventory.skipped.push(FileOutcome::Failed {
                    source: path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        requested = paths.len(),
        files = inventory.files.len(),
        skipped = inventory.skipped.len(),
        "Local discovery complete"
    );
    inventory
}

fn expand_directory(dir: &Path, include_pats: &[glob::Pattern], inventory: &mut LocalInventory) {
    let walker = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().unwrap_or(dir).to_path_buf();
                tracing::error!(path = %path.display(), error = %e, "Cannot read directory entry");
                inventory.skipped.push(FileOutcome::Failed {
                    source: path,
                    error: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if !is_included(&file_name, include_pats) {
            tracing::trace!(file = %file_name, "Not matched by include patterns");
            continue;
        }

        tracing::debug!(file = %entry.path().display(), "Processing log file");
        inventory.files.push(entry.into_path());
    }
}

// =============================================================================
// Glob helpers
// =============================================================================

/// Compile glob pattern strings; invalid patterns are logged and skipped.
fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = p, error = %e, "Invalid glob pattern, skipping");
                None
            }
        })
        .collect()
}

/// Returns true if `file_name` matches at least one include pattern.
/// An empty include list means "include all".
fn is_included(file_name: &str, include_pats: &[glob::Pattern]) -> bool {
    include_pats.is_empty() || include_pats.iter().any(|p| p.matches(file_name))
}
