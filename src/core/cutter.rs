// LogCutter - core/cutter.rs
//
// Computes the [start, end) line range for a time window and persists the
// slice to the destination directory.
//
// Every outcome is per-file: a file with no matching lines or a failed write
// yields a Skipped/Failed outcome and never aborts the caller's batch.

use crate::core::locator::{self, SearchConfig};
use crate::core::model::{FileOutcome, RangeResult, SkipReason, TimeWindow};
use crate::core::timestamp::extract_line_timestamp;
use crate::util::error::CutError;
use std::path::{Path, PathBuf};

/// Cuts the lines of one file at a time to a shared window and destination.
#[derive(Debug, Clone)]
pub struct LineRangeCutter {
    window: TimeWindow,
    destination: PathBuf,
    search: SearchConfig,
}

impl LineRangeCutter {
    pub fn new(window: TimeWindow, destination: PathBuf, search: SearchConfig) -> Self {
        tracing::debug!(
            window = %window,
            destination = %destination.display(),
            crossover = search.crossover_threshold,
            "Cutter initialised"
        );
        Self {
            window,
            destination,
            search,
        }
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Compute the boundary indices for `lines`.
    ///
    /// `start` is the first line at or after `from`. If the search finds
    /// nothing but line 0 itself carries an instant later than `from`, the
    /// whole file qualifies and `start` is 0. This only applies when line 0 is
    /// timestamped; it is not generalised to the first timestamped line.
    ///
    /// `end` is the first line at or after `to`, or the line count when no
    /// line reaches `to` (the slice runs through end of file).
    pub fn compute_range<S: AsRef<[u8]>>(&self, lines: &[S]) -> RangeResult {
        let start = locator::locate(lines, self.window.from, &self.search, extract_line_timestamp)
            .or_else(|| {
                let first = lines.first().and_then(|l| extract_line_timestamp(l.as_ref()))?;
                (first > self.window.from).then(|| {
                    tracing::debug!("All log lines are after the from date; starting at line 0");
                    0
                })
            });

        let end = locator::locate(lines, self.window.to, &self.search, extract_line_timestamp)
            .unwrap_or(lines.len());

        RangeResult { start, end }
    }

    /// Cut `lines` (the raw contents of `path`, terminators included) and
    /// write the selected slice byte for byte to
    /// `destination/<file name of path>`.
    ///
    /// An existing destination file of that name is overwritten, so repeated
    /// runs with the same inputs produce identical bytes.
    pub fn cut<S: AsRef<[u8]>>(&self, path: &Path, lines: &[S]) -> FileOutcome {
        let range = self.compute_range(lines);
        tracing::debug!(
            file = %path.display(),
            start = ?range.start,
            end = range.end,
            lines = lines.len(),
            "Range computed"
        );

        let skip = |reason: SkipReason| {
            tracing::warn!(file = %path.display(), reason = %reason, "Skipping cut");
            FileOutcome::Skipped {
                source: path.to_path_buf(),
                reason,
            }
        };

        let Some(start) = range.start else {
            return skip(SkipReason::NoStartLine);
        };
        let end = range.end;
        if end < start {
            return skip(SkipReason::EndBeforeStart { start, end });
        }
        if end == start {
            return skip(SkipReason::EmptyRange { index: start });
        }

        match self.write_slice(path, &lines[start..end]) {
            Ok(destination) => {
                tracing::info!(
                    file = %path.display(),
                    destination = %destination.display(),
                    start,
                    end,
                    "Cut log saved"
                );
                FileOutcome::Written {
                    source: path.to_path_buf(),
                    destination,
                    start,
                    end,
                }
            }
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "Cut failed");
                FileOutcome::Failed {
                    source: path.to_path_buf(),
                    error: e.to_string(),
                }
            }
        }
    }

    fn write_slice<S: AsRef<[u8]>>(&self, path: &Path, slice: &[S]) -> Result<PathBuf, CutError> {
        let file_name = path.file_name().ok_or_else(|| CutError::NoFileName {
            path: path.to_path_buf(),
        })?;

        std::fs::create_dir_all(&self.destination).map_err(|source| {
            CutError::CreateDestination {
                path: self.destination.clone(),
                source,
            }
        })?;

        let len: usize = slice.iter().map(|l| l.as_ref().len()).sum();
        let mut content = Vec::with_capacity(len);
        for line in slice {
            content.extend_from_slice(line.as_ref());
        }

        let destination = self.destination.join(file_name);
        std::fs::write(&destination, content).map_err(|source| CutError::Write {
            path: destination.clone(),
            source,
        })?;
        Ok(destination)
    }
}
