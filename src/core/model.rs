// LogCutter - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
// These types are the shared vocabulary across all layers.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Time window
// =============================================================================

/// The `[from, to]` bounds requested for extraction.
///
/// Both bounds are timezone-naive. `from` may be after `to`; that case is not
/// rejected here and simply yields no output for every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self { from, to }
    }

    /// True when `from` is after `to`.
    pub fn is_inverted(&self) -> bool {
        self.from > self.to
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.from.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.to.format("%Y-%m-%d %H:%M:%S%.3f")
        )
    }
}

// =============================================================================
// Line range
// =============================================================================

/// Boundary indices computed for one file.
///
/// `start` is `None` when no line at or after `from` was found. `end` is the
/// exclusive upper bound; it equals the line count when no line reaches `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeResult {
    pub start: Option<usize>,
    pub end: usize,
}

// =============================================================================
// Remote inventory
// =============================================================================

/// Result of stat-ing one remote path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFileRef {
    pub path: PathBuf,
    pub is_directory: bool,
}

/// Minimal stat information the inventory needs from a remote filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStat {
    pub is_dir: bool,
    pub is_file: bool,
}

// =============================================================================
// Run outcomes
// =============================================================================

/// Why a file was skipped without producing output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The requested local path does not exist.
    PathNotFound,
    /// No line at or after `from` was found.
    NoStartLine,
    /// The `to` boundary precedes the `from` boundary.
    EndBeforeStart { start: usize, end: usize },
    /// The range is empty: no lines fall inside the window.
    EmptyRange { index: usize },
    /// The remote file was listed but never landed in the staging area.
    NotStaged,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathNotFound => write!(f, "file or directory does not exist"),
            Self::NoStartLine => write!(f, "no start line found"),
            Self::EndBeforeStart { start, end } => {
                write!(f, "end line {end} is before start line {start}")
            }
            Self::EmptyRange { index } => write!(
                f,
                "start and end lines are the same ({index}); no logs in the window"
            ),
            Self::NotStaged => write!(f, "file was not transferred to the staging area"),
        }
    }
}

/// Per-file result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// A slice was written to `destination`.
    Written {
        source: PathBuf,
        destination: PathBuf,
        start: usize,
        end: usize,
    },
    /// Nothing was written; the run continued.
    Skipped { source: PathBuf, reason: SkipReason },
    /// An I/O error prevented processing this file; the run continued.
    Failed { source: PathBuf, error: String },
}

impl FileOutcome {
    pub fn source(&self) -> &PathBuf {
        match self {
            Self::Written { source, .. }
            | Self::Skipped { source, .. }
            | Self::Failed { source, .. } => source,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// A remote path that could not be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteSkip {
    pub path: PathBuf,
    pub error: String,
}

/// Phases of a remote run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Listing,
    Transferring,
    Cutting,
    Cleanup,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Listing => "listing",
            Self::Transferring => "transferring",
            Self::Cutting => "cutting",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}

/// Everything that happened during one run.
///
/// Logging mirrors these records, but the report is the authoritative,
/// machine-checkable account of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// One entry per input file, in processing order.
    pub files: Vec<FileOutcome>,
    /// Remote paths skipped during listing.
    pub remote_skips: Vec<RemoteSkip>,
    /// Transfer failure diagnostic, if the bulk copy failed.
    pub transfer_error: Option<String>,
    /// Staging entries that could not be deleted.
    pub cleanup_errors: Vec<String>,
    /// Set when the run was aborted before cutting (e.g. session open failed).
    pub run_error: Option<String>,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.files.iter().filter(|f| f.is_written()).count()
    }

    pub fn skipped(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f, FileOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f, FileOutcome::Failed { .. }))
            .count()
    }
}

// =============================================================================
// Progress messages
// =============================================================================

/// Messages sent from the background run to the front end.
#[derive(Debug, Clone)]
pub enum RunProgress {
    /// The run entered a new phase.
    PhaseChanged { phase: RunPhase },
    /// Input expansion finished; `count` files will be cut.
    FilesListed { count: usize },
    /// One file finished (written, skipped or failed).
    FileProcessed { outcome: FileOutcome },
    /// A non-fatal problem outside any single file.
    Warning { message: String },
    /// The run finished; the report is final.
    Completed { report: RunReport },
    /// The run could not start.
    Failed { error: String },
}
