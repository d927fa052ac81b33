// LogCutter - app/local.rs
//
// Local run: expand the requested paths and cut each file in turn.

use crate::core::cutter::LineRangeCutter;
use crate::core::discovery::{self, DiscoveryConfig};
use crate::core::model::{FileOutcome, RunPhase, RunProgress, RunReport};
use crate::platform::fs::read_lines_preserving_terminators;
use crate::util::error::CutError;
use std::path::{Path, PathBuf};

/// Read `read_from` in full and cut it. The outcome names `report_as`, whose
/// base name also names the destination file.
pub fn cut_file(cutter: &LineRangeCutter, read_from: &Path, report_as: &Path) -> FileOutcome {
    match read_lines_preserving_terminators(read_from) {
        Ok(lines) => cutter.cut(report_as, &lines),
        Err(source) => {
            let err = CutError::Read {
                path: read_from.to_path_buf(),
                source,
            };
            tracing::error!(file = %read_from.display(), error = %err, "Cannot read log file");
            FileOutcome::Failed {
                source: report_as.to_path_buf(),
                error: err.to_string(),
            }
        }
    }
}

/// Cut every file reachable from `paths`. Missing paths are recorded and
/// skipped; processing is sequential in request order.
pub fn run_local(
    cutter: &LineRangeCutter,
    paths: &[PathBuf],
    discovery_config: &DiscoveryConfig,
    progress: &dyn Fn(RunProgress),
) -> RunReport {
    let mut report = RunReport::default();

    progress(RunProgress::PhaseChanged {
        phase: RunPhase::Listing,
    });
    let inventory = discovery::expand_local_paths(paths, discovery_config);
    for skipped in inventory.skipped {
        progress(RunProgress::FileProcessed {
            outcome: skipped.clone(),
        });
        report.files.push(skipped);
    }
    progress(RunProgress::FilesListed {
        count: inventory.files.len(),
    });

    progress(RunProgress::PhaseChanged {
        phase: RunPhase::Cutting,
    });
    for path in &inventory.files {
        let outcome = cut_file(cutter, path, path);
        progress(RunProgress::FileProcessed {
            outcome: outcome.clone(),
        });
        report.files.push(outcome);
    }

    progress(RunProgress::PhaseChanged {
        phase: RunPhase::Done,
    });
    tracing::info!(
        written = report.written(),
        skipped = report.skipped(),
        failed = report.failed(),
        "Local run complete"
    );
    report
}
