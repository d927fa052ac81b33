// LogCutter - tests/e2e_cut.rs
//
// End-to-end tests for the local cutting pipeline.
//
// These tests exercise the real filesystem, real walkdir expansion and real
// chrono timestamp parsing against on-disk fixtures. No mocks.

use logcutter::app::local::run_local;
use logcutter::app::request::{RunMode, RunParams};
use logcutter::core::cutter::LineRangeCutter;
use logcutter::core::discovery::DiscoveryConfig;
use logcutter::core::locator::SearchConfig;
use logcutter::core::model::{FileOutcome, RunReport, SkipReason, TimeWindow};
use logcutter::core::timestamp::parse_user_instant;
use logcutter::platform::fs::read_lines_preserving_terminators;
use logcutter::util::constants;
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn window(from: &str, to: &str) -> TimeWindow {
    TimeWindow::new(
        parse_user_instant(from).unwrap(),
        parse_user_instant(to).unwrap(),
    )
}

fn run(paths: &[PathBuf], dest: &Path, from: &str, to: &str) -> RunReport {
    let cutter = LineRangeCutter::new(
        window(from, to),
        dest.to_path_buf(),
        SearchConfig::default(),
    );
    run_local(&cutter, paths, &DiscoveryConfig::default(), &|_| {})
}

/// Expected output: the fixture's lines `start..end`, byte for byte.
fn fixture_slice(name: &str, start: usize, end: usize) -> Vec<u8> {
    read_lines_preserving_terminators(&fixture(name)).unwrap()[start..end].concat()
}

// =============================================================================
// Cutting E2E
// =============================================================================

/// Mixed layouts with a stack trace: the trace travels with its entry and
/// the `to` line itself is excluded.
#[test]
fn e2e_cuts_service_log_with_stack_trace() {
    let out = tempfile::tempdir().unwrap();
    let report = run(
        &[fixture("service.log")],
        out.path(),
        "2025-10-09 15:30:43",
        "2025-10-09 15:30:47",
    );

    assert_eq!(report.written(), 1, "{report:?}");
    let written = fs::read_to_string(out.path().join("service.log")).unwrap();
    assert_eq!(written.as_bytes(), fixture_slice("service.log", 3, 12));
    assert!(written.starts_with("2025-10-09 15:30:43 WARN"));
    assert!(written.contains("Caused by: java.net.SocketTimeoutException"));
    assert!(!written.contains("15:30:47"));
}

/// CRLF terminators survive the cut unchanged.
#[test]
fn e2e_cuts_slash_dated_crlf_log() {
    let out = tempfile::tempdir().unwrap();
    run(
        &[fixture("gateway.log")],
        out.path(),
        "2025-10-09 15:30:43",
        "2025-10-09 15:30:47",
    );
    let written = fs::read(out.path().join("gateway.log")).unwrap();
    assert_eq!(
        written,
        b"10/09/2025 15:30:44 request GET /health\r\n10/09/2025 15:30:46 request GET /orders\r\n"
    );
}

#[test]
fn e2e_cuts_month_name_log() {
    let out = tempfile::tempdir().unwrap();
    run(
        &[fixture("scheduler.log")],
        out.path(),
        "2025-10-09 15:20",
        "2025-10-09 15:50",
    );
    assert_eq!(
        fs::read(out.path().join("scheduler.log")).unwrap(),
        fixture_slice("scheduler.log", 1, 3)
    );
}

/// Running twice overwrites with identical bytes.
#[test]
fn e2e_cut_is_idempotent() {
    let out = tempfile::tempdir().unwrap();
    let paths = [fixture("service.log")];
    run(&paths, out.path(), "2025-10-09 15:30:41", "2025-10-09 15:30:45");
    let first = fs::read(out.path().join("service.log")).unwrap();
    run(&paths, out.path(), "2025-10-09 15:30:41", "2025-10-09 15:30:45");
    let second = fs::read(out.path().join("service.log")).unwrap();
    assert_eq!(first, second);
}

/// A stale file from an earlier, wider run is overwritten, not appended to.
#[test]
fn e2e_existing_destination_file_is_overwritten() {
    let out = tempfile::tempdir().unwrap();
    fs::write(out.path().join("gateway.log"), "stale content\n".repeat(50)).unwrap();
    run(
        &[fixture("gateway.log")],
        out.path(),
        "2025-10-09 15:30:40",
        "2025-10-09 15:30:42",
    );
    assert_eq!(
        fs::read(out.path().join("gateway.log")).unwrap(),
        fixture_slice("gateway.log", 0, 1)
    );
}

/// Window entirely after the last line: nothing is written.
#[test]
fn e2e_window_after_file_writes_nothing() {
    let out = tempfile::tempdir().unwrap();
    let report = run(
        &[fixture("service.log")],
        out.path(),
        "2025-10-09 16:00:00",
        "2025-10-09 17:00:00",
    );
    assert_eq!(report.written(), 0);
    assert!(matches!(
        &report.files[0],
        FileOutcome::Skipped {
            reason: SkipReason::NoStartLine,
            ..
        }
    ));
    assert!(!out.path().join("service.log").exists());
}

/// `to` beyond the last line: the slice runs through end of file.
#[test]
fn e2e_to_after_file_runs_to_end() {
    let out = tempfile::tempdir().unwrap();
    run(
        &[fixture("service.log")],
        out.path(),
        "2025-10-09 15:30:47",
        "2025-10-09 23:59:59",
    );
    assert_eq!(
        fs::read(out.path().join("service.log")).unwrap(),
        fixture_slice("service.log", 12, 15)
    );
}

/// Inverted window: no output and the input file is untouched.
#[test]
fn e2e_inverted_window_leaves_input_untouched() {
    let out = tempfile::tempdir().unwrap();
    let before = fs::read(fixture("service.log")).unwrap();
    let report = run(
        &[fixture("service.log")],
        out.path(),
        "2025-10-09 15:30:47",
        "2025-10-09 15:30:43",
    );
    assert!(matches!(
        &report.files[0],
        FileOutcome::Skipped {
            reason: SkipReason::EndBeforeStart { .. },
            ..
        }
    ));
    assert_eq!(fs::read(fixture("service.log")).unwrap(), before);
    assert!(!out.path().join("service.log").exists());
}

/// A directory expands to its files; a missing path is skipped and the rest
/// of the batch is still processed.
#[test]
fn e2e_directory_and_missing_path() {
    let out = tempfile::tempdir().unwrap();
    let report = run(
        &[PathBuf::from("/no/such/dir"), fixture("")],
        out.path(),
        "2025-10-09 15:30:43",
        "2025-10-09 15:30:47",
    );
    assert_eq!(report.written(), 2, "{report:?}");
    assert!(out.path().join("service.log").exists());
    assert!(out.path().join("gateway.log").exists());
    // scheduler.log has minute precision only: 15:30 < from, 15:45 >= to.
    assert!(report.files.iter().any(|f| matches!(
        f,
        FileOutcome::Skipped {
            reason: SkipReason::EmptyRange { .. },
            ..
        }
    )));
    assert!(report.files.iter().any(|f| matches!(
        f,
        FileOutcome::Skipped {
            reason: SkipReason::PathNotFound,
            ..
        }
    )));
}

/// Front-end parameters through validation to a local run mode.
#[test]
fn e2e_run_params_validate_to_local_mode() {
    let out = tempfile::tempdir().unwrap();
    let request = RunParams {
        from: Some("2025-10-09T15:30:43Z".to_string()),
        to: Some("Oct 9, 2025 3:31 PM".to_string()),
        destination: Some(out.path().to_path_buf()),
        paths: vec![fixture("service.log").to_string_lossy().into_owned()],
        crossover_threshold: constants::DEFAULT_CROSSOVER_THRESHOLD,
        ..RunParams::default()
    }
    .validate(parse_user_instant("2025-10-10").unwrap())
    .unwrap();

    let RunMode::Local { paths, discovery } = request.mode else {
        panic!("expected local mode");
    };
    let cutter = LineRangeCutter::new(request.window, request.destination, request.search);
    let report = run_local(&cutter, &paths, &discovery, &|_| {});
    assert_eq!(report.written(), 1);
    assert_eq!(
        fs::read(out.path().join("service.log")).unwrap(),
        fixture_slice("service.log", 3, 15)
    );
}
