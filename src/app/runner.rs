// LogCutter - app/runner.rs
//
// Remote run orchestration:
//
//   Idle -> Listing -> Transferring -> Cutting -> Cleanup -> Done
//
// Any failure jumps straight to Cleanup, which runs exactly once on every
// path: the staging area is deleted and the SSH session is closed. Only a
// failure to open the session (or to create the staging area) aborts the
// run; per-path and transfer failures are recorded and the run continues.

use crate::app::local::cut_file;
use crate::app::staging::StagingArea;
use crate::core::cutter::LineRangeCutter;
use crate::core::inventory::{self, RemoteFs, RemoteInventory};
use crate::core::model::{FileOutcome, RunPhase, RunProgress, RunReport, SkipReason};
use crate::platform::rsync::BulkCopier;
use crate::platform::ssh::SshSession;
use crate::util::error::RemoteError;
use std::path::PathBuf;

/// A remote listing channel the runner owns for the duration of a run.
pub trait RemoteSession: RemoteFs {
    fn close(&mut self) -> Result<(), RemoteError>;
}

impl RemoteSession for SshSession {
    fn close(&mut self) -> Result<(), RemoteError> {
        SshSession::close(self)
    }
}

/// Drives one remote run. Not reusable: a failed run is re-invoked in full
/// with a new runner.
#[derive(Debug)]
pub struct RemoteRunner {
    cutter: LineRangeCutter,
    requested: Vec<String>,
    log_suffix: String,
    staging_parent: PathBuf,
    phase: RunPhase,
}

impl RemoteRunner {
    pub fn new(
        cutter: LineRangeCutter,
        requested: Vec<String>,
        log_suffix: String,
        staging_parent: PathBuf,
    ) -> Self {
        Self {
            cutter,
            requested,
            log_suffix,
            staging_parent,
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Run the whole pipeline. `open_session` is called once, at the start
    /// of Listing.
    pub fn run<S, F, B>(
        &mut self,
        open_session: F,
        copier: &B,
        progress: &dyn Fn(RunProgress),
    ) -> RunReport
    where
        S: RemoteSession,
        F: FnOnce() -> Result<S, RemoteError>,
        B: BulkCopier + ?Sized,
    {
        let mut report = RunReport::default();
        let mut session: Option<S> = None;
        let mut staging: Option<StagingArea> = None;

        self.execute(
            open_session,
            copier,
            &mut session,
            &mut staging,
            &mut report,
            progress,
        );

        self.enter(RunPhase::Cleanup, progress);
        if let Some(mut staging) = staging {
            report.cleanup_errors.extend(staging.cleanup());
        }
        if let Some(mut session) = session {
            if let Err(e) = session.close() {
                tracing::warn!(error = %e, "Closing SSH session failed");
                report.cleanup_errors.push(e.to_string());
            }
        }

        self.enter(RunPhase::Done, progress);
        tracing::info!(
            written = report.written(),
            skipped = report.skipped(),
            failed = report.failed(),
            remote_skips = report.remote_skips.len(),
            transfer_failed = report.transfer_error.is_some(),
            cleanup_errors = report.cleanup_errors.len(),
            "Remote run complete"
        );
        report
    }

    /// Listing, Transferring and Cutting. Returning early skips straight to
    /// cleanup; whatever was acquired is left in `session`/`staging`.
    fn execute<S, F, B>(
        &mut self,
        open_session: F,
        copier: &B,
        session: &mut Option<S>,
        staging: &mut Option<StagingArea>,
        report: &mut RunReport,
        progress: &dyn Fn(RunProgress),
    ) where
        S: RemoteSession,
        F: FnOnce() -> Result<S, RemoteError>,
        B: BulkCopier + ?Sized,
    {
        // -- Listing --
        self.enter(RunPhase::Listing, progress);
        let fs = match open_session() {
            Ok(s) => session.insert(s),
            Err(e) => {
                tracing::error!(error = %e, "Cannot open remote session");
                report.run_error = Some(e.to_string());
                return;
            }
        };

        let RemoteInventory { files, skipped } =
            inventory::list_remote_files(fs, &self.requested, &self.log_suffix);
        for skip in &skipped {
            progress(RunProgress::Warning {
                message: format!("{}: {}", skip.path.display(), skip.error),
            });
        }
        report.remote_skips = skipped;
        progress(RunProgress::FilesListed { count: files.len() });

        if files.is_empty() {
            tracing::warn!("No remote log files matched; nothing to transfer");
            return;
        }

        // -- Transferring --
        self.enter(RunPhase::Transferring, progress);
        let area = match StagingArea::create(&self.staging_parent) {
            Ok(area) => staging.insert(area),
            Err(e) => {
                tracing::error!(
                    parent = %self.staging_parent.display(),
                    error = %e,
                    "Cannot create staging area"
                );
                report.run_error = Some(format!(
                    "cannot create staging area under '{}': {e}",
                    self.staging_parent.display()
                ));
                return;
            }
        };

        let fetch_list: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
        if let Err(e) = copier.fetch(&fetch_list, area.path()) {
            tracing::error!(error = %e, "Transfer failed; cutting whatever was staged");
            progress(RunProgress::Warning {
                message: format!("transfer failed: {e}"),
            });
            report.transfer_error = Some(e.to_string());
        }

        // -- Cutting --
        self.enter(RunPhase::Cutting, progress);
        for file in &files {
            let outcome = match file.path.file_name() {
                Some(name) => {
                    let staged = area.staged_path(name);
                    if staged.is_file() {
                        cut_file(&self.cutter, &staged, &file.path)
                    } else {
                        tracing::error!(
                            remote = %file.path.display(),
                            staged = %staged.display(),
                            "File was not staged; skipping"
                        );
                        FileOutcome::Skipped {
                            source: file.path.clone(),
                            reason: SkipReason::NotStaged,
                        }
                    }
                }
                None => FileOutcome::Failed {
                    source: file.path.clone(),
                    error: "remote path has no file name".to_string(),
                },
            };
            progress(RunProgress::FileProcessed {
                outcome: outcome.clone(),
            });
            report.files.push(outcome);
        }
    }

    fn enter(&mut self, phase: RunPhase, progress: &dyn Fn(RunProgress)) {
        tracing::debug!(from = %self.phase, to = %phase, "Run phase");
        self.phase = phase;
        progress(RunProgress::PhaseChanged { phase });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inventory::fake::FakeRemoteFs;
    use crate::core::locator::SearchConfig;
    use crate::core::model::{RemoteStat, TimeWindow};
    use crate::core::timestamp::parse_user_instant;
    use crate::util::error::TransferError;
    use std::cell::{Cell, RefCell};
    use std::path::Path;
    use std::rc::Rc;

    const LOG: &str = "2025-10-09 15:30:42 a\n2025-10-09 15:30:44 b\n2025-10-09 15:30:49 c\n";

    struct FakeSession {
        fs: FakeRemoteFs,
        closed: Rc<Cell<usize>>,
    }

    impl RemoteFs for FakeSession {
        fn stat(&mut self, path: &Path) -> Result<RemoteStat, RemoteError> {
            self.fs.stat(path)
        }
        fn read_dir(&mut self, path: &Path) -> Result<Vec<PathBuf>, RemoteError> {
            self.fs.read_dir(path)
        }
    }

    impl RemoteSession for FakeSession {
        fn close(&mut self) -> Result<(), RemoteError> {
            self.closed.set(self.closed.get() + 1);
            Ok(())
        }
    }

    /// Writes `LOG` for every requested file whose name is in `land`, then
    /// fails when `fail` is set.
    struct FakeCopier {
        land: Vec<&'static str>,
        fail: bool,
        staging_seen: RefCell<Option<PathBuf>>,
    }

    impl BulkCopier for FakeCopier {
        fn fetch(&self, remote: &[PathBuf], staging: &Path) -> Result<(), TransferError> {
            *self.staging_seen.borrow_mut() = Some(staging.to_path_buf());
            for path in remote {
                let name = path.file_name().unwrap();
                if self.land.iter().any(|l| *l == name.to_string_lossy()) {
                    std::fs::write(staging.join(name), LOG).unwrap();
                }
            }
            if self.fail {
                return Err(TransferError::Failed {
                    program: "rsync".to_string(),
                    code: Some(23),
                    stderr: "partial transfer".to_string(),
                });
            }
            Ok(())
        }
    }

    fn remote_fs() -> FakeRemoteFs {
        FakeRemoteFs::default()
            .with_dir("/var/log/app")
            .with_file("/var/log/app/a.log")
            .with_file("/var/log/app/b.log")
            .with_file("/var/log/app/c.log")
            .with_file("/var/log/app/notes.txt")
    }

    fn runner(dir: &Path) -> RemoteRunner {
        let window = TimeWindow::new(
            parse_user_instant("2025-10-09 15:30:43").unwrap(),
            parse_user_instant("2025-10-09 15:30:47").unwrap(),
        );
        RemoteRunner::new(
            LineRangeCutter::new(window, dir.join("out"), SearchConfig::default()),
            vec!["/var/log/app".to_string()],
            ".log".to_string(),
            dir.join("staging"),
        )
    }

    fn phases(log: &RefCell<Vec<RunProgress>>) -> Vec<RunPhase> {
        log.borrow()
            .iter()
            .filter_map(|p| match p {
                RunProgress::PhaseChanged { phase } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_happy_path_runs_every_phase_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let closed = Rc::new(Cell::new(0));
        let copier = FakeCopier {
            land: vec!["a.log", "b.log", "c.log"],
            fail: false,
            staging_seen: RefCell::new(None),
        };
        let log = RefCell::new(Vec::new());
        let mut r = runner(dir.path());
        let report = r.run(
            || {
                Ok(FakeSession {
                    fs: remote_fs(),
                    closed: Rc::clone(&closed),
                })
            },
            &copier,
            &|p| log.borrow_mut().push(p),
        );

        assert_eq!(report.written(), 3);
        assert!(report.transfer_error.is_none());
        assert!(report.cleanup_errors.is_empty());
        assert_eq!(closed.get(), 1);
        assert_eq!(r.phase(), RunPhase::Done);
        assert_eq!(
            phases(&log),
            vec![
                RunPhase::Listing,
                RunPhase::Transferring,
                RunPhase::Cutting,
                RunPhase::Cleanup,
                RunPhase::Done
            ]
        );
        let staging = copier.staging_seen.borrow().clone().unwrap();
        assert!(!staging.exists(), "staging must be removed");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out").join("b.log")).unwrap(),
            "2025-10-09 15:30:44 b\n"
        );
    }

    #[test]
    fn test_transfer_failure_still_cuts_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let closed = Rc::new(Cell::new(0));
        let copier = FakeCopier {
            land: vec!["a.log"],
            fail: true,
            staging_seen: RefCell::new(None),
        };
        let mut r = runner(dir.path());
        let report = r.run(
            || {
                Ok(FakeSession {
                    fs: remote_fs(),
                    closed: Rc::clone(&closed),
                })
            },
            &copier,
            &|_| {},
        );

        assert!(report.transfer_error.as_deref().unwrap().contains("23"));
        assert_eq!(report.written(), 1);
        let not_staged = report
            .files
            .iter()
            .filter(|f| {
                matches!(
                    f,
                    FileOutcome::Skipped {
                        reason: SkipReason::NotStaged,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(not_staged, 2);
        assert!(!copier.staging_seen.borrow().clone().unwrap().exists());
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn test_session_open_failure_aborts_but_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let copier = FakeCopier {
            land: vec![],
            fail: false,
            staging_seen: RefCell::new(None),
        };
        let log = RefCell::new(Vec::new());
        let mut r = runner(dir.path());
        let report = r.run(
            || -> Result<FakeSession, RemoteError> {
                Err(RemoteError::HostKeyUnknown {
                    host: "logs".to_string(),
                    port: 22,
                })
            },
            &copier,
            &|p| log.borrow_mut().push(p),
        );

        assert!(report.run_error.unwrap().contains("known_hosts"));
        assert!(report.files.is_empty());
        assert!(copier.staging_seen.borrow().is_none());
        assert_eq!(
            phases(&log),
            vec![RunPhase::Listing, RunPhase::Cleanup, RunPhase::Done]
        );
    }

    #[test]
    fn test_empty_listing_produces_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let closed = Rc::new(Cell::new(0));
        let copier = FakeCopier {
            land: vec![],
            fail: false,
            staging_seen: RefCell::new(None),
        };
        let mut r = RemoteRunner::new(
            runner(dir.path()).cutter,
            vec!["/nope".to_string()],
            ".log".to_string(),
            dir.path().join("staging"),
        );
        let report = r.run(
            || {
                Ok(FakeSession {
                    fs: remote_fs(),
                    closed: Rc::clone(&closed),
                })
            },
            &copier,
            &|_| {},
        );
        assert!(report.files.is_empty());
        assert_eq!(report.remote_skips.len(), 1);
        assert!(report.run_error.is_none());
        assert!(copier.staging_seen.borrow().is_none());
        assert_eq!(closed.get(), 1);
    }
}
