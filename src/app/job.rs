// LogCutter - app/job.rs
//
// Background execution of a run. The front end starts a job and renders
// `RunProgress` messages received over an mpsc channel; the run itself is
// sequential on a single worker thread.
//
// A run cannot be cancelled once started: the caller may stop listening, but
// in-flight transfer and file I/O complete.

use crate::app::local::run_local;
use crate::app::request::{CutRequest, RunMode};
use crate::app::runner::RemoteRunner;
use crate::core::cutter::LineRangeCutter;
use crate::core::model::RunProgress;
use crate::platform::credentials::Credentials;
use crate::platform::rsync::RsyncTransfer;
use crate::platform::ssh::SshSession;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Manages one run on a background thread.
pub struct JobManager {
    /// Channel receiver for the front end to read progress messages.
    pub progress_rx: Option<mpsc::Receiver<RunProgress>>,
    handle: Option<JoinHandle<()>>,
}

impl JobManager {
    pub fn new() -> Self {
        Self {
            progress_rx: None,
            handle: None,
        }
    }

    /// Start `request` on a background thread. `credentials` are required in
    /// remote mode and ignored locally.
    pub fn start(&mut self, request: CutRequest, credentials: Option<Credentials>) {
        let (tx, rx) = mpsc::channel();
        self.progress_rx = Some(rx);
        self.handle = Some(std::thread::spawn(move || {
            run_job(request, credentials, tx);
        }));
        tracing::info!("Run started");
    }

    /// Poll for progress messages without blocking. Returns all pending messages.
    pub fn poll_progress(&self) -> Vec<RunProgress> {
        let mut messages = Vec::new();
        if let Some(ref rx) = self.progress_rx {
            while let Ok(msg) = rx.try_recv() {
                messages.push(msg);
            }
        }
        messages
    }

    /// Wait up to `timeout` for the next message. `None` on timeout or once
    /// the worker has finished and the channel is drained.
    pub fn next_progress(&self, timeout: Duration) -> Option<RunProgress> {
        self.progress_rx.as_ref()?.recv_timeout(timeout).ok()
    }

    /// True once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the worker thread to exit.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Run worker thread panicked");
            }
        }
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute the run and report through `tx`. Runs on the worker thread.
fn run_job(request: CutRequest, credentials: Option<Credentials>, tx: mpsc::Sender<RunProgress>) {
    // Receiver dropped means nobody is listening; the run still completes.
    let progress = |msg: RunProgress| {
        let _ = tx.send(msg);
    };

    let cutter = LineRangeCutter::new(request.window, request.destination, request.search);

    let report = match request.mode {
        RunMode::Local { paths, discovery } => run_local(&cutter, &paths, &discovery, &progress),
        RunMode::Remote(remote) => {
            let Some(credentials) = credentials else {
                tracing::error!("Remote run started without credentials");
                progress(RunProgress::Failed {
                    error: "remote run requires credentials".to_string(),
                });
                return;
            };
            let copier = RsyncTransfer::new(
                remote.endpoint.clone(),
                credentials.clone(),
                remote.rsync.clone(),
            );
            let policy = remote.host_key_policy();
            let mut runner = RemoteRunner::new(
                cutter,
                remote.paths,
                remote.log_suffix,
                remote.staging_parent,
            );
            runner.run(
                || SshSession::open(&remote.endpoint, &credentials, policy, remote.connect_timeout),
                &copier,
                &progress,
            )
        }
    };

    progress(RunProgress::Completed { report });
}
