// LogCutter - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation (debug mode support)
// 3. Run request validation and credential acquisition
// 4. Background run with progress rendering, optional JSON report

use clap::Parser;
use logcutter::app::job::JobManager;
use logcutter::app::request::{RemoteParams, RunMode, RunParams};
use logcutter::core::model::{FileOutcome, RunProgress, RunReport};
use logcutter::platform::config::{self, AppConfig, PlatformPaths};
use logcutter::platform::credentials::{self, Credentials};
use logcutter::platform::ssh::HostKeyPolicy;
use logcutter::util::{self, constants};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// How often the front end wakes while waiting for progress.
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// LogCutter - extract a date-bounded slice of lines from log files.
///
/// Each input file yields one output file of the same name in the
/// destination directory, holding only the lines from the first line at or
/// after FROM up to (not including) the first line at or after TO.
#[derive(Parser, Debug)]
#[command(name = "logcutter", version, about)]
struct Cli {
    /// Log files or directories (remote paths with --host; a trailing '/'
    /// expands every remote path as a directory).
    paths: Vec<String>,

    /// Window start, e.g. "2025-10-09 15:30:45" (default: 3 hours before --to).
    #[arg(long)]
    from: Option<String>,

    /// Window end (default: now).
    #[arg(long)]
    to: Option<String>,

    /// Destination directory for the cut files.
    #[arg(short = 'o', long = "dest")]
    dest: Option<PathBuf>,

    /// Remote host (`host` or `host:port`); enables remote mode.
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Remote SSH port when --host carries none.
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Remote username.
    #[arg(short = 'u', long = "user")]
    user: Option<String>,

    /// Record unknown host keys in known_hosts instead of refusing them.
    #[arg(long = "accept-new-host-key")]
    accept_new_host_key: bool,

    /// Window size (lines) at which the range search turns linear.
    #[arg(long = "crossover")]
    crossover: Option<usize>,

    /// Write the run report as JSON to this file.
    #[arg(long = "report")]
    report: Option<PathBuf>,

    /// Configuration file (default: platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config_path, explicit) = match cli.config.clone() {
        Some(path) => (path, true),
        None => (PlatformPaths::resolve().config_file(), false),
    };
    let (app_config, config_warnings) = match config::load_config(&config_path, explicit) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging subsystem
    util::logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        app_config.log_file.as_deref(),
    );
    for warning in &config_warnings {
        tracing::warn!(config = %config_path.display(), "{}", warning);
    }

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "LogCutter starting"
    );

    let report_path = cli.report.clone();
    let params = build_params(cli, &app_config);
    let now = chrono::Local::now().naive_local();
    let request = match params.validate(now) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "Invalid run parameters");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let credentials = match &request.mode {
        RunMode::Local { .. } => None,
        RunMode::Remote(remote) => {
            match credentials::password_from_env_or_prompt(&remote.username, &remote.endpoint.host)
            {
                Ok(password) => Some(Credentials::new(remote.username.clone(), password)),
                Err(e) => {
                    eprintln!("Error: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let mut job = JobManager::new();
    job.start(request, credentials);
    let report = wait_for_report(&job);
    job.join();

    let Some(report) = report else {
        return ExitCode::FAILURE;
    };

    if let Some(path) = report_path {
        if let Err(e) = write_report(&path, &report) {
            tracing::error!(error = %e, "Cannot write run report");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    }

    print_summary(&report);
    if report.run_error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Merge CLI flags over config values.
fn build_params(cli: Cli, config: &AppConfig) -> RunParams {
    let remote_cfg = &config.remote;
    let remote = cli.host.or_else(|| remote_cfg.host.clone()).map(|host| {
        let host_key_policy = if cli.accept_new_host_key {
            HostKeyPolicy::AcceptNew
        } else {
            remote_cfg.host_key_policy
        };
        RemoteParams {
            host,
            port: cli.port.or(Some(remote_cfg.port)),
            username: cli
                .user
                .clone()
                .or_else(|| remote_cfg.username.clone())
                .unwrap_or_default(),
            log_suffix: remote_cfg.log_suffix.clone(),
            host_key_policy,
            staging_dir: remote_cfg.staging_dir.clone(),
            rsync_program: remote_cfg.rsync_program.clone(),
            sshpass_program: remote_cfg.sshpass_program.clone(),
            connect_timeout_secs: remote_cfg.connect_timeout_secs,
        }
    });

    RunParams {
        from: cli.from,
        to: cli.to,
        destination: cli.dest.or_else(|| config.destination.clone()),
        paths: cli.paths,
        crossover_threshold: cli.crossover.unwrap_or(config.crossover_threshold),
        include_patterns: config.include_patterns.clone(),
        remote,
    }
}

/// Render progress until the run reports completion.
fn wait_for_report(job: &JobManager) -> Option<RunReport> {
    loop {
        match job.next_progress(PROGRESS_POLL_INTERVAL) {
            Some(RunProgress::PhaseChanged { phase }) => {
                tracing::debug!(phase = %phase, "Phase");
            }
            Some(RunProgress::FilesListed { count }) => {
                println!("{count} file(s) to cut");
            }
            Some(RunProgress::FileProcessed { outcome }) => print_outcome(&outcome),
            Some(RunProgress::Warning { message }) => eprintln!("warning: {message}"),
            Some(RunProgress::Completed { report }) => return Some(report),
            Some(RunProgress::Failed { error }) => {
                eprintln!("Error: {error}");
                return None;
            }
            None if job.is_finished() => {
                // Drain anything sent between the timeout and thread exit.
                for msg in job.poll_progress() {
                    if let RunProgress::Completed { report } = msg {
                        return Some(report);
                    }
                }
                tracing::error!("Run ended without a report");
                return None;
            }
            None => {}
        }
    }
}

fn print_outcome(outcome: &FileOutcome) {
    match outcome {
        FileOutcome::Written {
            source,
            destination,
            start,
            end,
        } => println!(
            "cut    {} -> {} (lines {start}..{end})",
            source.display(),
            destination.display()
        ),
        FileOutcome::Skipped { source, reason } => {
            println!("skip   {}: {reason}", source.display())
        }
        FileOutcome::Failed { source, error } => {
            eprintln!("failed {}: {error}", source.display())
        }
    }
}

fn print_summary(report: &RunReport) {
    if let Some(ref e) = report.transfer_error {
        eprintln!("transfer: {e}");
    }
    for e in &report.cleanup_errors {
        eprintln!("cleanup: {e}");
    }
    if let Some(ref e) = report.run_error {
        eprintln!("Error: {e}");
    }
    println!(
        "Done: {} written, {} skipped, {} failed",
        report.written(),
        report.skipped(),
        report.failed()
    );
}

fn write_report(path: &Path, report: &RunReport) -> util::error::Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| util::error::LogCutterError::Io {
        path: path.to_path_buf(),
        operation: "serialise report",
        source: std::io::Error::other(e),
    })?;
    std::fs::write(path, json).map_err(|source| util::error::LogCutterError::Io {
        path: path.to_path_buf(),
        operation: "write report",
        source,
    })?;
    tracing::info!(path = %path.display(), "Run report written");
    Ok(())
}
