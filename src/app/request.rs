// LogCutter - app/request.rs
//
// Run parameters as supplied by the front end, and their validation into a
// `CutRequest`. Validation errors are the only errors that stop a run before
// any file is touched.

use crate::core::discovery::DiscoveryConfig;
use crate::core::locator::SearchConfig;
use crate::core::model::TimeWindow;
use crate::core::timestamp::parse_user_instant;
use crate::platform::rsync::RsyncSettings;
use crate::platform::ssh::{HostKeyPolicy, SshEndpoint};
use crate::util::constants;
use crate::util::error::InputError;
use chrono::{Duration, NaiveDateTime};
use std::path::PathBuf;

/// Unvalidated run parameters.
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    /// Window start; defaults to `DEFAULT_WINDOW_HOURS` before `to`.
    pub from: Option<String>,
    /// Window end; defaults to now.
    pub to: Option<String>,
    pub destination: Option<PathBuf>,
    /// Local files/directories, or remote paths in remote mode. Kept as
    /// strings because a trailing separator is significant remotely.
    pub paths: Vec<String>,
    pub crossover_threshold: usize,
    pub include_patterns: Vec<String>,
    pub remote: Option<RemoteParams>,
}

/// Unvalidated remote-mode parameters.
#[derive(Debug, Clone)]
pub struct RemoteParams {
    /// `host` or `host:port`.
    pub host: String,
    /// Used when `host` carries no port.
    pub port: Option<u16>,
    pub username: String,
    pub log_suffix: String,
    pub host_key_policy: HostKeyPolicy,
    pub staging_dir: Option<PathBuf>,
    pub rsync_program: String,
    pub sshpass_program: String,
    pub connect_timeout_secs: u64,
}

/// A validated run.
#[derive(Debug, Clone)]
pub struct CutRequest {
    pub window: TimeWindow,
    pub destination: PathBuf,
    pub search: SearchConfig,
    pub mode: RunMode,
}

#[derive(Debug, Clone)]
pub enum RunMode {
    Local {
        paths: Vec<PathBuf>,
        discovery: DiscoveryConfig,
    },
    Remote(RemoteRequest),
}

/// Validated remote-mode settings. The password is obtained separately.
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    pub endpoint: SshEndpoint,
    pub username: String,
    pub paths: Vec<String>,
    pub log_suffix: String,
    /// Parent directory under which the run's staging directory is created.
    pub staging_parent: PathBuf,
    pub connect_timeout: std::time::Duration,
    pub rsync: RsyncSettings,
}

impl RemoteRequest {
    pub fn host_key_policy(&self) -> HostKeyPolicy {
        self.rsync.host_key_policy
    }
}

impl RunParams {
    /// Validate into a `CutRequest`. `now` anchors the default window.
    pub fn validate(self, now: NaiveDateTime) -> Result<CutRequest, InputError> {
        let to = match self.to.as_deref() {
            Some(raw) => parse_bound("to", raw)?,
            None => now,
        };
        let from = match self.from.as_deref() {
            Some(raw) => parse_bound("from", raw)?,
            None => to - Duration::hours(constants::DEFAULT_WINDOW_HOURS),
        };
        let window = TimeWindow::new(from, to);
        if window.is_inverted() {
            tracing::warn!(window = %window, "From is after to; no file will be written");
        }

        let destination = self
            .destination
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or(InputError::NoDestination)?;

        let paths: Vec<String> = self
            .paths
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if paths.is_empty() {
            return Err(InputError::NoPaths);
        }

        let threshold = self.crossover_threshold;
        if !(constants::MIN_CROSSOVER_THRESHOLD..=constants::MAX_CROSSOVER_THRESHOLD)
            .contains(&threshold)
        {
            return Err(InputError::InvalidThreshold {
                value: threshold,
                min: constants::MIN_CROSSOVER_THRESHOLD,
                max: constants::MAX_CROSSOVER_THRESHOLD,
            });
        }
        let search = SearchConfig {
            crossover_threshold: threshold,
        };

        let mode = match self.remote {
            None => RunMode::Local {
                paths: paths.into_iter().map(PathBuf::from).collect(),
                discovery: DiscoveryConfig {
                    include_patterns: self.include_patterns,
                },
            },
            Some(remote) => RunMode::Remote(remote.validate(paths)?),
        };

        tracing::debug!(
            window = %window,
            destination = %destination.display(),
            "Run request validated"
        );
        Ok(CutRequest {
            window,
            destination,
            search,
            mode,
        })
    }
}

impl RemoteParams {
    fn validate(self, paths: Vec<String>) -> Result<RemoteRequest, InputError> {
        let (host, embedded_port) = split_host_port(&self.host);
        if host.is_empty() {
            return Err(InputError::MissingRemoteField { field: "host" });
        }
        let username = self.username.trim().to_string();
        if username.is_empty() {
            return Err(InputError::MissingRemoteField { field: "username" });
        }
        let port = embedded_port
            .or(self.port)
            .unwrap_or(constants::DEFAULT_SSH_PORT);

        Ok(RemoteRequest {
            endpoint: SshEndpoint { host, port },
            username,
            paths,
            log_suffix: self.log_suffix,
            staging_parent: self.staging_dir.unwrap_or_else(std::env::temp_dir),
            connect_timeout: std::time::Duration::from_secs(self.connect_timeout_secs),
            rsync: RsyncSettings {
                rsync_program: self.rsync_program,
                sshpass_program: self.sshpass_program,
                host_key_policy: self.host_key_policy,
                connect_timeout_secs: self.connect_timeout_secs,
            },
        })
    }
}

fn parse_bound(field: &'static str, raw: &str) -> Result<NaiveDateTime, InputError> {
    parse_user_instant(raw).ok_or_else(|| InputError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

/// Split `host[:port]`. A missing or unparseable port yields `None`, as does
/// a bare IPv6 address; `[addr]:port` is accepted.
pub fn split_host_port(input: &str) -> (String, Option<u16>) {
    let input = input.trim();

    if let Some(rest) = input.strip_prefix('[') {
        if let Some((addr, tail)) = rest.split_once(']') {
            let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
            return (addr.to_string(), port);
        }
    }

    match input.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => match port.parse::<u16>() {
            Ok(port) => (host.to_string(), Some(port)),
            Err(_) => {
                tracing::warn!(port, "Unparseable port in host; using default");
                (host.to_string(), None)
            }
        },
        _ => (input.to_string(), None),
    }
}
