// LogCutter - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Errors are categorised by the subsystem that produced them; each keeps its
// causal source so diagnostics can log the full chain.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogCutter operations.
#[derive(Debug)]
pub enum LogCutterError {
    /// User-supplied run parameters are invalid. Fatal to the run.
    Input(InputError),

    /// Cutting a single file failed.
    Cut(CutError),

    /// Remote session or listing failed.
    Remote(RemoteError),

    /// Bulk transfer failed.
    Transfer(TransferError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for LogCutterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(e) => write!(f, "Input error: {e}"),
            Self::Cut(e) => write!(f, "Cut error: {e}"),
            Self::Remote(e) => write!(f, "Remote error: {e}"),
            Self::Transfer(e) => write!(f, "Transfer error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LogCutterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Input(e) => Some(e),
            Self::Cut(e) => Some(e),
            Self::Remote(e) => Some(e),
            Self::Transfer(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Errors in the parameters of a run. These are the only errors that abort a
/// run before any file is touched.
#[derive(Debug)]
pub enum InputError {
    /// A window bound could not be parsed with any supported format.
    InvalidDate { field: &'static str, value: String },

    /// No input paths were supplied.
    NoPaths,

    /// No destination directory was supplied.
    NoDestination,

    /// Remote mode was requested but a required field is empty.
    MissingRemoteField { field: &'static str },

    /// Crossover threshold outside the accepted range.
    InvalidThreshold { value: usize, min: usize, max: usize },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate { field, value } => write!(
                f,
                "cannot parse {field} date '{value}'. Expected e.g. \
                 '2025-10-09 15:30:45', '2025-10-09T15:30:45.123Z', \
                 'Oct 9, 2025 3:30 PM' or '10/09/2025 15:30:45'"
            ),
            Self::NoPaths => write!(f, "no log files or directories were given"),
            Self::NoDestination => write!(f, "no destination directory was given"),
            Self::MissingRemoteField { field } => {
                write!(f, "remote mode requires a non-empty {field}")
            }
            Self::InvalidThreshold { value, min, max } => write!(
                f,
                "crossover threshold {value} is out of range ({min}-{max})"
            ),
        }
    }
}

impl std::error::Error for InputError {}

impl From<InputError> for LogCutterError {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

// ---------------------------------------------------------------------------
// Cut errors
// ---------------------------------------------------------------------------

/// Errors scoped to a single input file. Never fatal to the run.
#[derive(Debug)]
pub enum CutError {
    /// The input file could not be read.
    Read { path: PathBuf, source: io::Error },

    /// The input path has no file name to derive the destination from.
    NoFileName { path: PathBuf },

    /// The destination directory could not be created.
    CreateDestination { path: PathBuf, source: io::Error },

    /// The destination file could not be written.
    Write { path: PathBuf, source: io::Error },
}

impl fmt::Display for CutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read '{}': {source}", path.display())
            }
            Self::NoFileName { path } => {
                write!(f, "'{}' has no file name", path.display())
            }
            Self::CreateDestination { path, source } => write!(
                f,
                "cannot create destination directory '{}': {source}",
                path.display()
            ),
            Self::Write { path, source } => {
                write!(f, "cannot write '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for CutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::CreateDestination { source, .. } => Some(source),
            Self::Write { source, .. } => Some(source),
            Self::NoFileName { .. } => None,
        }
    }
}

impl From<CutError> for LogCutterError {
    fn from(e: CutError) -> Self {
        Self::Cut(e)
    }
}

// ---------------------------------------------------------------------------
// Remote errors
// ---------------------------------------------------------------------------

/// Errors from the SSH session and remote listing.
#[derive(Debug)]
pub enum RemoteError {
    /// TCP connection to the host failed.
    Connect {
        host: String,
        port: u16,
        source: io::Error,
    },

    /// SSH protocol failure (handshake, channel, sftp subsystem).
    Session {
        host: String,
        stage: &'static str,
        source: ssh2::Error,
    },

    /// The host key is not in known_hosts and the policy is strict.
    HostKeyUnknown { host: String, port: u16 },

    /// The host key differs from the one recorded in known_hosts.
    HostKeyMismatch { host: String, port: u16 },

    /// known_hosts could not be consulted or updated.
    HostKeyStore { path: PathBuf, reason: String },

    /// Password authentication was rejected.
    Auth {
        username: String,
        source: Option<ssh2::Error>,
    },

    /// A remote path does not exist.
    NotFound { path: PathBuf },

    /// An SFTP stat or directory listing failed.
    Sftp { path: PathBuf, source: ssh2::Error },

    /// The session was used after `close()`.
    SessionClosed { host: String },
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { host, port, source } => {
                write!(f, "cannot connect to {host}:{port}: {source}")
            }
            Self::Session {
                host,
                stage,
                source,
            } => write!(f, "SSH {stage} with {host} failed: {source}"),
            Self::HostKeyUnknown { host, port } => write!(
                f,
                "host key for {host}:{port} is not in known_hosts. Verify it and \
                 add it, or re-run with the accept-new host key policy"
            ),
            Self::HostKeyMismatch { host, port } => write!(
                f,
                "host key for {host}:{port} does not match known_hosts \
                 (possible man-in-the-middle); refusing to connect"
            ),
            Self::HostKeyStore { path, reason } => {
                write!(f, "known_hosts '{}': {reason}", path.display())
            }
            Self::Auth { username, source } => match source {
                Some(source) => {
                    write!(f, "authentication failed for user '{username}': {source}")
                }
                None => write!(f, "authentication failed for user '{username}'"),
            },
            Self::NotFound { path } => {
                write!(f, "remote path '{}' does not exist", path.display())
            }
            Self::Sftp { path, source } => {
                write!(f, "remote '{}': {source}", path.display())
            }
            Self::SessionClosed { host } => {
                write!(f, "SSH session with {host} is already closed")
            }
        }
    }
}

impl std::error::Error for RemoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect { source, .. } => Some(source),
            Self::Session { source, .. } => Some(source),
            Self::Auth {
                source: Some(source),
                ..
            } => Some(source),
            Self::Sftp { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<RemoteError> for LogCutterError {
    fn from(e: RemoteError) -> Self {
        Self::Remote(e)
    }
}

// ---------------------------------------------------------------------------
// Transfer errors
// ---------------------------------------------------------------------------

/// Errors from the external bulk-copy invocation.
#[derive(Debug)]
pub enum TransferError {
    /// The transfer program (or its password helper) is not installed.
    ProgramMissing { program: String, source: io::Error },

    /// The program could not be started for another reason.
    Spawn { program: String, source: io::Error },

    /// The program ran and exited unsuccessfully.
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProgramMissing { program, source } => {
                write!(f, "'{program}' is not installed or not on PATH: {source}")
            }
            Self::Spawn { program, source } => {
                write!(f, "cannot start '{program}': {source}")
            }
            Self::Failed {
                program,
                code,
                stderr,
            } => {
                match code {
                    Some(code) => write!(f, "'{program}' exited with status {code}")?,
                    None => write!(f, "'{program}' was terminated by a signal")?,
                }
                if !stderr.trim().is_empty() {
                    write!(f, ": {}", stderr.trim())?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ProgramMissing { source, .. } => Some(source),
            Self::Spawn { source, .. } => Some(source),
            Self::Failed { .. } => None,
        }
    }
}

impl From<TransferError> for LogCutterError {
    fn from(e: TransferError) -> Self {
        Self::Transfer(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogCutterError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for LogCutter results.
pub type Result<T> = std::result::Result<T, LogCutterError>;
