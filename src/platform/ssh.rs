// LogCutter - platform/ssh.rs
//
// SSH/SFTP session used for remote listing.
//
// The session is opened with password authentication and checked against
// the user's known_hosts under an explicit host-key policy. It implements
// `RemoteFs` for the inventory and must be closed explicitly; `Drop` only
// covers paths that never reached `close()`.

use crate::core::inventory::RemoteFs;
use crate::core::model::RemoteStat;
use crate::platform::credentials::Credentials;
use crate::util::error::RemoteError;
use ssh2::{CheckResult, ErrorCode, KnownHostFileKind, KnownHostKeyFormat, Session, Sftp};
use std::fmt;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// SFTP status code for a missing file (`SSH_FX_NO_SUCH_FILE`).
const SFTP_NO_SUCH_FILE: i32 = 2;

/// How unknown host keys are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// The host must already be present in known_hosts.
    #[default]
    Strict,
    /// Unknown hosts are recorded on first contact. Changed keys are still
    /// rejected.
    AcceptNew,
}

impl HostKeyPolicy {
    /// Parse a config/CLI value. Accepts `strict` and `accept-new`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" | "yes" => Some(Self::Strict),
            "accept-new" | "accept_new" => Some(Self::AcceptNew),
            _ => None,
        }
    }

    /// Value for OpenSSH's `StrictHostKeyChecking` option.
    pub fn ssh_option_value(self) -> &'static str {
        match self {
            Self::Strict => "yes",
            Self::AcceptNew => "accept-new",
        }
    }
}

impl fmt::Display for HostKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::AcceptNew => "accept-new",
        })
    }
}

/// Where to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshEndpoint {
    pub host: String,
    pub port: u16,
}

impl SshEndpoint {
    /// Host name as it appears in known_hosts: bare for port 22,
    /// `[host]:port` otherwise.
    pub fn known_hosts_name(&self) -> String {
        if self.port == crate::util::constants::DEFAULT_SSH_PORT {
            self.host.clone()
        } else {
            format!("[{}]:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for SshEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// An authenticated SSH session with an open SFTP channel.
pub struct SshSession {
    session: Session,
    sftp: Option<Sftp>,
    endpoint: SshEndpoint,
    closed: bool,
}

impl fmt::Debug for SshSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshSession")
            .field("endpoint", &self.endpoint)
            .field("closed", &self.closed)
            .finish()
    }
}

impl SshSession {
    /// Connect, verify the host key, authenticate and start SFTP.
    pub fn open(
        endpoint: &SshEndpoint,
        credentials: &Credentials,
        policy: HostKeyPolicy,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        tracing::info!(
            endpoint = %endpoint,
            user = %credentials.username,
            policy = %policy,
            "Opening SSH session"
        );

        let tcp = connect_tcp(endpoint, timeout)?;
        let session_err = |stage: &'static str| {
            let host = endpoint.host.clone();
            move |source| RemoteError::Session {
                host,
                stage,
                source,
            }
        };

        let mut session = Session::new().map_err(session_err("initialisation"))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        session.handshake().map_err(session_err("handshake"))?;

        verify_host_key(&session, endpoint, policy)?;

        session
            .userauth_password(&credentials.username, credentials.password.expose())
            .map_err(|e| RemoteError::Auth {
                username: credentials.username.clone(),
                source: Some(e),
            })?;
        if !session.authenticated() {
            return Err(RemoteError::Auth {
                username: credentials.username.clone(),
                source: None,
            });
        }

        let sftp = session.sftp().map_err(session_err("sftp start"))?;
        tracing::debug!(endpoint = %endpoint, "SSH session ready");

        Ok(Self {
            session,
            sftp: Some(sftp),
            endpoint: endpoint.clone(),
            closed: false,
        })
    }

    pub fn endpoint(&self) -> &SshEndpoint {
        &self.endpoint
    }

    /// Close the SFTP channel and disconnect. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), RemoteError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        drop(self.sftp.take());
        self.session
            .disconnect(None, "logcutter run complete", None)
            .map_err(|source| RemoteError::Session {
                host: self.endpoint.host.clone(),
                stage: "disconnect",
                source,
            })?;
        tracing::debug!(endpoint = %self.endpoint, "SSH session closed");
        Ok(())
    }

    fn sftp(&self) -> Result<&Sftp, RemoteError> {
        self.sftp.as_ref().ok_or_else(|| RemoteError::SessionClosed {
            host: self.endpoint.host.clone(),
        })
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!(endpoint = %self.endpoint, "SSH session dropped without close");
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "SSH disconnect on drop failed");
            }
        }
    }
}

impl RemoteFs for SshSession {
    fn stat(&mut self, path: &Path) -> Result<RemoteStat, RemoteError> {
        let stat = self
            .sftp()?
            .stat(path)
            .map_err(|e| sftp_error(path, e))?;
        Ok(RemoteStat {
            is_dir: stat.is_dir(),
            is_file: stat.is_file(),
        })
    }

    fn read_dir(&mut self, path: &Path) -> Result<Vec<PathBuf>, RemoteError> {
        let entries = self
            .sftp()?
            .readdir(path)
            .map_err(|e| sftp_error(path, e))?;
        Ok(entries.into_iter().map(|(child, _)| child).collect())
    }
}

fn sftp_error(path: &Path, source: ssh2::Error) -> RemoteError {
    if matches!(source.code(), ErrorCode::SFTP(SFTP_NO_SUCH_FILE)) {
        RemoteError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        RemoteError::Sftp {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Try every resolved address in turn with a bounded connect timeout.
fn connect_tcp(endpoint: &SshEndpoint, timeout: Duration) -> Result<TcpStream, RemoteError> {
    let connect_err = |source| RemoteError::Connect {
        host: endpoint.host.clone(),
        port: endpoint.port,
        source,
    };

    let addrs = (endpoint.host.as_str(), endpoint.port)
        .to_socket_addrs()
        .map_err(connect_err)?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                tracing::debug!(addr = %addr, "TCP connected");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(addr = %addr, error = %e, "TCP connect attempt failed");
                last_err = Some(e);
            }
        }
    }
    Err(connect_err(last_err.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "host resolved to no addresses")
    })))
}

/// Location of the user's OpenSSH known_hosts file.
pub fn known_hosts_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".ssh").join("known_hosts"))
}

fn verify_host_key(
    session: &Session,
    endpoint: &SshEndpoint,
    policy: HostKeyPolicy,
) -> Result<(), RemoteError> {
    let path = known_hosts_path().ok_or_else(|| RemoteError::HostKeyStore {
        path: PathBuf::from("~/.ssh/known_hosts"),
        reason: "home directory could not be determined".to_string(),
    })?;
    let store_err = |reason: String| RemoteError::HostKeyStore {
        path: path.clone(),
        reason,
    };

    let (key, key_type) = session
        .host_key()
        .ok_or_else(|| store_err("server presented no host key".to_string()))?;

    let mut known_hosts = session
        .known_hosts()
        .map_err(|e| store_err(e.to_string()))?;
    if path.exists() {
        known_hosts
            .read_file(&path, KnownHostFileKind::OpenSSH)
            .map_err(|e| store_err(e.to_string()))?;
    }

    match known_hosts.check_port(&endpoint.host, endpoint.port, key) {
        CheckResult::Match => {
            tracing::debug!(endpoint = %endpoint, "Host key verified");
            Ok(())
        }
        CheckResult::Mismatch => {
            tracing::error!(endpoint = %endpoint, "Host key mismatch");
            Err(RemoteError::HostKeyMismatch {
                host: endpoint.host.clone(),
                port: endpoint.port,
            })
        }
        CheckResult::NotFound => match policy {
            HostKeyPolicy::Strict => Err(RemoteError::HostKeyUnknown {
                host: endpoint.host.clone(),
                port: endpoint.port,
            }),
            HostKeyPolicy::AcceptNew => {
                tracing::warn!(
                    endpoint = %endpoint,
                    known_hosts = %path.display(),
                    "Unknown host key accepted and recorded"
                );
                known_hosts
                    .add(
                        &endpoint.known_hosts_name(),
                        key,
                        "added by logcutter",
                        KnownHostKeyFormat::from(key_type),
                    )
                    .map_err(|e| store_err(e.to_string()))?;
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| store_err(e.to_string()))?;
                }
                known_hosts
                    .write_file(&path, KnownHostFileKind::OpenSSH)
                    .map_err(|e| store_err(e.to_string()))
            }
        },
        CheckResult::Failure => Err(store_err("host key check failed".to_string())),
    }
}
