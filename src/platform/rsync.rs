// LogCutter - platform/rsync.rs
//
// Bulk transfer of remote files into the local staging area.
//
// One rsync invocation copies every listed file. rsync's own ssh is wrapped
// in `sshpass -e`, which reads the password from the child's SSHPASS
// environment variable; the password never appears in any argument list.
// The host-key policy is passed to ssh as StrictHostKeyChecking.

use crate::platform::credentials::Credentials;
use crate::platform::ssh::{HostKeyPolicy, SshEndpoint};
use crate::util::constants;
use crate::util::error::TransferError;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Copies a set of remote files into a local directory.
pub trait BulkCopier {
    /// Fetch `remote` into `staging`, flattening each file to its base name.
    fn fetch(&self, remote: &[PathBuf], staging: &Path) -> Result<(), TransferError>;
}

/// Programs and options for the rsync transfer.
#[derive(Debug, Clone)]
pub struct RsyncSettings {
    pub rsync_program: String,
    pub sshpass_program: String,
    pub host_key_policy: HostKeyPolicy,
    pub connect_timeout_secs: u64,
}

impl Default for RsyncSettings {
    fn default() -> Self {
        Self {
            rsync_program: constants::DEFAULT_RSYNC_PROGRAM.to_string(),
            sshpass_program: constants::DEFAULT_SSHPASS_PROGRAM.to_string(),
            host_key_policy: HostKeyPolicy::default(),
            connect_timeout_secs: constants::DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// rsync-over-ssh transfer authenticated with a password.
#[derive(Debug, Clone)]
pub struct RsyncTransfer {
    endpoint: SshEndpoint,
    credentials: Credentials,
    settings: RsyncSettings,
}

impl RsyncTransfer {
    pub fn new(endpoint: SshEndpoint, credentials: Credentials, settings: RsyncSettings) -> Self {
        Self {
            endpoint,
            credentials,
            settings,
        }
    }

    /// The `-e` remote shell: ssh with port, host-key policy and a connect
    /// timeout. BatchMode is left off so ssh accepts the password sshpass
    /// supplies.
    pub fn remote_shell(&self) -> String {
        format!(
            "ssh -p {} -o StrictHostKeyChecking={} -o ConnectTimeout={}",
            self.endpoint.port,
            self.settings.host_key_policy.ssh_option_value(),
            self.settings.connect_timeout_secs,
        )
    }

    /// `user@host:path` source operand. IPv6 literals are bracketed so
    /// rsync does not split the address at its first colon.
    fn remote_source(&self, path: &Path) -> String {
        let host = &self.endpoint.host;
        if host.contains(':') {
            format!("{}@[{host}]:{}", self.credentials.username, path.display())
        } else {
            format!("{}@{host}:{}", self.credentials.username, path.display())
        }
    }

    /// Build the full `sshpass -e rsync ...` command without running it.
    ///
    /// `--copy-links` transfers the target of a remote symlink: the listing
    /// follows links, so a linked log must land as a regular file.
    pub fn build_command(&self, remote: &[PathBuf], staging: &Path) -> Command {
        let mut cmd = Command::new(&self.settings.sshpass_program);
        cmd.arg("-e")
            .arg(&self.settings.rsync_program)
            .arg("--archive")
            .arg("--copy-links")
            .arg("--compress")
            .arg("--protect-args")
            .arg("-e")
            .arg(self.remote_shell())
            .arg("--");
        for path in remote {
            cmd.arg(self.remote_source(path));
        }
        let mut dest = staging.as_os_str().to_owned();
        dest.push("/");
        cmd.arg(dest);
        cmd.env("SSHPASS", self.credentials.password.expose());
        cmd
    }
}

impl BulkCopier for RsyncTransfer {
    fn fetch(&self, remote: &[PathBuf], staging: &Path) -> Result<(), TransferError> {
        if remote.is_empty() {
            tracing::debug!("Nothing to transfer");
            return Ok(());
        }

        let program = self.settings.rsync_program.clone();
        tracing::info!(
            files = remote.len(),
            endpoint = %self.endpoint,
            staging = %staging.display(),
            "Starting bulk transfer"
        );

        let output = self.build_command(remote, staging).output().map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                TransferError::ProgramMissing {
                    program: self.settings.sshpass_program.clone(),
                    source,
                }
            } else {
                TransferError::Spawn {
                    program: self.settings.sshpass_program.clone(),
                    source,
                }
            }
        })?;

        if output.status.success() {
            tracing::info!(files = remote.len(), "Bulk transfer complete");
            return Ok(());
        }

        let stderr = truncate_stderr(&output.stderr);
        tracing::error!(
            program = %program,
            code = ?output.status.code(),
            stderr = %stderr.trim(),
            "Bulk transfer failed"
        );
        Err(TransferError::Failed {
            program,
            code: output.status.code(),
            stderr,
        })
    }
}

/// Lossy stderr text capped at `MAX_TRANSFER_STDERR_BYTES` (cut on a char
/// boundary).
fn truncate_stderr(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= constants::MAX_TRANSFER_STDERR_BYTES {
        return text.into_owned();
    }
    let mut cut = constants::MAX_TRANSFER_STDERR_BYTES;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::credentials::Password;
    use std::ffi::OsStr;

    fn transfer(policy: HostKeyPolicy) -> RsyncTransfer {
        RsyncTransfer::new(
            SshEndpoint {
                host: "logs.example.com".to_string(),
                port: 2222,
            },
            Credentials::new("ops", Password::new("hunter2")),
            RsyncSettings {
                host_key_policy: policy,
                ..RsyncSettings::default()
            },
        )
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_password_only_in_environment() {
        let t = transfer(HostKeyPolicy::Strict);
        let cmd = t.build_command(
            &[PathBuf::from("/var/log/app/a.log")],
            Path::new("/tmp/stage"),
        );
        assert_eq!(cmd.get_program(), OsStr::new("sshpass"));
        assert!(args(&cmd).iter().all(|a| !a.contains("hunter2")));
        let sshpass = cmd
            .get_envs()
            .find(|(k, _)| *k == OsStr::new("SSHPASS"))
            .and_then(|(_, v)| v);
        assert_eq!(sshpass, Some(OsStr::new("hunter2")));
    }

    #[test]
    fn test_command_shape() {
        let t = transfer(HostKeyPolicy::Strict);
        let cmd = t.build_command(
            &[
                PathBuf::from("/var/log/app/a.log"),
                PathBuf::from("/var/log/app/b.log"),
            ],
            Path::new("/tmp/stage"),
        );
        let a = args(&cmd);
        assert_eq!(a[0], "-e");
        assert_eq!(a[1], "rsync");
        assert!(a.contains(&"--copy-links".to_string()));
        let shell = "ssh -p 2222 -o StrictHostKeyChecking=yes -o ConnectTimeout=15";
        assert!(a.contains(&shell.to_string()));
        assert_eq!(
            &a[a.len() - 3..],
            &[
                "ops@logs.example.com:/var/log/app/a.log".to_string(),
                "ops@logs.example.com:/var/log/app/b.log".to_string(),
                "/tmp/stage/".to_string(),
            ]
        );
    }

    #[test]
    fn test_ipv6_host_is_bracketed() {
        let mut t = transfer(HostKeyPolicy::Strict);
        t.endpoint.host = "::1".to_string();
        let cmd = t.build_command(
            &[PathBuf::from("/var/log/app/a.log")],
            Path::new("/tmp/stage"),
        );
        let a = args(&cmd);
        assert_eq!(a[a.len() - 2], "ops@[::1]:/var/log/app/a.log");
    }

    #[test]
    fn test_accept_new_policy_reaches_ssh() {
        let t = transfer(HostKeyPolicy::AcceptNew);
        assert!(t.remote_shell().contains("StrictHostKeyChecking=accept-new"));
    }

    #[test]
    fn test_empty_fetch_is_noop() {
        let t = transfer(HostKeyPolicy::Strict);
        assert!(t.fetch(&[], Path::new("/nonexistent")).is_ok());
    }

    #[test]
    fn test_missing_program_is_reported() {
        let mut t = transfer(HostKeyPolicy::Strict);
        t.settings.sshpass_program = "logcutter-no-such-program".to_string();
        let dir = tempfile::tempdir().unwrap();
        let err = t
            .fetch(&[PathBuf::from("/var/log/a.log")], dir.path())
            .unwrap_err();
        assert!(matches!(err, TransferError::ProgramMissing { .. }), "got {err}");
    }

    #[test]
    fn test_stderr_is_capped() {
        let long = vec![b'x'; constants::MAX_TRANSFER_STDERR_BYTES * 2];
        let text = truncate_stderr(&long);
        assert_eq!(text.len(), constants::MAX_TRANSFER_STDERR_BYTES + 3);
        assert_eq!(truncate_stderr(b"short"), "short");
    }
}
