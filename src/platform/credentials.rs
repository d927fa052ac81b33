// LogCutter - platform/credentials.rs
//
// SSH credential handle. The password is held in a wrapper whose Debug
// output is redacted, so it cannot leak through `?` logging of a struct.
// It is handed to child processes only through the environment.

use crate::util::constants;
use crate::util::error::{LogCutterError, Result};
use std::fmt;
use std::path::PathBuf;

/// A password that never prints itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret. Call sites must not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Username and password for one remote host.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Password,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Password) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Obtain the password for `username@host`.
///
/// `LOGCUTTER_SSH_PASSWORD` wins when set and non-empty; otherwise the user is
/// prompted on the terminal with echo disabled.
pub fn password_from_env_or_prompt(username: &str, host: &str) -> Result<Password> {
    if let Ok(value) = std::env::var(constants::PASSWORD_ENV_VAR) {
        if !value.is_empty() {
            tracing::debug!(
                var = constants::PASSWORD_ENV_VAR,
                "Using SSH password from environment"
            );
            return Ok(Password::new(value));
        }
    }

    let value = dialoguer::Password::new()
        .with_prompt(format!("Password for {username}@{host}"))
        .allow_empty_password(true)
        .interact()
        .map_err(|e| LogCutterError::Io {
            path: PathBuf::from("<terminal>"),
            operation: "password prompt",
            source: std::io::Error::other(e.to_string()),
        })?;
    Ok(Password::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_is_redacted() {
        let creds = Credentials::new("ops", Password::new("hunter2"));
        let shown = format!("{creds:?}");
        assert!(!shown.contains("hunter2"), "got {shown}");
        assert!(shown.contains("ops"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn test_expose_returns_secret() {
        let p = Password::new("s3cret");
        assert_eq!(p.expose(), "s3cret");
        assert!(!p.is_empty());
        assert!(Password::new("").is_empty());
    }
}
