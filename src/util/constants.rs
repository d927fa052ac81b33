// LogCutter - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogCutter";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogCutter";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Range search
// =============================================================================

/// Remaining-window size (in lines) at or below which the range locator
/// stops binary probing and scans linearly.
///
/// Timestamps may be absent from a large share of lines (stack traces,
/// continuation lines), so probing inside a narrow window is unreliable.
pub const DEFAULT_CROSSOVER_THRESHOLD: usize = 900;

/// Smallest accepted crossover threshold. Zero would turn the search into a
/// pure binary search, which is unsound on sparsely timestamped files.
pub const MIN_CROSSOVER_THRESHOLD: usize = 1;

/// Largest accepted crossover threshold.
pub const MAX_CROSSOVER_THRESHOLD: usize = 1_000_000;

// =============================================================================
// Window defaults
// =============================================================================

/// Length of the default window (ending now) when no `from` is supplied.
pub const DEFAULT_WINDOW_HOURS: i64 = 3;

// =============================================================================
// Remote
// =============================================================================

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// File-name suffix a remote directory child must carry to be fetched.
pub const DEFAULT_LOG_SUFFIX: &str = ".log";

/// TCP connect / SSH operation timeout.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Bounds for the configurable connect timeout.
pub const MIN_CONNECT_TIMEOUT_SECS: u64 = 1;
pub const MAX_CONNECT_TIMEOUT_SECS: u64 = 300;

/// Bulk-copy program invoked for transfers.
pub const DEFAULT_RSYNC_PROGRAM: &str = "rsync";

/// Helper that feeds the password to ssh from the `SSHPASS` environment
/// variable (`sshpass -e`), keeping it out of argument lists.
pub const DEFAULT_SSHPASS_PROGRAM: &str = "sshpass";

/// Environment variable read for the SSH password.
pub const PASSWORD_ENV_VAR: &str = "LOGCUTTER_SSH_PASSWORD";

/// Prefix of the per-run staging directory name.
pub const STAGING_DIR_PREFIX: &str = "logcutter-staging";

/// Maximum number of bytes of rsync stderr kept in a transfer error.
pub const MAX_TRANSFER_STDERR_BYTES: usize = 4 * 1024;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
