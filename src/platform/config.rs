// LogCutter - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance. The SSH password is never read from here.

use crate::platform::ssh::HostKeyPolicy;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for LogCutter configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logcutter/ or %APPDATA%\LogCutter\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub cut: CutSection,
    pub discovery: DiscoverySection,
    pub remote: RemoteSection,
    pub logging: LoggingSection,
}

/// `[cut]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct CutSection {
    /// Directory receiving the cut files.
    pub destination: Option<String>,
    /// Window size at which the range search turns linear.
    pub crossover_threshold: Option<usize>,
}

/// `[discovery]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Include glob patterns applied to local directory children.
    pub include_patterns: Option<Vec<String>>,
}

/// `[remote]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    /// Suffix a remote directory child must carry to be fetched.
    pub log_suffix: Option<String>,
    /// "strict" or "accept-new".
    pub host_key_policy: Option<String>,
    /// Parent directory for per-run staging directories.
    pub staging_dir: Option<String>,
    pub rsync_program: Option<String>,
    pub sshpass_program: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated `[remote]` settings.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub log_suffix: String,
    pub host_key_policy: HostKeyPolicy,
    pub staging_dir: Option<PathBuf>,
    pub rsync_program: String,
    pub sshpass_program: String,
    pub connect_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: constants::DEFAULT_SSH_PORT,
            username: None,
            log_suffix: constants::DEFAULT_LOG_SUFFIX.to_string(),
            host_key_policy: HostKeyPolicy::default(),
            staging_dir: None,
            rsync_program: constants::DEFAULT_RSYNC_PROGRAM.to_string(),
            sshpass_program: constants::DEFAULT_SSHPASS_PROGRAM.to_string(),
            connect_timeout_secs: constants::DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub destination: Option<PathBuf>,
    pub crossover_threshold: usize,
    pub include_patterns: Vec<String>,
    pub remote: RemoteConfig,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            destination: None,
            crossover_threshold: constants::DEFAULT_CROSSOVER_THRESHOLD,
            include_patterns: Vec::new(),
            remote: RemoteConfig::default(),
            log_level: None,
            log_file: None,
        }
    }
}

/// Load and validate a config file.
///
/// A missing file at the default location is a first run: defaults, no
/// warnings. When `explicit` is set (the user named the file), a missing or
/// unparseable file is an error instead of a warning.
///
/// Tracing is usually not initialised yet when this runs (the log level
/// comes from the file), so problems are returned as warnings for the
/// caller to report.
pub fn load_config(
    config_path: &Path,
    explicit: bool,
) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let mut warnings: Vec<String> = Vec::new();

    if !explicit && !config_path.exists() {
        return Ok((AppConfig::default(), warnings));
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(source) if explicit => {
            return Err(ConfigError::Io {
                path: config_path.to_path_buf(),
                source,
            })
        }
        Err(e) => {
            warnings.push(format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            return Ok((AppConfig::default(), warnings));
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(source) if explicit => {
            return Err(ConfigError::TomlParse {
                path: config_path.to_path_buf(),
                source,
            })
        }
        Err(e) => {
            warnings.push(format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            return Ok((AppConfig::default(), warnings));
        }
    };

    let config = validate(raw, &mut warnings);
    Ok((config, warnings))
}

/// Out-of-range message in the standard config error wording.
fn out_of_range(field: &str, value: impl ToString, expected: String) -> String {
    ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    }
    .to_string()
}

/// Validate each field against named constants, accumulating all warnings.
fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Cut --
    if let Some(dest) = raw.cut.destination.filter(|d| !d.trim().is_empty()) {
        config.destination = Some(PathBuf::from(dest));
    }

    if let Some(threshold) = raw.cut.crossover_threshold {
        if (constants::MIN_CROSSOVER_THRESHOLD..=constants::MAX_CROSSOVER_THRESHOLD)
            .contains(&threshold)
        {
            config.crossover_threshold = threshold;
        } else {
            warnings.push(out_of_range(
                "cut.crossover_threshold",
                threshold,
                format!(
                    "{}-{}; using default ({})",
                    constants::MIN_CROSSOVER_THRESHOLD,
                    constants::MAX_CROSSOVER_THRESHOLD,
                    constants::DEFAULT_CROSSOVER_THRESHOLD,
                ),
            ));
        }
    }

    // -- Discovery --
    if let Some(patterns) = raw.discovery.include_patterns {
        for p in &patterns {
            if let Err(e) = glob::Pattern::new(p) {
                warnings.push(format!(
                    "[discovery] include pattern \"{p}\" is invalid ({e}); it will be ignored."
                ));
            }
        }
        config.include_patterns = patterns;
    }

    // -- Remote --
    let remote = raw.remote;
    config.remote.host = remote.host.filter(|h| !h.trim().is_empty());
    config.remote.username = remote.username.filter(|u| !u.trim().is_empty());

    if let Some(port) = remote.port {
        if port == 0 {
            warnings.push(out_of_range(
                "remote.port",
                port,
                format!("1-65535; using default ({})", constants::DEFAULT_SSH_PORT),
            ));
        } else {
            config.remote.port = port;
        }
    }

    if let Some(suffix) = remote.log_suffix {
        config.remote.log_suffix = suffix;
    }

    if let Some(ref policy) = remote.host_key_policy {
        match HostKeyPolicy::parse(policy) {
            Some(p) => config.remote.host_key_policy = p,
            None => warnings.push(format!(
                "[remote] host_key_policy = \"{policy}\" is not recognised. \
                 Expected \"strict\" or \"accept-new\". Using default (strict)."
            )),
        }
    }

    if let Some(dir) = remote.staging_dir.filter(|d| !d.trim().is_empty()) {
        config.remote.staging_dir = Some(PathBuf::from(dir));
    }
    if let Some(program) = remote.rsync_program.filter(|p| !p.trim().is_empty()) {
        config.remote.rsync_program = program;
    }
    if let Some(program) = remote.sshpass_program.filter(|p| !p.trim().is_empty()) {
        config.remote.sshpass_program = program;
    }

    if let Some(secs) = remote.connect_timeout_secs {
        if (constants::MIN_CONNECT_TIMEOUT_SECS..=constants::MAX_CONNECT_TIMEOUT_SECS)
            .contains(&secs)
        {
            config.remote.connect_timeout_secs = secs;
        } else {
            warnings.push(out_of_range(
                "remote.connect_timeout_secs",
                secs,
                format!(
                    "{}-{}; using default ({})",
                    constants::MIN_CONNECT_TIMEOUT_SECS,
                    constants::MAX_CONNECT_TIMEOUT_SECS,
                    constants::DEFAULT_CONNECT_TIMEOUT_SECS,
                ),
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    // -- Logging: file --
    if let Some(file) = raw.logging.file.filter(|f| !f.is_empty()) {
        config.log_file = Some(PathBuf::from(file));
    }

    config
}
