// LogSlice - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for LogSlice configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logslice/ or %APPDATA%\LogSlice\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
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
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are ignored so a newer config file still loads.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[discovery]` section.
    pub discovery: DiscoverySection,
    /// `[extraction]` section.
    pub extraction: ExtractionSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[discovery]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Segment file name glob.
    pub segment_pattern: Option<String>,
    /// Maximum directory recursion depth.
    pub max_depth: Option<usize>,
}

/// `[extraction]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExtractionSection {
    /// Number of worker threads (0 = auto).
    pub worker_threads: Option<usize>,
    /// Segments at or above this size are memory-mapped.
    pub large_file_threshold_bytes: Option<u64>,
    /// Write into a staging directory and rename on success.
    pub staged: Option<bool>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Discovery --
    pub segment_pattern: String,
    pub max_depth: usize,

    // -- Extraction --
    pub worker_threads: usize,
    pub large_file_threshold: u64,
    pub staged: bool,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            segment_pattern: constants::DEFAULT_SEGMENT_PATTERN.to_string(),
            max_depth: constants::DEFAULT_MAX_DEPTH,
            worker_threads: constants::DEFAULT_WORKER_THREADS,
            large_file_threshold: constants::DEFAULT_LARGE_FILE_THRESHOLD,
            staged: false,
            log_level: None,
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// A missing file yields defaults with no warnings (first run); an unreadable
/// or unparseable one yields defaults with a warning.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let raw = match read_raw(&config_path) {
        Ok(raw) => raw,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    let config = validate(raw, &mut warnings);
    (config, warnings)
}

/// Load a config file named explicitly by the user.
///
/// Unlike `load_config`, a missing or unparseable file is an error. Values
/// out of range are still warnings with a fallback to the default.
pub fn load_config_file(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let raw = read_raw(path)?;
    tracing::info!(path = %path.display(), "Loaded config file");
    let mut warnings = Vec::new();
    let config = validate(raw, &mut warnings);
    Ok((config, warnings))
}

fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate each field against named constants, accumulating all warnings.
fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Discovery: segment_pattern --
    if let Some(pattern) = raw.discovery.segment_pattern {
        match glob::Pattern::new(&pattern) {
            Ok(_) if !pattern.is_empty() => config.segment_pattern = pattern,
            Ok(_) => warnings.push(format!(
                "[discovery] segment_pattern is empty. Using default (\"{}\").",
                constants::DEFAULT_SEGMENT_PATTERN,
            )),
            Err(e) => warnings.push(format!(
                "[discovery] segment_pattern = \"{pattern}\" is not a valid glob ({e}). \
                 Using default (\"{}\").",
                constants::DEFAULT_SEGMENT_PATTERN,
            )),
        }
    }

    // -- Discovery: max_depth --
    if let Some(depth) = raw.discovery.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            config.max_depth = depth;
        } else {
            warnings.push(format!(
                "[discovery] max_depth = {depth} is out of range (1-{}). Using default ({}).",
                constants::ABSOLUTE_MAX_DEPTH,
                constants::DEFAULT_MAX_DEPTH,
            ));
        }
    }

    // -- Extraction: worker_threads --
    if let Some(threads) = raw.extraction.worker_threads {
        if threads <= constants::MAX_WORKER_THREADS {
            config.worker_threads = threads;
        } else {
            warnings.push(format!(
                "[extraction] worker_threads = {threads} is out of range (0-{}). Using default ({}).",
                constants::MAX_WORKER_THREADS,
                constants::DEFAULT_WORKER_THREADS,
            ));
        }
    }

    // -- Extraction: large_file_threshold_bytes --
    if let Some(bytes) = raw.extraction.large_file_threshold_bytes {
        if bytes >= constants::MIN_LARGE_FILE_THRESHOLD {
            config.large_file_threshold = bytes;
        } else {
            warnings.push(format!(
                "[extraction] large_file_threshold_bytes = {bytes} is below the minimum ({}). \
                 Using default ({}).",
                constants::MIN_LARGE_FILE_THRESHOLD,
                constants::DEFAULT_LARGE_FILE_THRESHOLD,
            ));
        }
    }

    // -- Extraction: staged --
    if let Some(staged) = raw.extraction.staged {
        config.staged = staged;
    }

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        if LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    config
}
