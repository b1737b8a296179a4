// LogSlice - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; every variant names the file, line or
// limit it refers to so failures are actionable from the message alone.

use chrono::{DateTime, Utc};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogSlice operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogSliceError {
    /// Segment discovery failed.
    Discovery(DiscoveryError),

    /// Extraction failed.
    Extract(ExtractError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for LogSliceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Extract(e) => write!(f, "Extraction error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for LogSliceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Discovery(e) => Some(e),
            Self::Extract(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamp errors
// ---------------------------------------------------------------------------

/// Errors produced by the timestamp codec.
///
/// Carries no file context; callers that parse segment lines wrap this into
/// `ExtractError::Parse` with the file and line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The timestamp field was empty (blank line or leading comma).
    Empty,

    /// The text is not a recognised instant.
    Invalid { raw: String },
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty timestamp field"),
            Self::Invalid { raw } => write!(f, "cannot parse '{raw}' as a timestamp"),
        }
    }
}

impl std::error::Error for TimestampError {}

// ---------------------------------------------------------------------------
// Extraction errors
// ---------------------------------------------------------------------------

/// Errors related to locating and writing an extraction.
#[derive(Debug)]
pub enum ExtractError {
    /// No segments were supplied.
    EmptyArchive,

    /// The range start is later than the range end.
    InvertedRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    /// A segment line carries a timestamp that cannot be parsed. Ordering
    /// cannot be trusted past this point, so the extraction stops.
    /// `line_number` is 1-based; `None` refers to the segment's last line,
    /// which is read from the end of the file without counting lines.
    Parse {
        file: PathBuf,
        line_number: Option<u64>,
        raw_timestamp: String,
    },

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },

    /// The segments containing `target` are not contiguous: segment `first`
    /// matches, segment `gap` does not, and a later segment `resumed` matches
    /// again. The archive is not chronologically ordered.
    NonContiguousMatch {
        target: DateTime<Utc>,
        first: usize,
        gap: usize,
        resumed: usize,
    },

    /// The range end was located in an earlier segment than the range start.
    SegmentsOutOfOrder { start: usize, end: usize },

    /// Two segments selected for output share a file name and would
    /// overwrite each other in the output directory.
    DuplicateSegmentName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A segment path has no usable file name.
    InvalidSegmentPath { path: PathBuf },

    /// The worker pool could not be created.
    ThreadPool(rayon::ThreadPoolBuildError),

    /// The caller cancelled the extraction.
    Cancelled,

    /// The extraction ran past its deadline.
    TimedOut { timeout_secs: u64 },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyArchive => write!(f, "the archive contains no log segments"),
            Self::InvertedRange { from, to } => write!(
                f,
                "range start {} is later than range end {}",
                from.to_rfc3339(),
                to.to_rfc3339()
            ),
            Self::Parse {
                file,
                line_number,
                raw_timestamp,
            } => match line_number {
                Some(n) => write!(
                    f,
                    "'{}' line {n}: cannot parse timestamp '{raw_timestamp}'",
                    file.display()
                ),
                None => write!(
                    f,
                    "'{}' last line: cannot parse timestamp '{raw_timestamp}'",
                    file.display()
                ),
            },
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
            Self::NonContiguousMatch {
                target,
                first,
                gap,
                resumed,
            } => write!(
                f,
                "segments containing {} are not contiguous (segment {first} matches, \
                 {gap} does not, {resumed} matches again); the archive is not in \
                 chronological order",
                target.to_rfc3339()
            ),
            Self::SegmentsOutOfOrder { start, end } => write!(
                f,
                "range end was located in segment {end}, before range start in segment \
                 {start}; the archive is not in chronological order"
            ),
            Self::DuplicateSegmentName {
                name,
                first,
                second,
            } => write!(
                f,
                "segments '{}' and '{}' share the file name '{name}' and cannot be \
                 written to the same output directory",
                first.display(),
                second.display()
            ),
            Self::InvalidSegmentPath { path } => {
                write!(f, "segment path '{}' has no file name", path.display())
            }
            Self::ThreadPool(e) => write!(f, "cannot start worker pool: {e}"),
            Self::Cancelled => write!(f, "extraction cancelled"),
            Self::TimedOut { timeout_secs } => {
                write!(f, "extraction exceeded its {timeout_secs} s time limit")
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::ThreadPool(source) => Some(source),
            _ => None,
        }
    }
}

impl From<ExtractError> for LogSliceError {
    fn from(e: ExtractError) -> Self {
        Self::Extract(e)
    }
}

impl ExtractError {
    /// Wrap an I/O error with the path and operation it occurred on.
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Wrap a codec error with the file and 1-based line number it came from.
    pub fn parse(
        file: impl Into<PathBuf>,
        line_number: Option<u64>,
        error: TimestampError,
    ) -> Self {
        let raw_timestamp = match error {
            TimestampError::Empty => String::new(),
            TimestampError::Invalid { raw } => raw,
        };
        Self::Parse {
            file: file.into(),
            line_number,
            raw_timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to segment discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The input directory does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// The input path is not a directory.
    NotADirectory { path: PathBuf },

    /// Permission denied accessing the input directory.
    PermissionDenied { path: PathBuf, source: io::Error },

    /// The segment name pattern is not a valid glob.
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "The given directory does not exist: '{}'", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Input path '{}' is not a directory", path.display())
            }
            Self::PermissionDenied { path, source } => {
                write!(
                    f,
                    "Permission denied accessing '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidPattern { pattern, source } => {
                write!(f, "Invalid segment pattern '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            Self::InvalidPattern { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for LogSliceError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
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

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
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
        }
    }
}

impl From<ConfigError> for LogSliceError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_parse_error_carries_raw_text() {
        let err = ExtractError::parse(
            "LogFile-1.log",
            Some(7),
            TimestampError::Invalid {
                raw: "not-a-date".to_string(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("LogFile-1.log"), "{msg}");
        assert!(msg.contains("line 7"), "{msg}");
        assert!(msg.contains("not-a-date"), "{msg}");
    }

    #[test]
    fn test_io_error_chain_preserved() {
        let err: LogSliceError = ExtractError::io(
            "out/LogFile-1.log",
            "write",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        )
        .into();
        let extract = err.source().expect("extract layer");
        let io_err = extract.source().expect("io layer");
        assert_eq!(io_err.to_string(), "denied");
    }
}
