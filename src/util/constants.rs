// LogSlice - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogSlice";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogSlice";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Discovery
// =============================================================================

/// Glob (filename-only) that a file must match to be treated as a segment.
pub const DEFAULT_SEGMENT_PATTERN: &str = "LogFile-*.log";

/// Maximum directory recursion depth during segment discovery.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Hard upper bound on max depth (prevents runaway traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 50;

// =============================================================================
// Segment I/O
// =============================================================================

/// Chunk size used when seeking backwards from EOF to find the last line.
pub const EDGE_READ_CHUNK: u64 = 8 * 1024; // 8 KB

/// Segments at or above this size are memory-mapped instead of read into a
/// heap buffer.
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100 MB

/// Smallest accepted large-file threshold.
pub const MIN_LARGE_FILE_THRESHOLD: u64 = 4 * 1024; // 4 KB

/// Buffer size for writing output segments.
pub const WRITE_BUFFER_SIZE: usize = 256 * 1024; // 256 KB

// =============================================================================
// Concurrency
// =============================================================================

/// Default number of worker threads for probes and writes.
/// 0 means auto-detect (use available CPU cores).
pub const DEFAULT_WORKER_THREADS: usize = 0;

/// Hard upper bound on the worker pool size.
pub const MAX_WORKER_THREADS: usize = 256;

/// Longest accepted `--timeout-secs` value (24 h).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

// =============================================================================
// Output
// =============================================================================

/// Prefix of the output directory name.
pub const OUTPUT_DIR_PREFIX: &str = "OutputLogs-";

/// chrono format for the UTC instant embedded in the output directory name.
/// Colons are replaced by dashes so the name is valid on every platform.
pub const OUTPUT_DIR_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%3fZ";

/// Suffix of the hidden staging directory used for staged output.
pub const STAGING_DIR_SUFFIX: &str = ".partial";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a raw timestamp field echoed back in errors and logs.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
