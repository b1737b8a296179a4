// LogSlice - core/discovery.rs
//
// Recursive directory traversal and segment discovery.
//
// Architecture note: this module uses `walkdir` for directory traversal as an
// OS abstraction. It reads only directory entries, never file contents.
//
// Per-entry I/O errors are non-fatal and collected as warnings. Only an
// invalid root or an invalid name pattern fails the call.
//
// Ordering: segments are sorted by file name with digit runs compared as
// numbers, so `LogFile-9.log` sorts before `LogFile-10.log`. Ties (the same
// name in different subdirectories) fall back to the full path.

use crate::util::error::DiscoveryError;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a discovery operation.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Glob (filename-only) a file must match to be treated as a segment.
    pub segment_pattern: String,

    /// Maximum directory recursion depth.
    pub max_depth: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        use crate::util::constants;
        Self {
            segment_pattern: constants::DEFAULT_SEGMENT_PATTERN.to_string(),
            max_depth: constants::DEFAULT_MAX_DEPTH,
        }
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Find the segment files under `root`, in archive order.
///
/// Returns the ordered paths and a list of human-readable warnings for
/// entries that could not be read.
pub fn discover_segments(
    root: &Path,
    config: &DiscoveryConfig,
) -> Result<(Vec<PathBuf>, Vec<String>), DiscoveryError> {
    use crate::util::constants;

    // fs::metadata rather than Path::is_dir so PermissionDenied is not
    // reported as "does not exist".
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DiscoveryError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DiscoveryError::PermissionDenied {
                path: root.to_path_buf(),
                source: e,
            })
        }
        Err(_) => {
            return Err(DiscoveryError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let pattern = glob::Pattern::new(&config.segment_pattern).map_err(|source| {
        DiscoveryError::InvalidPattern {
            pattern: config.segment_pattern.clone(),
            source,
        }
    })?;
    let max_depth = config.max_depth.min(constants::ABSOLUTE_MAX_DEPTH);

    tracing::debug!(
        root = %root.display(),
        pattern = %config.segment_pattern,
        max_depth,
        "Segment discovery starting"
    );

    let mut segments: Vec<PathBuf> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let walker = walkdir::WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false);

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                let path_str = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                let msg = format!("Cannot access '{path_str}': {e}");
                tracing::warn!(warning = %msg, "Discovery warning");
                warnings.push(msg);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            warnings.push(format!(
                "Skipping '{}': non-UTF-8 filename",
                entry.path().display()
            ));
            continue;
        };

        if !pattern.matches(file_name) {
            tracing::trace!(file = file_name, "Not matched by segment pattern");
            continue;
        }

        segments.push(entry.into_path());
    }

    segments.sort_by(|a, b| compare_segment_paths(a, b));

    tracing::debug!(
        segments = segments.len(),
        warnings = warnings.len(),
        "Segment discovery complete"
    );

    Ok((segments, warnings))
}

/// Archive order: natural order of file names, then full path.
fn compare_segment_paths(a: &Path, b: &Path) -> Ordering {
    let name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    natural_cmp(&name(a), &name(b)).then_with(|| a.cmp(b))
}

/// Compare strings with runs of ASCII digits ordered by numeric value.
///
/// Leading zeros do not change the value; when two runs are numerically
/// equal the shorter one sorts first so the order stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let start_a = i;
            let start_b = j;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let run_a = trim_zeros(&a[start_a..i]);
            let run_b = trim_zeros(&b[start_b..j]);
            let ord = run_a
                .len()
                .cmp(&run_b.len())
                .then_with(|| run_a.cmp(run_b))
                .then_with(|| (i - start_a).cmp(&(j - start_b)));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                other => return other,
            }
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    let first_nonzero = digits
        .iter()
        .position(|&d| d != b'0')
        .unwrap_or(digits.len());
    &digits[first_nonzero..]
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_temp_tree() -> TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();

        fs::write(root.join("LogFile-10.log"), "c\n").expect("write 10");
        fs::write(root.join("LogFile-2.log"), "b\n").expect("write 2");
        fs::write(root.join("LogFile-1.log"), "a\n").expect("write 1");
        fs::write(root.join("notes.txt"), "not a segment\n").expect("write notes");
        fs::write(root.join("LogFile-3.log.gz"), "binary").expect("write gz");

        let sub = root.join("older");
        fs::create_dir(&sub).expect("mkdir older");
        fs::write(sub.join("LogFile-0.log"), "z\n").expect("write 0");

        dir
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_discovers_segments_in_natural_order() {
        let dir = make_temp_tree();
        let (segments, warnings) =
            discover_segments(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(
            names(&segments),
            vec![
                "LogFile-0.log",
                "LogFile-1.log",
                "LogFile-2.log",
                "LogFile-10.log"
            ]
        );
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_max_depth_1_excludes_subdirs() {
        let dir = make_temp_tree();
        let config = DiscoveryConfig {
            max_depth: 1,
            ..Default::default()
        };
        let (segments, _) = discover_segments(dir.path(), &config).unwrap();
        assert!(!names(&segments).contains(&"LogFile-0.log".to_string()));
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_custom_pattern() {
        let dir = make_temp_tree();
        let config = DiscoveryConfig {
            segment_pattern: "*.txt".to_string(),
            ..Default::default()
        };
        let (segments, _) = discover_segments(dir.path(), &config).unwrap();
        assert_eq!(names(&segments), vec!["notes.txt"]);
    }

    #[test]
    fn test_empty_directory_yields_no_segments() {
        let dir = tempfile::tempdir().unwrap();
        let (segments, _) = discover_segments(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let config = DiscoveryConfig {
            segment_pattern: "LogFile-[.log".to_string(),
            ..Default::default()
        };
        let result = discover_segments(dir.path(), &config);
        assert!(matches!(result, Err(DiscoveryError::InvalidPattern { .. })));
    }

    #[test]
    fn test_root_not_found() {
        let result = discover_segments(
            Path::new("/nonexistent/path/logslice"),
            &DiscoveryConfig::default(),
        );
        assert!(matches!(result, Err(DiscoveryError::RootNotFound { .. })));
    }

    #[test]
    fn test_root_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("LogFile-1.log");
        fs::write(&file, "content").unwrap();
        let result = discover_segments(&file, &DiscoveryConfig::default());
        assert!(matches!(result, Err(DiscoveryError::NotADirectory { .. })));
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("LogFile-9.log", "LogFile-10.log"), Ordering::Less);
        assert_eq!(natural_cmp("LogFile-010.log", "LogFile-9.log"), Ordering::Greater);
        assert_eq!(natural_cmp("LogFile-01.log", "LogFile-1.log"), Ordering::Greater);
        assert_eq!(natural_cmp("a", "a"), Ordering::Equal);
        assert_eq!(natural_cmp("abc", "abd"), Ordering::Less);
        assert_eq!(natural_cmp("log", "log1"), Ordering::Less);
    }
}
