// LogSlice - core/boundary.rs
//
// Line boundary search inside one sorted segment.
//
// Binary search for a line whose timestamp equals the target, then walk to
// the edge of the run of equal timestamps. Only the probed lines are parsed,
// so a search costs O(log n) parses plus the length of the run it lands in.
//
// Contract:
//   Lower -> smallest i with ts(i) >= target, or len when every line is earlier
//   Upper -> largest  i with ts(i) <= target, or -1  when every line is later

use crate::core::model::Boundary;
use crate::core::timestamp;
use crate::util::error::ExtractError;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::ops::Range;
use std::path::Path;

/// Locate the line index that starts (`Lower`) or ends (`Upper`) a range at
/// `target`.
///
/// `lines` must be sorted by leading timestamp. `file` is used for error
/// context only. A probed line whose timestamp cannot be parsed aborts the
/// search with `ExtractError::Parse`.
pub fn locate_line(
    lines: &[&str],
    target: &DateTime<Utc>,
    boundary: Boundary,
    file: &Path,
) -> Result<isize, ExtractError> {
    if lines.is_empty() {
        return Ok(match boundary {
            Boundary::Lower => 0,
            Boundary::Upper => -1,
        });
    }

    let len = lines.len() as isize;
    let ts = |index: isize| -> Result<DateTime<Utc>, ExtractError> {
        let i = index as usize;
        timestamp::line_instant(lines[i])
            .map_err(|e| ExtractError::parse(file, Some(i as u64 + 1), e))
    };

    let mut begin: isize = 0;
    let mut end: isize = len - 1;

    while begin <= end {
        let mid = begin + (end - begin) / 2;
        match timestamp::compare(target, &ts(mid)?) {
            Ordering::Equal => return edge_of_run(mid, len, target, boundary, &ts),
            Ordering::Less => end = mid - 1,
            Ordering::Greater => begin = mid + 1,
        }
    }

    // No exact match; `begin == end + 1` is the insertion point. The
    // candidate checks only fire on unsorted input.
    match boundary {
        Boundary::Lower => {
            if end >= 0 && ts(end)? >= *target {
                Ok(end)
            } else {
                Ok(end + 1)
            }
        }
        Boundary::Upper => {
            if begin < len && ts(begin)? <= *target {
                Ok(begin)
            } else {
                Ok(begin - 1)
            }
        }
    }
}

/// Walk from an exact match to the first (`Lower`) or last (`Upper`) line of
/// its run.
fn edge_of_run<F>(
    mid: isize,
    len: isize,
    target: &DateTime<Utc>,
    boundary: Boundary,
    ts: &F,
) -> Result<isize, ExtractError>
where
    F: Fn(isize) -> Result<DateTime<Utc>, ExtractError>,
{
    let mut index = mid;
    match boundary {
        Boundary::Lower => {
            while index > 0 && ts(index - 1)? == *target {
                index -= 1;
            }
        }
        Boundary::Upper => {
            while index + 1 < len && ts(index + 1)? == *target {
                index += 1;
            }
        }
    }
    Ok(index)
}

/// Turn a `(Lower, Upper)` pair into a half-open range over `len` lines.
///
/// The result is clamped to `0..len` and is empty when `upper < lower`.
pub fn slice_bounds(len: usize, lower: isize, upper: isize) -> Range<usize> {
    let len_i = len as isize;
    let start = lower.clamp(0, len_i) as usize;
    let end = (upper + 1).clamp(0, len_i) as usize;
    start..end.max(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Seconds past 2020-08-22T21:40:00Z as a segment line.
    fn line(sec: u32) -> String {
        format!("2020-08-22T21:40:{sec:02}.000Z,payload-{sec}")
    }

    fn target(sec: u32) -> DateTime<Utc> {
        timestamp::parse_instant(&format!("2020-08-22T21:40:{sec:02}.000Z")).unwrap()
    }

    fn segment(secs: &[u32]) -> Vec<String> {
        secs.iter().map(|s| line(*s)).collect()
    }

    fn locate(owned: &[String], sec: u32, boundary: Boundary) -> isize {
        let lines: Vec<&str> = owned.iter().map(String::as_str).collect();
        locate_line(&lines, &target(sec), boundary, &PathBuf::from("seg.log")).unwrap()
    }

    #[test]
    fn test_exact_match_unique() {
        let seg = segment(&[10, 11, 12, 13, 14]);
        assert_eq!(locate(&seg, 12, Boundary::Lower), 2);
        assert_eq!(locate(&seg, 12, Boundary::Upper), 2);
        assert_eq!(locate(&seg, 10, Boundary::Lower), 0);
        assert_eq!(locate(&seg, 14, Boundary::Upper), 4);
    }

    #[test]
    fn test_run_resolves_to_run_edges() {
        let seg = segment(&[10, 11, 12, 12, 12, 12, 13]);
        assert_eq!(locate(&seg, 12, Boundary::Lower), 2);
        assert_eq!(locate(&seg, 12, Boundary::Upper), 5);
    }

    #[test]
    fn test_run_edges_independent_of_probe_position() {
        // Slide a run of 12s through every position so the first probe lands
        // at the start, middle and end of it.
        for before in 0..6u32 {
            for run in 1..6usize {
                let mut secs: Vec<u32> = (0..before).collect();
                secs.extend(std::iter::repeat(12).take(run));
                secs.extend([20, 21]);
                let seg = segment(&secs);
                let first = before as isize;
                let last = first + run as isize - 1;
                assert_eq!(locate(&seg, 12, Boundary::Lower), first, "{secs:?}");
                assert_eq!(locate(&seg, 12, Boundary::Upper), last, "{secs:?}");
            }
        }
    }

    #[test]
    fn test_whole_segment_is_one_run() {
        let seg = segment(&[30; 9]);
        assert_eq!(locate(&seg, 30, Boundary::Lower), 0);
        assert_eq!(locate(&seg, 30, Boundary::Upper), 8);
    }

    #[test]
    fn test_no_match_between_lines() {
        let seg = segment(&[10, 12, 14, 16]);
        assert_eq!(locate(&seg, 13, Boundary::Lower), 2);
        assert_eq!(locate(&seg, 13, Boundary::Upper), 1);
    }

    #[test]
    fn test_target_outside_segment() {
        let seg = segment(&[10, 12, 14]);
        assert_eq!(locate(&seg, 5, Boundary::Lower), 0);
        assert_eq!(locate(&seg, 5, Boundary::Upper), -1);
        assert_eq!(locate(&seg, 20, Boundary::Lower), 3);
        assert_eq!(locate(&seg, 20, Boundary::Upper), 2);
    }

    #[test]
    fn test_empty_segment() {
        let seg: Vec<String> = Vec::new();
        assert_eq!(locate(&seg, 5, Boundary::Lower), 0);
        assert_eq!(locate(&seg, 5, Boundary::Upper), -1);
    }

    #[test]
    fn test_matches_linear_scan_for_every_target() {
        let secs = [1, 3, 3, 3, 4, 7, 7, 8, 9, 9, 9, 9, 12, 15, 15];
        let seg = segment(&secs);
        for t in 0..17u32 {
            let lower = secs
                .iter()
                .position(|&s| s >= t)
                .map_or(secs.len() as isize, |i| i as isize);
            let upper = secs
                .iter()
                .rposition(|&s| s <= t)
                .map_or(-1, |i| i as isize);
            assert_eq!(locate(&seg, t, Boundary::Lower), lower, "lower t={t}");
            assert_eq!(locate(&seg, t, Boundary::Upper), upper, "upper t={t}");
        }
    }

    #[test]
    fn test_unparseable_probe_reports_line_number() {
        let owned = vec![line(10), "garbage,payload".to_string(), line(12)];
        let lines: Vec<&str> = owned.iter().map(String::as_str).collect();
        let err = locate_line(
            &lines,
            &target(11),
            Boundary::Lower,
            &PathBuf::from("seg.log"),
        )
        .unwrap_err();
        match err {
            ExtractError::Parse {
                line_number,
                raw_timestamp,
                ..
            } => {
                assert_eq!(line_number, Some(2));
                assert_eq!(raw_timestamp, "garbage");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_slice_bounds() {
        assert_eq!(slice_bounds(5, 1, 3), 1..4);
        assert_eq!(slice_bounds(5, 0, -1), 0..0);
        assert_eq!(slice_bounds(5, 5, 4), 5..5);
        assert_eq!(slice_bounds(5, 3, 1), 3..3);
        assert_eq!(slice_bounds(5, -2, 9), 0..5);
    }
}
