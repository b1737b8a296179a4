// LogSlice - app/locator.rs
//
// Archive locator: finds the segment holding an instant.
//
// Every segment's edge lines are probed concurrently on the current rayon
// pool. A matching probe lowers a shared `AtomicUsize` with `fetch_min`, so
// after the join the register holds the lowest matching index no matter
// which probe finished first. The collected spans are then used to check
// that the matches form one contiguous run and, when nothing matched, to
// place the instant relative to the archive.
//
// Callers run these functions inside `ThreadPool::install` to control the
// worker count; outside it they use rayon's global pool.

use crate::app::context::CancelToken;
use crate::core::membership;
use crate::core::model::{SegmentMatch, SegmentMiss, TimeSpan};
use crate::core::timestamp;
use crate::platform::fs;
use crate::util::error::ExtractError;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lowest-index segment whose span contains `target`.
pub fn locate_segment(
    segments: &[PathBuf],
    target: &DateTime<Utc>,
    cancel: &CancelToken,
) -> Result<SegmentMatch, ExtractError> {
    locate_lowest(segments, target, cancel)
}

/// Highest-index segment whose span contains `target`.
///
/// Runs the same search over the archive in reverse and maps the indices
/// back.
pub fn locate_last_segment(
    segments: &[PathBuf],
    target: &DateTime<Utc>,
    cancel: &CancelToken,
) -> Result<SegmentMatch, ExtractError> {
    let view: Vec<&PathBuf> = segments.iter().rev().collect();
    let last = segments.len().saturating_sub(1);
    let flip = |i: usize| last - i;

    match locate_lowest(&view, target, cancel) {
        Ok(SegmentMatch::Found(i)) => Ok(SegmentMatch::Found(flip(i))),
        Ok(SegmentMatch::Missed(SegmentMiss::Gap { earlier, later })) => {
            Ok(SegmentMatch::Missed(SegmentMiss::Gap {
                earlier: flip(earlier),
                later: flip(later),
            }))
        }
        Ok(other) => Ok(other),
        // Report the break in forward order.
        Err(ExtractError::NonContiguousMatch {
            target,
            first,
            gap,
            resumed,
        }) => Err(ExtractError::NonContiguousMatch {
            target,
            first: flip(resumed),
            gap: flip(gap),
            resumed: flip(first),
        }),
        Err(e) => Err(e),
    }
}

fn locate_lowest<P>(
    view: &[P],
    target: &DateTime<Utc>,
    cancel: &CancelToken,
) -> Result<SegmentMatch, ExtractError>
where
    P: AsRef<Path> + Sync,
{
    if view.is_empty() {
        return Err(ExtractError::EmptyArchive);
    }

    let lowest = AtomicUsize::new(usize::MAX);

    let spans: Vec<Option<TimeSpan>> = view
        .par_iter()
        .enumerate()
        .map(|(index, path)| -> Result<Option<TimeSpan>, ExtractError> {
            cancel.check()?;
            let span = probe_span(path.as_ref())?;
            if span.is_some_and(|s| s.contains(target)) {
                let previous = lowest.fetch_min(index, Ordering::AcqRel);
                tracing::trace!(
                    segment = %path.as_ref().display(),
                    index,
                    previous,
                    "Segment contains target"
                );
            }
            Ok(span)
        })
        .collect::<Result<_, _>>()?;

    if let Some(run_break) = membership::find_run_break(&spans, target) {
        tracing::error!(
            instant = %target.to_rfc3339(),
            first = run_break.first,
            gap = run_break.gap,
            resumed = run_break.resumed,
            "Matching segments are not contiguous"
        );
        return Err(ExtractError::NonContiguousMatch {
            target: *target,
            first: run_break.first,
            gap: run_break.gap,
            resumed: run_break.resumed,
        });
    }

    let found = lowest.load(Ordering::Acquire);
    if found != usize::MAX {
        tracing::debug!(
            instant = %target.to_rfc3339(),
            index = found,
            "Located segment"
        );
        return Ok(SegmentMatch::Found(found));
    }

    let miss = membership::classify_miss(&spans, target);
    tracing::debug!(instant = %target.to_rfc3339(), miss = ?miss, "No segment contains target");
    Ok(SegmentMatch::Missed(miss))
}

/// First and last record instants of a segment; `None` when it is empty.
pub fn probe_span(path: &Path) -> Result<Option<TimeSpan>, ExtractError> {
    let Some(edges) = fs::read_edge_lines(path)
        .map_err(|e| ExtractError::io(path, "read segment edges", e))?
    else {
        return Ok(None);
    };

    let low = timestamp::line_instant(&edges.first)
        .map_err(|e| ExtractError::parse(path, Some(1), e))?;
    let high =
        timestamp::line_instant(&edges.last).map_err(|e| ExtractError::parse(path, None, e))?;
    Ok(Some(TimeSpan { low, high }))
}
