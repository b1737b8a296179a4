// LogSlice - core/membership.rs
//
// Segment membership: whether an instant can lie inside a segment, judged
// from the segment's first and last record only. Also classifies instants
// that no segment contains, and checks that the segments containing an
// instant form one contiguous run.

use crate::core::model::{SegmentMiss, TimeSpan};
use chrono::{DateTime, Utc};

/// True iff `low <= target <= high`.
pub fn contains(low: &DateTime<Utc>, high: &DateTime<Utc>, target: &DateTime<Utc>) -> bool {
    low <= target && target <= high
}

impl TimeSpan {
    pub fn contains(&self, target: &DateTime<Utc>) -> bool {
        contains(&self.low, &self.high, target)
    }
}

/// Place `target` relative to an archive none of whose segments contain it.
///
/// `spans[i]` is `None` for an empty segment. Only non-empty segments take
/// part; a gap is reported between the latest-ending segment that ends
/// before `target` and the earliest-starting segment that starts after it.
pub fn classify_miss(spans: &[Option<TimeSpan>], target: &DateTime<Utc>) -> SegmentMiss {
    let mut earlier: Option<(usize, DateTime<Utc>)> = None;
    let mut later: Option<(usize, DateTime<Utc>)> = None;

    for (index, span) in spans.iter().enumerate() {
        let Some(span) = span else { continue };
        if span.high < *target && earlier.map_or(true, |(_, high)| span.high > high) {
            earlier = Some((index, span.high));
        }
        if span.low > *target && later.map_or(true, |(_, low)| span.low < low) {
            later = Some((index, span.low));
        }
    }

    match (earlier, later) {
        (None, None) => SegmentMiss::NoRecords,
        (None, Some(_)) => SegmentMiss::BeforeArchive,
        (Some(_), None) => SegmentMiss::AfterArchive,
        (Some((earlier, _)), Some((later, _))) => SegmentMiss::Gap { earlier, later },
    }
}

/// A break in the run of segments containing an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBreak {
    /// First matching index.
    pub first: usize,
    /// First non-empty, non-matching index after `first`.
    pub gap: usize,
    /// A matching index after `gap`.
    pub resumed: usize,
}

/// Check that the segments whose span contains `target` are contiguous.
///
/// In a chronologically ordered archive they always are; a break means the
/// segments are out of order and no single answer is trustworthy. Empty
/// segments hold no records and never break a run.
pub fn find_run_break(spans: &[Option<TimeSpan>], target: &DateTime<Utc>) -> Option<RunBreak> {
    let matches = |i: usize| spans[i].is_some_and(|s| s.contains(target));
    let excludes = |i: usize| spans[i].is_some_and(|s| !s.contains(target));

    let first = (0..spans.len()).find(|&i| matches(i))?;
    let gap = (first + 1..spans.len()).find(|&i| excludes(i))?;
    let resumed = (gap + 1..spans.len()).find(|&i| matches(i))?;

    Some(RunBreak {
        first,
        gap,
        resumed,
    })
}
