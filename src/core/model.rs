// LogSlice - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::error::ExtractError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Archive and range
// =============================================================================

/// An ordered, non-empty list of segment files.
///
/// Segment `i` must hold records no later than segment `i + 1`, and each
/// segment must be internally sorted. Neither property is verified here;
/// the locators fail loudly on the violations they can observe.
#[derive(Debug, Clone)]
pub struct Archive {
    segments: Vec<PathBuf>,
}

impl Archive {
    /// Build an archive from segment paths in chronological order.
    pub fn new(segments: Vec<PathBuf>) -> Result<Self, ExtractError> {
        if segments.is_empty() {
            return Err(ExtractError::EmptyArchive);
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathBuf] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> &Path {
        &self.segments[index]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a constructed archive.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// The requested extraction window, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl ExtractionRange {
    /// Returns `InvertedRange` when `from` is later than `to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, ExtractError> {
        if from > to {
            return Err(ExtractError::InvertedRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }
}

/// First and last record instants of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub low: DateTime<Utc>,
    pub high: DateTime<Utc>,
}

// =============================================================================
// Locating
// =============================================================================

/// Which end of a range a line search is locating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The first line at or after the target.
    Lower,
    /// The last line at or before the target.
    Upper,
}

/// Result of searching an archive for the segment holding an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMatch {
    /// Index of the segment whose span contains the instant.
    Found(usize),
    /// No segment's span contains the instant.
    Missed(SegmentMiss),
}

/// Where an instant falls relative to an archive that does not contain it.
///
/// Indices refer to the same archive ordering as the search that produced
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMiss {
    /// Earlier than every record in the archive.
    BeforeArchive,
    /// Later than every record in the archive.
    AfterArchive,
    /// Between two segments: `earlier` ends before the instant and `later`
    /// starts after it.
    Gap { earlier: usize, later: usize },
    /// Every segment is empty.
    NoRecords,
}

// =============================================================================
// Planning
// =============================================================================

/// How the requested range overlaps the archive's coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapCase {
    /// Range starts and ends in different segments.
    Distinct,
    /// Range starts and ends in the same segment.
    Single,
    /// Range starts before the archive; start is clamped to segment 0.
    StartClamped,
    /// Range ends after the archive; end is clamped to the last segment.
    EndClamped,
    /// Range starts before and ends after the archive.
    Enclosing,
    /// Range holds no record of the archive.
    Disjoint,
}

impl OverlapCase {
    pub fn label(&self) -> &'static str {
        match self {
            OverlapCase::Distinct => "distinct segments",
            OverlapCase::Single => "single segment",
            OverlapCase::StartClamped => "start clamped to archive",
            OverlapCase::EndClamped => "end clamped to archive",
            OverlapCase::Enclosing => "range encloses archive",
            OverlapCase::Disjoint => "range outside archive",
        }
    }
}

impl std::fmt::Display for OverlapCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What to keep from one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentCut {
    /// Every line, byte for byte.
    Whole,
    /// From the first line at or after the instant to the end.
    From(DateTime<Utc>),
    /// From the beginning to the last line at or before the instant.
    Until(DateTime<Utc>),
    /// Lines between the two instants, inclusive.
    Between(DateTime<Utc>, DateTime<Utc>),
}

/// One segment selected for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSegment {
    pub index: usize,
    pub cut: SegmentCut,
}

/// The segments to write for one extraction, in archive order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPlan {
    pub case: OverlapCase,
    pub segments: Vec<PlannedSegment>,
}

// =============================================================================
// Progress and results
// =============================================================================

/// Progress events emitted during an extraction.
#[derive(Debug, Clone)]
pub enum ExtractProgress {
    /// Both range ends were located and the plan is known.
    Planned {
        case: OverlapCase,
        segments: usize,
    },

    /// The output directory was created.
    OutputCreated { path: PathBuf },

    /// The first segment of the output (in archive order) is complete.
    FirstSegmentReady { elapsed: Duration },

    /// One output segment is complete.
    SegmentWritten {
        name: String,
        completed: usize,
        total: usize,
    },
}

/// What was written for one segment.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentReport {
    /// Source segment path.
    pub source: PathBuf,
    /// File name shared by source and output.
    pub name: String,
    /// Lines written; `None` when the segment was copied byte for byte.
    pub lines: Option<usize>,
    /// Bytes written.
    pub bytes: u64,
}

/// Summary of a completed extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub output_dir: PathBuf,
    pub case: OverlapCase,
    pub segments: Vec<SegmentReport>,
    #[serde(rename = "first_segment_ms", serialize_with = "serialize_millis")]
    pub first_segment_elapsed: Option<Duration>,
    #[serde(rename = "total_ms", serialize_with = "serialize_millis")]
    pub total_elapsed: Option<Duration>,
}

fn serialize_millis<S: serde::Serializer>(
    value: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
        None => serializer.serialize_none(),
    }
}

/// Final result of an extraction that did not fail.
#[derive(Debug, Clone)]
pub enum ExtractOutcome {
    /// Output was written.
    Written(ExtractionReport),
    /// The range encloses the archive and the caller declined the full copy.
    Declined,
    /// The range contains no record of the archive; nothing was written.
    NoOverlap,
}
