// LogSlice - app/assemble.rs
//
// Output assembly: turns an extraction plan into an output directory.
//
// The confirmation gate and name checks run on the calling thread. Then the
// directory is created once and every planned segment is written by its own
// task on the worker pool. Output files are disjoint, so the only shared
// state is the completion counter and the first-segment timer.

use crate::app::context::{CancelToken, ExtractionTimer};
use crate::core::boundary;
use crate::core::model::{
    Archive, Boundary, ExtractOutcome, ExtractProgress, ExtractionPlan, ExtractionRange,
    ExtractionReport, OverlapCase, PlannedSegment, SegmentCut, SegmentReport,
};
use crate::platform::fs::{self, OutputDir, SegmentText};
use crate::util::error::ExtractError;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// Confirmation
// =============================================================================

/// What the user is asked to approve when the range encloses the archive.
#[derive(Debug, Clone, Copy)]
pub struct EnclosingRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub segment_count: usize,
}

/// Decides whether an enclosing range may copy the whole archive.
pub trait ConfirmFullCopy {
    fn confirm_full_copy(&self, range: &EnclosingRange) -> bool;
}

impl<F> ConfirmFullCopy for F
where
    F: Fn(&EnclosingRange) -> bool,
{
    fn confirm_full_copy(&self, range: &EnclosingRange) -> bool {
        self(range)
    }
}

// =============================================================================
// Assembler
// =============================================================================

/// Shared inputs for writing one extraction.
pub struct Assembler<'a> {
    pub archive: &'a Archive,
    pub output_parent: &'a Path,
    pub large_file_threshold: u64,
    pub staged: bool,
    pub cancel: &'a CancelToken,
    pub timer: &'a ExtractionTimer,
    pub progress: &'a (dyn Fn(ExtractProgress) + Sync),
}

impl Assembler<'_> {
    /// Execute `plan`. Writes run on `pool`.
    ///
    /// A disjoint plan and a declined full copy write nothing and are not
    /// errors. `now` names the output directory.
    pub fn run(
        &self,
        pool: &rayon::ThreadPool,
        plan: &ExtractionPlan,
        range: &ExtractionRange,
        confirm: &dyn ConfirmFullCopy,
        now: DateTime<Utc>,
    ) -> Result<ExtractOutcome, ExtractError> {
        match plan.case {
            OverlapCase::Disjoint => {
                tracing::info!(
                    from = %range.from().to_rfc3339(),
                    to = %range.to().to_rfc3339(),
                    "Range holds no records of the archive; nothing to write"
                );
                return Ok(ExtractOutcome::NoOverlap);
            }
            OverlapCase::Enclosing => {
                let request = EnclosingRange {
                    from: range.from(),
                    to: range.to(),
                    segment_count: self.archive.len(),
                };
                if !self.cancel.paused(|| confirm.confirm_full_copy(&request)) {
                    tracing::info!("Full archive copy declined");
                    return Ok(ExtractOutcome::Declined);
                }
                tracing::info!(segments = request.segment_count, "Full archive copy confirmed");
            }
            _ => {}
        }

        let names = self.output_names(plan)?;
        self.cancel.check()?;

        let output = OutputDir::create(self.output_parent, now, self.staged)
            .map_err(|e| ExtractError::io(self.output_parent, "create output directory", e))?;
        tracing::info!(
            path = %output.final_path().display(),
            staged = output.is_staged(),
            "Output directory created"
        );
        (self.progress)(ExtractProgress::OutputCreated {
            path: output.final_path().to_path_buf(),
        });

        let reports = pool.install(|| self.write_all(plan, &names, output.write_dir()))?;

        let output_dir = output.finalize().map_err(|e| {
            ExtractError::io(self.output_parent, "finalize staged output", e)
        })?;

        let report = ExtractionReport {
            output_dir,
            case: plan.case,
            segments: reports,
            first_segment_elapsed: self.timer.first_segment(),
            total_elapsed: Some(self.timer.elapsed()),
        };
        tracing::info!(
            case = %report.case,
            segments = report.segments.len(),
            elapsed_ms = self.timer.elapsed().as_millis() as u64,
            "Extraction complete"
        );
        Ok(ExtractOutcome::Written(report))
    }

    /// Output file name per planned segment, checked for collisions before
    /// anything is written.
    fn output_names(&self, plan: &ExtractionPlan) -> Result<Vec<String>, ExtractError> {
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut names = Vec::with_capacity(plan.segments.len());

        for planned in &plan.segments {
            let source = self.archive.segment(planned.index);
            let name = source
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| ExtractError::InvalidSegmentPath {
                    path: source.to_path_buf(),
                })?;
            if let Some(first) = seen.get(&name) {
                return Err(ExtractError::DuplicateSegmentName {
                    name,
                    first: first.clone(),
                    second: source.to_path_buf(),
                });
            }
            seen.insert(name.clone(), source.to_path_buf());
            names.push(name);
        }
        Ok(names)
    }

    fn write_all(
        &self,
        plan: &ExtractionPlan,
        names: &[String],
        dir: &Path,
    ) -> Result<Vec<SegmentReport>, ExtractError> {
        let total = plan.segments.len();
        let completed = AtomicUsize::new(0);

        plan.segments
            .par_iter()
            .zip(names.par_iter())
            .enumerate()
            .map(|(position, (planned, name))| -> Result<SegmentReport, ExtractError> {
                self.cancel.check()?;
                let report = self.write_segment(planned, name, dir)?;

                if position == 0 {
                    if let Some(elapsed) = self.timer.mark_first_segment() {
                        tracing::info!(
                            segment = %name,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "First output segment ready"
                        );
                        (self.progress)(ExtractProgress::FirstSegmentReady { elapsed });
                    }
                }

                let done = completed.fetch_add(1, Ordering::AcqRel) + 1;
                (self.progress)(ExtractProgress::SegmentWritten {
                    name: name.clone(),
                    completed: done,
                    total,
                });
                Ok(report)
            })
            .collect()
    }

    fn write_segment(
        &self,
        planned: &PlannedSegment,
        name: &str,
        dir: &Path,
    ) -> Result<SegmentReport, ExtractError> {
        let source = self.archive.segment(planned.index);
        let dest = dir.join(name);

        if planned.cut == SegmentCut::Whole {
            let bytes = fs::copy_segment(source, &dest)
                .map_err(|e| ExtractError::io(&dest, "copy segment", e))?;
            tracing::debug!(segment = name, bytes, "Copied whole segment");
            return Ok(SegmentReport {
                source: source.to_path_buf(),
                name: name.to_string(),
                lines: None,
                bytes,
            });
        }

        let text = SegmentText::load(source, self.large_file_threshold)
            .map_err(|e| ExtractError::io(source, "read segment", e))?;
        let lines = text.lines();
        let last = lines.len() as isize - 1;

        let lower = |at: &DateTime<Utc>| boundary::locate_line(&lines, at, Boundary::Lower, source);
        let upper = |at: &DateTime<Utc>| boundary::locate_line(&lines, at, Boundary::Upper, source);
        let (lo, hi) = match planned.cut {
            SegmentCut::From(from) => (lower(&from)?, last),
            SegmentCut::Until(to) => (0, upper(&to)?),
            SegmentCut::Between(from, to) => (lower(&from)?, upper(&to)?),
            SegmentCut::Whole => (0, last),
        };
        let keep = &lines[boundary::slice_bounds(lines.len(), lo, hi)];

        let bytes = fs::write_lines(&dest, keep)
            .map_err(|e| ExtractError::io(&dest, "write segment", e))?;
        tracing::debug!(
            segment = name,
            lines = keep.len(),
            of = lines.len(),
            mapped = text.is_mapped(),
            "Wrote cut segment"
        );
        Ok(SegmentReport {
            source: source.to_path_buf(),
            name: name.to_string(),
            lines: Some(keep.len()),
            bytes,
        })
    }
}
