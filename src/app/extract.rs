// LogSlice - app/extract.rs
//
// Extraction entry point: locate both range ends, plan, confirm, write.
//
// One worker pool is built per extraction and used for both phases:
//   1. concurrent edge probes for the range start and end
//   2. concurrent per-segment writes
// The confirmation prompt runs between the two on the calling thread.

use crate::app::assemble::{Assembler, ConfirmFullCopy};
use crate::app::context::{CancelToken, ExtractionTimer};
use crate::app::locator;
use crate::core::model::{
    Archive, ExtractOutcome, ExtractProgress, ExtractionPlan, ExtractionRange,
};
use crate::core::plan;
use crate::util::constants;
use crate::util::error::ExtractError;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// What to extract and where.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub archive: Archive,
    pub range: ExtractionRange,
    /// The output directory is created inside this directory.
    pub output_parent: PathBuf,
}

/// How to run an extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Worker pool size; 0 means one per core.
    pub worker_threads: usize,
    /// Segments at or above this size are memory-mapped.
    pub large_file_threshold: u64,
    /// Write into a staging directory and rename on success.
    pub staged: bool,
    /// Set to request cancellation from another thread.
    pub cancel_flag: Option<Arc<AtomicBool>>,
    pub timeout: Option<Duration>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            worker_threads: constants::DEFAULT_WORKER_THREADS,
            large_file_threshold: constants::DEFAULT_LARGE_FILE_THRESHOLD,
            staged: false,
            cancel_flag: None,
            timeout: None,
        }
    }
}

/// Run one extraction to completion.
///
/// `confirm` is consulted only when the range encloses the whole archive.
/// `progress` is called from worker threads.
pub fn run_extraction(
    request: &ExtractRequest,
    options: &ExtractOptions,
    confirm: &dyn ConfirmFullCopy,
    progress: &(dyn Fn(ExtractProgress) + Sync),
) -> Result<ExtractOutcome, ExtractError> {
    let now = Utc::now();
    let timer = ExtractionTimer::start();
    let cancel = CancelToken::new(options.cancel_flag.clone(), options.timeout);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.worker_threads)
        .thread_name(|i| format!("logslice-worker-{i}"))
        .build()
        .map_err(ExtractError::ThreadPool)?;

    let archive = &request.archive;
    let range = &request.range;
    tracing::info!(
        segments = archive.len(),
        from = %range.from().to_rfc3339(),
        to = %range.to().to_rfc3339(),
        workers = pool.current_num_threads(),
        "Extraction starting"
    );

    let plan = pool.install(|| -> Result<ExtractionPlan, ExtractError> {
        let start = locator::locate_segment(archive.segments(), &range.from(), &cancel)?;
        let end = locator::locate_last_segment(archive.segments(), &range.to(), &cancel)?;
        tracing::debug!(start = ?start, end = ?end, "Range ends located");
        plan::plan_extraction(archive.len(), &start, &end, range)
    })?;

    tracing::info!(
        case = %plan.case,
        segments = plan.segments.len(),
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Extraction planned"
    );
    progress(ExtractProgress::Planned {
        case: plan.case,
        segments: plan.segments.len(),
    });

    let assembler = Assembler {
        archive,
        output_parent: &request.output_parent,
        large_file_threshold: options.large_file_threshold,
        staged: options.staged,
        cancel: &cancel,
        timer: &timer,
        progress,
    };
    assembler.run(&pool, &plan, range, confirm, now)
}
