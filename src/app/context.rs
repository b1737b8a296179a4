// LogSlice - app/context.rs
//
// Per-extraction shared state: the cancellation token and the timer.
// Both are shared by reference across the worker pool.

use crate::util::error::ExtractError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Cooperative cancellation: an optional caller-owned flag plus an optional
/// deadline. Checked at segment boundaries, never mid-segment.
#[derive(Debug, Default)]
pub struct CancelToken {
    flag: Option<Arc<AtomicBool>>,
    deadline: Option<Deadline>,
}

#[derive(Debug)]
struct Deadline {
    started: Instant,
    timeout: Duration,
    /// Time spent inside `CancelToken::paused`, in nanoseconds.
    paused_nanos: AtomicU64,
}

impl Deadline {
    fn counted(&self) -> Duration {
        let paused = Duration::from_nanos(self.paused_nanos.load(Ordering::Acquire));
        self.started.elapsed().saturating_sub(paused)
    }
}

impl CancelToken {
    /// The deadline starts counting now.
    pub fn new(flag: Option<Arc<AtomicBool>>, timeout: Option<Duration>) -> Self {
        Self {
            flag,
            deadline: timeout.map(|timeout| Deadline {
                started: Instant::now(),
                timeout,
                paused_nanos: AtomicU64::new(0),
            }),
        }
    }

    /// `Cancelled` once the flag is set, `TimedOut` once the deadline passed.
    pub fn check(&self) -> Result<(), ExtractError> {
        if let Some(flag) = &self.flag {
            if flag.load(Ordering::SeqCst) {
                return Err(ExtractError::Cancelled);
            }
        }
        if let Some(deadline) = &self.deadline {
            if deadline.counted() >= deadline.timeout {
                return Err(ExtractError::TimedOut {
                    timeout_secs: deadline.timeout.as_secs(),
                });
            }
        }
        Ok(())
    }

    /// Run `f` with the deadline stopped, e.g. while waiting on the user.
    pub fn paused<T>(&self, f: impl FnOnce() -> T) -> T {
        let began = Instant::now();
        let out = f();
        if let Some(deadline) = &self.deadline {
            let nanos = u64::try_from(began.elapsed().as_nanos()).unwrap_or(u64::MAX);
            deadline.paused_nanos.fetch_add(nanos, Ordering::AcqRel);
        }
        out
    }
}

/// Elapsed-time tracking for one extraction.
#[derive(Debug)]
pub struct ExtractionTimer {
    started: Instant,
    first_segment: OnceLock<Duration>,
}

impl ExtractionTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            first_segment: OnceLock::new(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Record that the first output segment is complete. Returns the elapsed
    /// time only for the call that recorded it.
    pub fn mark_first_segment(&self) -> Option<Duration> {
        let elapsed = self.elapsed();
        let mut recorded = false;
        self.first_segment.get_or_init(|| {
            recorded = true;
            elapsed
        });
        recorded.then_some(elapsed)
    }

    pub fn first_segment(&self) -> Option<Duration> {
        self.first_segment.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_token_never_cancels() {
        assert!(CancelToken::default().check().is_ok());
    }

    #[test]
    fn test_flag_cancels() {
        let flag = Arc::new(AtomicBool::new(false));
        let token = CancelToken::new(Some(Arc::clone(&flag)), None);
        assert!(token.check().is_ok());
        flag.store(true, Ordering::SeqCst);
        assert!(matches!(token.check(), Err(ExtractError::Cancelled)));
    }

    #[test]
    fn test_elapsed_deadline_times_out() {
        let token = CancelToken::new(None, Some(Duration::ZERO));
        assert!(matches!(
            token.check(),
            Err(ExtractError::TimedOut { timeout_secs: 0 })
        ));
        let token = CancelToken::new(None, Some(Duration::from_secs(3600)));
        assert!(token.check().is_ok());
    }

    #[test]
    fn test_paused_time_is_not_counted() {
        let token = CancelToken::new(None, Some(Duration::from_millis(200)));
        let answer = token.paused(|| {
            std::thread::sleep(Duration::from_millis(300));
            true
        });
        assert!(answer);
        assert!(token.check().is_ok());

        std::thread::sleep(Duration::from_millis(250));
        assert!(matches!(token.check(), Err(ExtractError::TimedOut { .. })));
    }

    #[test]
    fn test_first_segment_recorded_once() {
        let timer = ExtractionTimer::start();
        assert_eq!(timer.first_segment(), None);
        let first = timer.mark_first_segment();
        assert!(first.is_some());
        assert_eq!(timer.mark_first_segment(), None);
        assert_eq!(timer.first_segment(), first);
    }
}
