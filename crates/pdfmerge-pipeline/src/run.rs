// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion run bookkeeping: the pipeline's lifecycle state and the
// per-run counters.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pdfmerge_core::RunId;
use serde::{Deserialize, Serialize};

/// Lifecycle of the pipeline.
///
/// `Idle -> Running -> {Completed | Failed | TimedOut} -> Idle`. The terminal
/// states are broadcast once and the pipeline drops back to `Idle` straight
/// after teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
    TimedOut,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
        };
        f.write_str(label)
    }
}

/// Counters and cancellation flag of one run.
#[derive(Debug)]
pub struct ConversionRun {
    id: RunId,
    total: usize,
    processed: usize,
    image_pages: u32,
    cancelled: Arc<AtomicBool>,
}

impl ConversionRun {
    pub fn new(total: usize) -> Self {
        Self {
            id: RunId::new(),
            total,
            processed: 0,
            image_pages: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Count one more input file as handled, whether it produced pages or
    /// was skipped.
    pub fn record_processed(&mut self) {
        self.processed = (self.processed + 1).min(self.total);
    }

    /// 1-based number for the next image page.
    pub fn next_image_number(&mut self) -> u32 {
        self.image_pages += 1;
        self.image_pages
    }

    pub fn image_pages(&self) -> u32 {
        self.image_pages
    }

    /// Fraction of input files handled, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.processed as f64 / self.total as f64
    }

    // -- Cancellation ---------------------------------------------------------

    /// Shared flag that, once set, makes the run stop at the next file.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_numbers_start_at_one() {
        let mut run = ConversionRun::new(3);
        assert_eq!(run.next_image_number(), 1);
        assert_eq!(run.next_image_number(), 2);
        assert_eq!(run.image_pages(), 2);
    }

    #[test]
    fn processed_never_exceeds_total() {
        let mut run = ConversionRun::new(2);
        for _ in 0..5 {
            run.record_processed();
        }
        assert_eq!(run.processed(), 2);
        assert!((run.fraction() - 1.0).abs() < f64::EPSILON);
        assert_eq!(ConversionRun::new(0).fraction(), 0.0);
    }

    #[test]
    fn cancel_handle_is_shared() {
        let run = ConversionRun::new(1);
        let handle = run.cancel_handle();
        assert!(!run.is_cancelled());
        handle.store(true, Ordering::Release);
        assert!(run.is_cancelled());
    }

    #[test]
    fn only_outcomes_are_terminal() {
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::TimedOut.is_terminal());
        assert_eq!(RunState::TimedOut.to_string(), "timed out");
    }
}
