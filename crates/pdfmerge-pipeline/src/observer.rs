// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run observer: callbacks through which the pipeline reports state changes,
// progress, skipped files, and user notices to whatever presents them (a
// progress bar, a status line, a test recorder).

use std::sync::Arc;
use std::time::Duration;

use pdfmerge_core::Notice;

use crate::run::RunState;

/// Receives events from a [`crate::BatchPipeline`].
///
/// Every method has a no-op default so implementors override only what they
/// present. Calls arrive from the task driving the run, in order.
pub trait RunObserver: Send + Sync {
    /// The pipeline entered `state`.
    fn on_state(&self, state: RunState) {
        let _ = state;
    }

    /// A chunk finished; `processed` of `total` input files are done.
    fn on_progress(&self, processed: usize, total: usize) {
        let _ = (processed, total);
    }

    /// An input file could not be converted and was left out.
    fn on_file_skipped(&self, name: &str, reason: &str) {
        let _ = (name, reason);
    }

    /// A transient message for the user.
    fn on_notice(&self, notice: &Notice) {
        let _ = notice;
    }

    /// After a timeout the presentation should reset once `delay` has passed.
    fn on_reset_scheduled(&self, delay: Duration) {
        let _ = delay;
    }

    /// Progress went back to zero during teardown.
    fn on_progress_reset(&self) {}
}

/// Observer that ignores every event. Used when none is configured.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Shared observer handle as stored by the pipeline.
pub type SharedObserver = Arc<dyn RunObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Progress {
        seen: Mutex<Vec<(usize, usize)>>,
    }

    impl RunObserver for Progress {
        fn on_progress(&self, processed: usize, total: usize) {
            self.seen.lock().unwrap().push((processed, total));
        }
    }

    #[test]
    fn noop_observer_accepts_every_event() {
        let observer: SharedObserver = Arc::new(NoopObserver);
        observer.on_state(RunState::Running);
        observer.on_progress(1, 2);
        observer.on_file_skipped("a.png", "broken");
        observer.on_notice(&Notice::merge_complete());
        observer.on_reset_scheduled(Duration::from_secs(3));
        observer.on_progress_reset();
    }

    #[test]
    fn overridden_methods_receive_events() {
        let progress = Progress::default();
        progress.on_progress(5, 12);
        progress.on_state(RunState::Completed);
        assert_eq!(*progress.seen.lock().unwrap(), vec![(5, 12)]);
    }
}
