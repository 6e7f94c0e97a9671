// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal presentation of a run: an `indicatif` progress bar fed by the
// pipeline's observer callbacks, plus notice printing.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pdfmerge_core::{Notice, NoticeLevel};
use pdfmerge_pipeline::{RunObserver, RunState};
use tracing::debug;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}";

/// One-line rendering of a notice.
pub fn format_notice(notice: &Notice) -> String {
    let label = match notice.level {
        NoticeLevel::Success => "done",
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Danger => "error",
    };
    format!("[{label}] {}", notice.message)
}

pub fn print_notice(notice: &Notice) {
    eprintln!("{}", format_notice(notice));
}

/// Observer that drives a progress bar on stderr.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar.set_message("waiting");
        Self { bar }
    }
}

impl RunObserver for ProgressObserver {
    fn on_state(&self, state: RunState) {
        if state == RunState::Running {
            self.bar.enable_steady_tick(Duration::from_millis(120));
        }
        self.bar.set_message(state.to_string());
    }

    fn on_progress(&self, processed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(processed as u64);
    }

    fn on_file_skipped(&self, name: &str, reason: &str) {
        self.bar
            .suspend(|| eprintln!("[warning] skipped {name}: {reason}"));
    }

    fn on_notice(&self, notice: &Notice) {
        self.bar.suspend(|| print_notice(notice));
    }

    fn on_reset_scheduled(&self, delay: Duration) {
        debug!(delay_ms = delay.as_millis() as u64, "reset scheduled");
    }

    fn on_progress_reset(&self) {
        self.bar.finish_and_clear();
    }
}
