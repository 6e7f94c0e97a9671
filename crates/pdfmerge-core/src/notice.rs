// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing notices.
//
// Every outcome the user should hear about (admission rejections, run
// failures, timeouts, success) is turned into one transient notice. The level
// drives the banner colour in whatever presents it.

use crate::error::PdfMergeError;

/// Banner level of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// A transient, human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Raised when a run finishes and the artifact has been handed over.
    pub fn merge_complete() -> Self {
        Self::new(NoticeLevel::Success, "PDF Merge complete.")
    }

    /// Raised when a run is started with nothing selected.
    pub fn nothing_selected() -> Self {
        Self::new(NoticeLevel::Warning, "Select at least one image to convert.")
    }

    /// Raised when the run deadline fires.
    pub fn timed_out() -> Self {
        Self::new(
            NoticeLevel::Danger,
            "Conversion process took too long and was terminated.",
        )
    }

    /// Raised when a run aborts; the error text is passed through verbatim.
    pub fn conversion_failed(err: &PdfMergeError) -> Self {
        Self::new(
            NoticeLevel::Danger,
            format!("An error occurred during PDF conversion: {err}"),
        )
    }
}

/// Map an error to the notice shown to the user.
pub fn notice_for_error(err: &PdfMergeError) -> Notice {
    match err {
        PdfMergeError::UnsupportedFile(name) => Notice::new(
            NoticeLevel::Warning,
            format!("{name} was not added: only PDF, JPG, JPEG, PNG, GIF and WEBP files are supported."),
        ),
        PdfMergeError::DuplicateFile(name) => Notice::new(
            NoticeLevel::Info,
            format!("{name} is already in the list."),
        ),
        PdfMergeError::FileTooLarge { name, .. } => Notice::new(
            NoticeLevel::Warning,
            format!("{name} was not added: images larger than 50 MB are not supported."),
        ),
        PdfMergeError::EmptyFileSet => Notice::nothing_selected(),
        PdfMergeError::RunInProgress => Notice::new(
            NoticeLevel::Info,
            "A conversion is already running. Please wait for it to finish.",
        ),
        PdfMergeError::Cancelled => Notice::timed_out(),
        other => Notice::conversion_failed(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_passes_error_through() {
        let err = PdfMergeError::FontError("fonts/Roboto-Black.ttf: not found".into());
        let notice = notice_for_error(&err);
        assert_eq!(notice.level, NoticeLevel::Danger);
        assert_eq!(
            notice.message,
            "An error occurred during PDF conversion: font loading failed: fonts/Roboto-Black.ttf: not found"
        );
    }

    #[test]
    fn empty_set_is_a_warning() {
        let notice = notice_for_error(&PdfMergeError::EmptyFileSet);
        assert_eq!(notice, Notice::nothing_selected());
        assert_eq!(notice.level, NoticeLevel::Warning);
    }

    #[test]
    fn admission_notices_name_the_file() {
        let notice = notice_for_error(&PdfMergeError::DuplicateFile("a.jpg".into()));
        assert!(notice.message.starts_with("a.jpg"));
    }
}
