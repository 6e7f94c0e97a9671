// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordered file set: the deduplicated, user-reorderable list of files waiting
// to be merged.
//
// Invariants after every public mutation:
// - every element has a supported extension;
// - names are unique (exact, case-sensitive match);
// - elements other than PDFs are at most `MAX_FILE_SIZE` bytes.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{PdfMergeError, Result};
use crate::types::{FileKind, MAX_FILE_SIZE, PendingFile};

/// A file picked or dropped by the user, before validation.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub declared_size: u64,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    /// Selected file whose declared size is its byte length.
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            declared_size: bytes.len() as u64,
            bytes,
        }
    }

    /// Selected file with an explicit declared size (as reported by a picker).
    pub fn with_declared_size(
        name: impl Into<String>,
        declared_size: u64,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_size,
            bytes: bytes.into(),
        }
    }
}

/// Result of offering a file to the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Accepted,
    RejectedDuplicate,
    RejectedUnsupportedType,
    RejectedTooLarge,
}

impl AddOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// The user's ordered selection.
#[derive(Debug, Clone, Default)]
pub struct OrderedFileSet {
    files: Vec<PendingFile>,
}

impl OrderedFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `file` and append it if it passes.
    pub fn try_add(&mut self, file: SelectedFile) -> AddOutcome {
        let Some(kind) = FileKind::from_name(&file.name) else {
            debug!(file = %file.name, "rejected: unsupported type");
            return AddOutcome::RejectedUnsupportedType;
        };
        if self.contains(&file.name) {
            debug!(file = %file.name, "rejected: duplicate name");
            return AddOutcome::RejectedDuplicate;
        }
        if file.declared_size > MAX_FILE_SIZE && kind != FileKind::Pdf {
            debug!(file = %file.name, size = file.declared_size, "rejected: too large");
            return AddOutcome::RejectedTooLarge;
        }

        info!(file = %file.name, size = file.declared_size, ?kind, "file added");
        self.files.push(PendingFile::new(
            file.name,
            file.declared_size,
            kind,
            file.bytes,
        ));
        self.dedupe_and_revalidate();
        AddOutcome::Accepted
    }

    /// Like [`OrderedFileSet::try_add`], but reports rejections as errors so
    /// they can be turned into user notices.
    pub fn admit(&mut self, file: SelectedFile) -> Result<()> {
        let name = file.name.clone();
        let declared_size = file.declared_size;
        match self.try_add(file) {
            AddOutcome::Accepted => Ok(()),
            AddOutcome::RejectedDuplicate => Err(PdfMergeError::DuplicateFile(name)),
            AddOutcome::RejectedUnsupportedType => Err(PdfMergeError::UnsupportedFile(name)),
            AddOutcome::RejectedTooLarge => Err(PdfMergeError::FileTooLarge {
                name,
                size: declared_size,
                limit: MAX_FILE_SIZE,
            }),
        }
    }

    /// Move the element at `from` so it ends up at index `to`.
    ///
    /// This is a list move, not a swap: the element is removed first and
    /// reinserted into the remaining sequence. Equal or out-of-range indices
    /// leave the set untouched.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from == to || from >= self.files.len() || to >= self.files.len() {
            return;
        }
        let moved = self.files.remove(from);
        debug!(file = %moved.name(), from, to, "file moved");
        self.files.insert(to, moved);
        self.dedupe_and_revalidate();
    }

    /// Drop unsupported entries and later duplicates (first occurrence wins).
    pub fn dedupe_and_revalidate(&mut self) {
        let before = self.files.len();
        let mut seen: HashSet<String> = HashSet::with_capacity(before);
        self.files.retain(|file| {
            FileKind::from_name(file.name()).is_some() && seen.insert(file.name().to_string())
        });
        let dropped = before - self.files.len();
        if dropped > 0 {
            debug!(dropped, "stale entries removed");
        }
    }

    /// Remove every file.
    pub fn reset(&mut self) {
        info!(cleared = self.files.len(), "file list reset");
        self.files.clear();
    }

    pub fn size(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name() == name)
    }

    /// Whether image annotation options are relevant to the current selection.
    pub fn has_image_files(&self) -> bool {
        self.files.iter().any(|f| f.kind().is_image())
    }

    /// Ordered copy for the pipeline; later mutations of the set do not
    /// affect it.
    pub fn snapshot(&self) -> Vec<PendingFile> {
        self.files.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingFile> {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> SelectedFile {
        SelectedFile::new(name, name.as_bytes().to_vec())
    }

    fn names(set: &OrderedFileSet) -> Vec<String> {
        set.iter().map(|f| f.name().to_string()).collect()
    }

    #[test]
    fn duplicate_names_rejected_regardless_of_content() {
        let mut set = OrderedFileSet::new();
        assert_eq!(set.try_add(file("a.jpg")), AddOutcome::Accepted);
        let other = SelectedFile::new("a.jpg", vec![1u8, 2, 3, 4]);
        assert_eq!(set.try_add(other), AddOutcome::RejectedDuplicate);
        assert_eq!(set.size(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut set = OrderedFileSet::new();
        assert!(set.try_add(file("a.jpg")).is_accepted());
        assert!(set.try_add(file("A.jpg")).is_accepted());
        assert_eq!(set.size(), 2);
    }

    #[test]
    fn size_cap_applies_to_images_only() {
        let mut set = OrderedFileSet::new();
        let sixty_mib = 60 * 1024 * 1024;
        let big_jpg = SelectedFile::with_declared_size("big.jpg", sixty_mib, vec![0u8; 4]);
        let big_pdf = SelectedFile::with_declared_size("big.pdf", sixty_mib, vec![0u8; 4]);
        assert_eq!(set.try_add(big_jpg), AddOutcome::RejectedTooLarge);
        assert_eq!(set.try_add(big_pdf), AddOutcome::Accepted);
        assert_eq!(names(&set), vec!["big.pdf"]);
    }

    #[test]
    fn unsupported_types_rejected() {
        let mut set = OrderedFileSet::new();
        assert_eq!(
            set.try_add(file("notes.txt")),
            AddOutcome::RejectedUnsupportedType
        );
        assert_eq!(set.try_add(file("photo.WEBP")), AddOutcome::Accepted);
        assert!(set.has_image_files());
    }

    #[test]
    fn admit_reports_typed_errors() {
        let mut set = OrderedFileSet::new();
        set.admit(file("a.png")).unwrap();
        assert!(matches!(
            set.admit(file("a.png")),
            Err(PdfMergeError::DuplicateFile(name)) if name == "a.png"
        ));
        assert!(matches!(
            set.admit(file("a.doc")),
            Err(PdfMergeError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn reorder_is_a_list_move() {
        let mut set = OrderedFileSet::new();
        for name in ["a.jpg", "b.jpg", "c.jpg", "d.jpg"] {
            set.try_add(file(name));
        }
        set.reorder(0, 2);
        assert_eq!(names(&set), vec!["b.jpg", "c.jpg", "a.jpg", "d.jpg"]);
        // Swapped arguments do not undo the move.
        set.reorder(2, 0);
        assert_eq!(names(&set), vec!["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
        set.reorder(3, 1);
        assert_eq!(names(&set), vec!["a.jpg", "d.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn reorder_to_last_position() {
        let mut set = OrderedFileSet::new();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            set.try_add(file(name));
        }
        set.reorder(0, 2);
        assert_eq!(names(&set), vec!["b.jpg", "c.jpg", "a.jpg"]);
    }

    #[test]
    fn reorder_ignores_bad_indices() {
        let mut set = OrderedFileSet::new();
        for name in ["a.jpg", "b.jpg"] {
            set.try_add(file(name));
        }
        set.reorder(1, 1);
        set.reorder(0, 2);
        set.reorder(5, 0);
        assert_eq!(names(&set), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn reorders_preserve_the_multiset() {
        let mut set = OrderedFileSet::new();
        let originals: Vec<String> = (0..9).map(|i| format!("img{i}.png")).collect();
        for name in &originals {
            set.try_add(file(name));
        }

        // Deterministic pseudo-random move sequence (LCG).
        let mut seed: u64 = 0x5eed;
        for _ in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let from = (seed >> 33) as usize % 11;
            let to = (seed >> 17) as usize % 11;
            set.reorder(from, to);
            assert_eq!(set.size(), originals.len());
        }

        let mut after = names(&set);
        after.sort();
        let mut expected = originals.clone();
        expected.sort();
        assert_eq!(after, expected);
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let mut set = OrderedFileSet::new();
        set.try_add(file("a.jpg"));
        set.try_add(file("b.jpg"));
        // Simulate a caller that bypassed admission.
        let stale = set.files[0].clone();
        set.files.push(stale);
        set.dedupe_and_revalidate();
        assert_eq!(names(&set), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut set = OrderedFileSet::new();
        set.try_add(file("a.jpg"));
        let snapshot = set.snapshot();
        set.reset();
        assert!(set.is_empty());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].display_label(), "a.jpg (5 Bytes)");
    }
}
