// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: load existing PDF documents with `lopdf` and copy their pages,
// verbatim and in order, into the output document.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfmerge_core::error::{PdfMergeError, Result};
use tracing::{debug, info, instrument, warn};

use super::writer::{OutputDocument, PageRef};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Parent-chain walks stop after this many hops.
const MAX_TREE_DEPTH: usize = 32;

/// Page size used when a page has no usable MediaBox (US Letter).
const FALLBACK_SIZE: (f64, f64) = (612.0, 792.0);

/// An input PDF, loaded and ready to have its pages copied.
pub struct ForeignDocument {
    document: Document,
}

impl ForeignDocument {
    // -- Construction ---------------------------------------------------------

    /// Parse PDF bytes.
    ///
    /// Encrypted documents are decrypted with the empty user password when
    /// that works; otherwise they are kept as loaded.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data)
            .map_err(|err| PdfMergeError::PdfError(format!("failed to load PDF: {}", err)))?;

        if document.is_encrypted() {
            match document.decrypt("") {
                Ok(()) => debug!("decrypted with empty password"),
                Err(err) => warn!(%err, "encrypted PDF could not be decrypted, importing as-is"),
            }
        }

        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    // -- Import ---------------------------------------------------------------

    /// Append every page of this document to `out`, in source order.
    /// Returns the number of pages copied.
    #[instrument(skip_all, fields(pages = self.page_count()))]
    pub fn copy_pages_into(&self, out: &mut OutputDocument) -> Result<usize> {
        let pages_id = out.pages_id();
        let mut copier = ObjectCopier::new(&self.document);
        let mut copied = 0;

        for (number, page_id) in self.document.get_pages() {
            let page = self.document.get_dictionary(page_id).map_err(|err| {
                PdfMergeError::PdfError(format!("cannot read page {}: {}", number, err))
            })?;

            let new_id = copier.reserve(out.document_mut(), page_id);
            let mut cloned = copier.copy_dictionary(out.document_mut(), page);
            for key in INHERITABLE {
                if cloned.has(key) {
                    continue;
                }
                if let Some(inherited) = inherited_attribute(&self.document, page, key) {
                    let value = copier.copy(out.document_mut(), &inherited);
                    cloned.set(key.to_vec(), value);
                }
            }
            cloned.set("Parent", Object::Reference(pages_id));

            let (width, height) =
                media_box_size(out.document_mut(), &cloned).unwrap_or(FALLBACK_SIZE);
            out.document_mut()
                .objects
                .insert(new_id, Object::Dictionary(cloned));
            out.push_page(PageRef {
                id: new_id,
                width,
                height,
            });
            copied += 1;
        }

        info!(copied, "PDF pages imported");
        Ok(copied)
    }
}

/// Deep-copies objects from one document into another.
///
/// Every source object is copied at most once: references are remembered, so
/// shared resources stay shared and reference cycles terminate. `/Parent`
/// entries are dropped; the caller re-links pages to the target page tree.
struct ObjectCopier<'a> {
    source: &'a Document,
    mapped: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            mapped: HashMap::new(),
        }
    }

    /// Allocate the target id for `source_id` ahead of copying it.
    fn reserve(&mut self, target: &mut Document, source_id: ObjectId) -> ObjectId {
        *self
            .mapped
            .entry(source_id)
            .or_insert_with(|| target.new_object_id())
    }

    fn copy(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(target, dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy(target, item)).collect())
            }
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(target, &stream.dict);
                let mut copy = Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Object::Stream(copy)
            }
            Object::Reference(id) => self.copy_reference(target, *id),
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy(target, value));
        }
        copy
    }

    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(existing) = self.mapped.get(&id) {
            return Object::Reference(*existing);
        }
        let Ok(referenced) = self.source.get_object(id) else {
            warn!(?id, "cannot resolve reference, using null");
            return Object::Null;
        };
        let new_id = self.reserve(target, id);
        let copy = self.copy(target, referenced);
        target.objects.insert(new_id, copy);
        Object::Reference(new_id)
    }
}

/// Look `key` up on the ancestors of `page`.
fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut current = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(current?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        current = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Width and height of a page's MediaBox, resolving an indirect array.
fn media_box_size(doc: &Document, page: &Dictionary) -> Option<(f64, f64)> {
    let raw = page.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let values = resolved.as_array().ok()?;
    let [llx, lly, urx, ury] = values.as_slice() else {
        return None;
    };
    let coord = |obj: &Object| -> Option<f64> {
        match obj {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(f64::from(*r)),
            _ => None,
        }
    };
    Some(((coord(urx)? - coord(llx)?).abs(), (coord(ury)? - coord(lly)?).abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::writer::PageCanvas;
    use lopdf::dictionary;

    fn sample_pdf(sizes: &[(f64, f64)]) -> Vec<u8> {
        let mut out = OutputDocument::new();
        for (w, h) in sizes {
            out.add_page(*w, *h, PageCanvas::new());
        }
        out.save().unwrap()
    }

    /// A page tree where MediaBox and Resources live only on the root node.
    fn inherited_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            b"BT /F1 12 Tf 72 720 Td (shared) Tj ET".to_vec(),
        ));
        let mut kids = Vec::new();
        for _ in 0..2 {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 400.into(), 500.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pages_are_copied_in_order_with_their_sizes() {
        let source = ForeignDocument::load(&sample_pdf(&[(100.0, 200.0), (300.0, 150.0)])).unwrap();
        assert_eq!(source.page_count(), 2);

        let mut out = OutputDocument::new();
        out.add_page(595.0, 842.0, PageCanvas::new());
        assert_eq!(source.copy_pages_into(&mut out).unwrap(), 2);

        let sizes: Vec<(f64, f64)> = out.pages().iter().map(|p| (p.width, p.height)).collect();
        assert_eq!(sizes, vec![(595.0, 842.0), (100.0, 200.0), (300.0, 150.0)]);

        let merged = Document::load_mem(&out.save().unwrap()).unwrap();
        assert_eq!(merged.get_pages().len(), 3);
    }

    #[test]
    fn inherited_attributes_are_materialised() {
        let source = ForeignDocument::load(&inherited_pdf()).unwrap();
        let mut out = OutputDocument::new();
        source.copy_pages_into(&mut out).unwrap();

        for page in out.pages() {
            assert_eq!((page.width, page.height), (400.0, 500.0));
        }
        let bytes = out.save().unwrap();
        let merged = Document::load_mem(&bytes).unwrap();
        let pages = merged.get_pages();
        let first = merged.get_dictionary(pages[&1]).unwrap();
        assert!(first.has(b"Resources"));

        // Both pages still share one content stream after the copy.
        let second = merged.get_dictionary(pages[&2]).unwrap();
        assert_eq!(
            first.get(b"Contents").unwrap(),
            second.get(b"Contents").unwrap()
        );
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        let err = ForeignDocument::load(b"%PDF-nonsense").err().unwrap();
        assert!(matches!(err, PdfMergeError::PdfError(_)));
    }
}
