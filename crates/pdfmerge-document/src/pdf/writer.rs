// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: builds the output document directly on the `lopdf` object
// model: fonts, JPEG XObjects, opacity graphics states, fresh pages, overlays
// on existing (imported) pages, and final serialisation.
//
// Page content is generated as raw content-stream operators. Resource names
// carry a `Pm` prefix so overlays never collide with names already used by an
// imported page.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pdfmerge_core::Rgb;
use pdfmerge_core::error::{PdfMergeError, Result};
use tracing::{debug, info, instrument};

use super::font::LoadedFont;
use crate::image::RasterBytes;
use crate::layout::Rect;

/// PDF header version of generated documents.
const PDF_VERSION: &str = "1.7";

/// A page of the output document, with its MediaBox size in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRef {
    pub id: ObjectId,
    pub width: f64,
    pub height: f64,
}

/// A font registered with the document.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    resource: String,
    id: ObjectId,
    metrics: LoadedFont,
}

impl EmbeddedFont {
    pub fn metrics(&self) -> &LoadedFont {
        &self.metrics
    }

    pub fn width_of_text_at_size(&self, text: &str, size: f64) -> f64 {
        self.metrics.width_of_text_at_size(text, size)
    }
}

/// A JPEG image XObject registered with the document.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    resource: String,
    id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// An `/ExtGState` setting fill and stroke opacity.
#[derive(Debug, Clone)]
pub struct OpacityState {
    resource: String,
    id: ObjectId,
}

/// How a run of text is drawn.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    pub font: &'a EmbeddedFont,
    pub size: f64,
    pub color: Rgb,
    /// Counter-clockwise rotation about the start point, in degrees.
    pub rotate_deg: f64,
    pub opacity: Option<&'a OpacityState>,
}

impl<'a> TextStyle<'a> {
    /// Upright, opaque text.
    pub fn plain(font: &'a EmbeddedFont, size: f64, color: Rgb) -> Self {
        Self {
            font,
            size,
            color,
            rotate_deg: 0.0,
            opacity: None,
        }
    }
}

/// Drawing operations for one page, plus the resources they reference.
#[derive(Debug, Default)]
pub struct PageCanvas {
    content: String,
    fonts: BTreeMap<String, ObjectId>,
    xobjects: BTreeMap<String, ObjectId>,
    ext_gstates: BTreeMap<String, ObjectId>,
}

impl PageCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Draw `image` stretched over `rect`.
    pub fn draw_image(&mut self, image: &EmbeddedImage, rect: Rect) {
        self.xobjects.insert(image.resource.clone(), image.id);
        let _ = writeln!(
            self.content,
            "q {} 0 0 {} {} {} cm /{} Do Q",
            num(rect.width),
            num(rect.height),
            num(rect.x),
            num(rect.y),
            image.resource
        );
    }

    /// Draw one line of text with its baseline starting at `(x, y)`.
    pub fn draw_text(&mut self, text: &str, x: f64, y: f64, style: TextStyle<'_>) {
        let font = style.font;
        self.fonts.insert(font.resource.clone(), font.id);

        self.content.push_str("q\n");
        if let Some(state) = style.opacity {
            self.ext_gstates.insert(state.resource.clone(), state.id);
            let _ = writeln!(self.content, "/{} gs", state.resource);
        }
        let Rgb { r, g, b } = style.color;
        let _ = writeln!(self.content, "{} {} {} rg", num(r), num(g), num(b));
        self.content.push_str("BT\n");
        let _ = writeln!(self.content, "/{} {} Tf", font.resource, num(style.size));

        let radians = style.rotate_deg.to_radians();
        let (sin, cos) = radians.sin_cos();
        let _ = writeln!(
            self.content,
            "{} {} {} {} {} {} Tm",
            num(cos),
            num(sin),
            num(-sin),
            num(cos),
            num(x),
            num(y)
        );
        let encoded = font.metrics.encode(text);
        let _ = writeln!(self.content, "<{}> Tj", hex::encode_upper(encoded));
        self.content.push_str("ET\nQ\n");
    }

    fn resources(&self) -> Dictionary {
        let mut resources = Dictionary::new();
        for (key, entries) in [
            ("Font", &self.fonts),
            ("XObject", &self.xobjects),
            ("ExtGState", &self.ext_gstates),
        ] {
            if entries.is_empty() {
                continue;
            }
            let mut dict = Dictionary::new();
            for (name, id) in entries {
                dict.set(name.as_bytes().to_vec(), Object::Reference(*id));
            }
            resources.set(key, Object::Dictionary(dict));
        }
        resources
    }
}

/// The document being assembled.
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    pages: Vec<PageRef>,
    opacity_cache: HashMap<u64, OpacityState>,
    next_resource: u32,
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDocument {
    // -- Construction ---------------------------------------------------------

    pub fn new() -> Self {
        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            pages: Vec::new(),
            opacity_cache: HashMap::new(),
            next_resource: 0,
        }
    }

    fn resource_name(&mut self, prefix: &str) -> String {
        self.next_resource += 1;
        format!("Pm{}{}", prefix, self.next_resource)
    }

    // -- Resources ------------------------------------------------------------

    /// Register `font` and write its objects.
    pub fn embed_font(&mut self, font: LoadedFont) -> EmbeddedFont {
        let id = font.write_objects(&mut self.doc);
        let resource = self.resource_name("F");
        debug!(font = font.base_font(), embedded = font.is_embedded(), %resource, "font registered");
        EmbeddedFont {
            resource,
            id,
            metrics: font,
        }
    }

    /// Register a baseline JPEG as an image XObject (passed through as
    /// `DCTDecode`, never recompressed).
    pub fn embed_jpeg(&mut self, raster: &RasterBytes) -> EmbeddedImage {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(raster.width),
                "Height" => i64::from(raster.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            raster.jpeg.clone(),
        )
        .with_compression(false);
        let id = self.doc.add_object(stream);
        let resource = self.resource_name("Im");
        EmbeddedImage {
            resource,
            id,
            width: raster.width,
            height: raster.height,
        }
    }

    /// Graphics state with the given fill/stroke opacity (shared per value).
    pub fn opacity_state(&mut self, opacity: f64) -> OpacityState {
        let opacity = opacity.clamp(0.0, 1.0);
        if let Some(state) = self.opacity_cache.get(&opacity.to_bits()) {
            return state.clone();
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "CA" => Object::Real(opacity as f32),
            "ca" => Object::Real(opacity as f32),
        });
        let state = OpacityState {
            resource: self.resource_name("Gs"),
            id,
        };
        self.opacity_cache.insert(opacity.to_bits(), state.clone());
        state
    }

    // -- Pages ----------------------------------------------------------------

    /// Append a new page of `width` x `height` points drawn by `canvas`.
    pub fn add_page(&mut self, width: f64, height: f64, canvas: PageCanvas) -> PageRef {
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), canvas.content.clone().into_bytes()));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
            "Resources" => canvas.resources(),
            "Contents" => content_id,
        });
        let page = PageRef {
            id: page_id,
            width,
            height,
        };
        self.pages.push(page);
        debug!(page = self.pages.len(), width, height, "page added");
        page
    }

    /// Draw `canvas` on top of an existing page.
    ///
    /// The page's current content is wrapped in `q`/`Q` so graphics state it
    /// leaves behind cannot leak into the overlay.
    pub fn overlay(&mut self, page: PageRef, canvas: PageCanvas) -> Result<()> {
        if canvas.is_empty() {
            return Ok(());
        }
        let existing = self
            .doc
            .get_dictionary(page.id)
            .map_err(|err| PdfMergeError::PdfError(format!("page {:?} is not a dictionary: {}", page.id, err)))?
            .get(b"Contents")
            .ok()
            .cloned();
        let merged_resources = self.merged_resources(page.id, &canvas)?;

        let overlay_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), canvas.content.into_bytes()));
        // `/Contents` is a stream, an array of streams, or a reference to either.
        let parts = match existing {
            Some(Object::Reference(id)) => match self.doc.get_object(id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(id)],
            },
            Some(Object::Array(items)) => items,
            _ => Vec::new(),
        };
        let contents = if parts.is_empty() {
            vec![overlay_id.into()]
        } else {
            let open = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let close = self.doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            let mut all: Vec<Object> = Vec::with_capacity(parts.len() + 3);
            all.push(open.into());
            all.extend(parts);
            all.push(close.into());
            all.push(overlay_id.into());
            all
        };

        let dict = self
            .doc
            .get_dictionary_mut(page.id)
            .map_err(|err| PdfMergeError::PdfError(format!("page {:?} is not a dictionary: {}", page.id, err)))?;
        dict.set("Contents", Object::Array(contents));
        dict.set("Resources", Object::Dictionary(merged_resources));
        Ok(())
    }

    /// The page's resources (resolved to an inline dictionary) with the
    /// canvas's resources added.
    fn merged_resources(&self, page_id: ObjectId, canvas: &PageCanvas) -> Result<Dictionary> {
        let page = self
            .doc
            .get_dictionary(page_id)
            .map_err(|err| PdfMergeError::PdfError(format!("page {:?} is not a dictionary: {}", page_id, err)))?;
        let mut resources = match page.get(b"Resources") {
            Ok(object) => self.resolve_dict(object).unwrap_or_default(),
            Err(_) => Dictionary::new(),
        };

        for (key, addition) in canvas.resources().into_iter() {
            let Object::Dictionary(addition) = addition else {
                continue;
            };
            let mut category = match resources.get(&key) {
                Ok(object) => self.resolve_dict(object).unwrap_or_default(),
                Err(_) => Dictionary::new(),
            };
            for (name, value) in addition.into_iter() {
                category.set(name, value);
            }
            resources.set(key, Object::Dictionary(category));
        }
        Ok(resources)
    }

    fn resolve_dict(&self, object: &Object) -> Option<Dictionary> {
        match object {
            Object::Dictionary(dict) => Some(dict.clone()),
            Object::Reference(id) => self.doc.get_dictionary(*id).ok().cloned(),
            _ => None,
        }
    }

    /// Pages in document order.
    pub fn pages(&self) -> &[PageRef] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    // -- Crate-internal access for page import --------------------------------

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub(crate) fn pages_id(&self) -> ObjectId {
        self.pages_id
    }

    pub(crate) fn push_page(&mut self, page: PageRef) {
        self.pages.push(page);
    }

    // -- Output ---------------------------------------------------------------

    /// Write the page tree and catalog, compress, and serialise.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn save(mut self) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.pages.iter().map(|p| Object::Reference(p.id)).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.pages.len() as i64,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Producer" => Object::string_literal("PDFMerge"),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);
        self.doc.compress();

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|err| PdfMergeError::PdfError(format!("failed to serialise PDF: {}", err)))?;

        info!(output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }
}

/// Format a coordinate for a content stream: at most four decimals, no
/// trailing zeros, never `-0`.
fn num(value: f64) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}
