// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font loading at run start. Standard fonts need no I/O; TrueType files are
// read asynchronously and parsed before any page is composed.

use pdfmerge_core::error::{PdfMergeError, Result};
use pdfmerge_core::{FontSettings, FontSource};
use pdfmerge_document::{FontSet, LoadedFont};
use tracing::{debug, instrument};

/// Resolve one font source.
pub async fn load_font(source: &FontSource) -> Result<LoadedFont> {
    match source {
        FontSource::Builtin(font) => Ok(LoadedFont::standard(*font)),
        FontSource::File(path) => {
            let data = tokio::fs::read(path).await.map_err(|err| {
                PdfMergeError::FontError(format!("{}: {}", path.display(), err))
            })?;
            debug!(path = %path.display(), bytes_len = data.len(), "font file read");
            LoadedFont::from_truetype(data).map_err(|err| match err {
                PdfMergeError::FontError(msg) => {
                    PdfMergeError::FontError(format!("{}: {}", path.display(), msg))
                }
                other => other,
            })
        }
    }
}

/// Resolve the regular, bold, and black faces of a run.
#[instrument(skip_all)]
pub async fn load_font_set(settings: &FontSettings) -> Result<FontSet> {
    Ok(FontSet {
        regular: load_font(&settings.regular).await?,
        bold: load_font(&settings.bold).await?,
        black: load_font(&settings.black).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfmerge_core::StandardFont;

    #[tokio::test]
    async fn builtin_fonts_need_no_files() {
        let fonts = load_font_set(&FontSettings::default()).await.unwrap();
        assert_eq!(fonts.regular.base_font(), "Helvetica");
        assert_eq!(fonts.bold.base_font(), "Helvetica-Bold");
        assert!(!fonts.black.is_embedded());
    }

    #[tokio::test]
    async fn missing_font_file_names_the_path() {
        let source = FontSource::File("/nonexistent/fonts/Roboto-Black.ttf".into());
        let err = load_font(&source).await.unwrap_err();
        assert!(matches!(err, PdfMergeError::FontError(_)));
        assert!(err.to_string().contains("Roboto-Black.ttf"));
    }

    #[tokio::test]
    async fn unparseable_font_file_is_a_font_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let settings = FontSettings {
            regular: FontSource::Builtin(StandardFont::Helvetica),
            bold: FontSource::Builtin(StandardFont::HelveticaBold),
            black: FontSource::File(path),
        };
        let err = load_font_set(&settings).await.unwrap_err();
        assert!(err.to_string().contains("broken.ttf"));
    }
}
