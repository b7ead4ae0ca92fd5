//! Decoding uploaded documents into page images.
//!
//! Raster formats go through `image`; PDFs are rasterized page by page with
//! `pdf2image` (which needs poppler on the host).

use std::path::Path;

use grademark_core::error::DecodeError;
use image::{DynamicImage, RgbImage};
use pdf2image::{Pages, RenderOptionsBuilder, PDF};

/// File extensions accepted for path-based uploads.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "pdf"];

const PDF_MAGIC: &[u8] = b"%PDF";

/// Decode a file on disk, checking its extension first.
pub fn load_pages_from_path(path: &Path) -> Result<Vec<DynamicImage>, DecodeError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DecodeError::UnsupportedFormat(format!(
            "{} (expected one of: {})",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    let bytes = std::fs::read(path)?;
    load_pages_from_bytes(&bytes)
}

/// Decode raw document bytes into one image per page.
pub fn load_pages_from_bytes(bytes: &[u8]) -> Result<Vec<DynamicImage>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyDocument);
    }
    if bytes.starts_with(PDF_MAGIC) {
        return render_pdf(bytes);
    }

    let format = image::guess_format(bytes)
        .map_err(|_| DecodeError::UnsupportedFormat("unrecognized image data".into()))?;
    let page = image::load_from_memory_with_format(bytes, format)?;
    tracing::debug!(?format, width = page.width(), height = page.height(), "image decoded");
    Ok(vec![page])
}

fn render_pdf(bytes: &[u8]) -> Result<Vec<DynamicImage>, DecodeError> {
    let pdf = PDF::from_bytes(bytes.to_vec()).map_err(|e| DecodeError::Pdf(e.to_string()))?;
    let page_count = pdf.page_count();
    if page_count == 0 {
        return Err(DecodeError::EmptyDocument);
    }

    let options = RenderOptionsBuilder::default()
        .build()
        .map_err(|e| DecodeError::Pdf(e.to_string()))?;
    let rendered = pdf
        .render(Pages::Range(1..=page_count), options)
        .map_err(|e| DecodeError::Pdf(e.to_string()))?;

    // rebuilt from raw buffers so the pages do not depend on pdf2image's `image` release
    let pages = rendered
        .into_iter()
        .map(|page| {
            let rgb = page.to_rgb8();
            let (width, height) = rgb.dimensions();
            RgbImage::from_raw(width, height, rgb.into_raw())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| DecodeError::Pdf("rendered page buffer has the wrong size".into()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(pages = pages.len(), "PDF rendered");
    Ok(pages)
}
