//! Core trait definitions for OCR backends.
//!
//! Implemented by the `grademark-ocr` crate.

use async_trait::async_trait;
use image::GrayImage;

use crate::error::RecognitionEngineError;

/// Trait for OCR engines that turn a region image into text.
///
/// "No text found" is `Ok(String::new())`, never an error.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Human-readable engine name (e.g. "tesseract").
    fn name(&self) -> &str;

    /// Recognize the text in one region image.
    async fn recognize(&self, region: &GrayImage) -> Result<String, RecognitionEngineError>;
}
