//! grademark-ocr: Answer sheet text extraction.
//!
//! Decodes uploaded images and PDFs, binarizes each page, cuts it into
//! per-question regions, and runs an OCR engine over every region.

pub mod decode;
pub mod error;
pub mod mock;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod segment;

pub use error::OcrError;
pub use mock::MockRecognizer;
pub use pipeline::{AnswerSheetProcessor, ExtractedAnswers};
pub use recognizer::TesseractRecognizer;
