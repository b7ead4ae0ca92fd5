//! Error taxonomy for the grading pipeline.
//!
//! Decode and recognition failures are fatal to one upload, evaluation errors
//! are fatal to one scoring call. Soft failures (no text, degenerate
//! similarity, empty keyword list) never show up here; they are absorbed into
//! documented low scores instead.

use thiserror::Error;

/// The source document could not be turned into page images.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// File extension or magic bytes are not a supported image or PDF.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The image decoder rejected the bytes.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// The PDF could not be rasterized.
    #[error("failed to render PDF: {0}")]
    Pdf(String),

    /// The document decoded but contained no pages.
    #[error("document contains no pages")]
    EmptyDocument,

    /// The source file could not be read.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

/// The OCR engine could not be used at all.
///
/// "No text found" is never an error; recognizers return an empty string.
#[derive(Debug, Error)]
pub enum RecognitionEngineError {
    /// The engine binary or library is not installed / not on the path.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    /// The engine started but rejected its configuration (e.g. missing language data).
    #[error("OCR engine misconfigured: {0}")]
    Misconfigured(String),

    /// Region image could not be handed to the engine.
    #[error("failed to prepare region for OCR: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed input to the scoring engine.
#[derive(Debug, Error, PartialEq)]
pub enum EvaluationError {
    #[error("max_marks must not be negative, got {0}")]
    NegativeMaxMarks(f64),

    #[error("max_marks must be a finite number")]
    NonFiniteMaxMarks,

    /// A manually assigned score falls outside `[0, max_marks]`.
    #[error("score {score} is outside the range 0..={max_marks}")]
    ScoreOutOfRange { score: f64, max_marks: f64 },
}

/// Lookups and updates against the gradebook.
#[derive(Debug, Error)]
pub enum GradebookError {
    #[error("exam not found: {0}")]
    ExamNotFound(u64),

    #[error("answer sheet not found: {0}")]
    AnswerSheetNotFound(u64),

    #[error("answer not found: {0}")]
    AnswerNotFound(u64),

    #[error("question not found: {0}")]
    QuestionNotFound(u64),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl RecognitionEngineError {
    /// Returns `true` when re-invoking the engine cannot help without operator action.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            RecognitionEngineError::Unavailable(_) | RecognitionEngineError::Misconfigured(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_are_permanent_except_io() {
        assert!(RecognitionEngineError::Unavailable("tesseract".into()).is_permanent());
        assert!(RecognitionEngineError::Misconfigured("eng".into()).is_permanent());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(!RecognitionEngineError::Io(io).is_permanent());
    }

    #[test]
    fn evaluation_error_messages() {
        assert_eq!(
            EvaluationError::NegativeMaxMarks(-1.0).to_string(),
            "max_marks must not be negative, got -1"
        );
        let err = GradebookError::from(EvaluationError::NonFiniteMaxMarks);
        assert_eq!(err.to_string(), "max_marks must be a finite number");
    }
}
