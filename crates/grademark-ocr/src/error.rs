//! Errors surfaced by the extraction pipeline.

use grademark_core::error::{DecodeError, RecognitionEngineError};
use thiserror::Error;

/// An upload could not be turned into extracted answer text.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Recognition(#[from] RecognitionEngineError),
}
