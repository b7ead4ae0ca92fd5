//! Mock recognizer for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use image::GrayImage;

use grademark_core::error::RecognitionEngineError;
use grademark_core::traits::TextRecognizer;

/// A mock OCR engine for exercising the pipeline without tesseract.
///
/// Hands out queued responses in call order, then falls back to a default.
pub struct MockRecognizer {
    /// Responses returned by successive calls.
    responses: Mutex<VecDeque<String>>,
    /// Response once the queue is exhausted.
    default_response: String,
    /// When set, every call fails this way.
    failure: Option<MockFailure>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Heights of the regions received, in call order.
    region_heights: Mutex<Vec<u32>>,
}

impl MockRecognizer {
    /// Create a mock returning `responses` in order, then empty strings.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            default_response: String::new(),
            failure: None,
            call_count: AtomicU32::new(0),
            region_heights: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same text.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::new(Vec::<String>::new())
        }
    }

    /// Create a mock whose engine is never available.
    pub fn unavailable() -> Self {
        Self {
            failure: Some(MockFailure::Unavailable),
            ..Self::new(Vec::<String>::new())
        }
    }

    /// Create a mock that cannot receive any region image.
    pub fn broken_pipe() -> Self {
        Self {
            failure: Some(MockFailure::Io),
            ..Self::new(Vec::<String>::new())
        }
    }

    /// Get the number of calls made to this recognizer.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Heights of every region passed in.
    pub fn region_heights(&self) -> Vec<u32> {
        self.region_heights.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, Copy)]
enum MockFailure {
    Unavailable,
    Io,
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(&self, region: &GrayImage) -> Result<String, RecognitionEngineError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.region_heights.lock().unwrap().push(region.height());

        match self.failure {
            Some(MockFailure::Unavailable) => {
                return Err(RecognitionEngineError::Unavailable("mock engine".into()));
            }
            Some(MockFailure::Io) => {
                return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe).into());
            }
            None => {}
        }

        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.default_response.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn region() -> GrayImage {
        GrayImage::from_pixel(4, 3, Luma([255]))
    }

    #[tokio::test]
    async fn queued_responses_then_empty() {
        let mock = MockRecognizer::new(["first", "second"]);
        assert_eq!(mock.recognize(&region()).await.unwrap(), "first");
        assert_eq!(mock.recognize(&region()).await.unwrap(), "second");
        assert_eq!(mock.recognize(&region()).await.unwrap(), "");
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.region_heights(), vec![3, 3, 3]);
    }

    #[tokio::test]
    async fn fixed_response() {
        let mock = MockRecognizer::with_fixed_response("energy");
        assert_eq!(mock.recognize(&region()).await.unwrap(), "energy");
        assert_eq!(mock.recognize(&region()).await.unwrap(), "energy");
    }

    #[tokio::test]
    async fn unavailable_engine() {
        let err = MockRecognizer::unavailable()
            .recognize(&region())
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionEngineError::Unavailable(_)));
    }

    #[tokio::test]
    async fn broken_pipe_is_transient() {
        let err = MockRecognizer::broken_pipe()
            .recognize(&region())
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionEngineError::Io(_)));
        assert!(!err.is_permanent());
    }
}
