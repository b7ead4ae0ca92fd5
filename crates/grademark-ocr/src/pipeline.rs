//! Answer sheet extraction: decode → preprocess → segment → recognize.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;

use grademark_core::config::{GrademarkConfig, RegionCollision, SegmentationConfig};
use grademark_core::model::LayoutTemplate;
use grademark_core::traits::TextRecognizer;

use crate::decode::{load_pages_from_bytes, load_pages_from_path};
use crate::error::OcrError;
use crate::preprocess::Preprocessor;
use crate::segment::{FixedBands, SegmentationStrategy, TemplateGuided};

/// Extracted answer text keyed by question id (`q1`, `q2`, ...).
pub type ExtractedAnswers = BTreeMap<String, String>;

/// Turns an uploaded answer sheet into per-question text.
///
/// Pages and regions are processed one after another; a processor holds no
/// per-sheet state, so one instance can serve many uploads.
pub struct AnswerSheetProcessor {
    preprocessor: Preprocessor,
    segmentation: SegmentationConfig,
    recognizer: Arc<dyn TextRecognizer>,
}

impl AnswerSheetProcessor {
    pub fn new(config: &GrademarkConfig, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            preprocessor: Preprocessor::new(config.preprocess.clone()),
            segmentation: config.segmentation.clone(),
            recognizer,
        }
    }

    /// Template-guided segmentation when the exam has a usable layout,
    /// fixed bands otherwise.
    pub fn strategy_for(&self, layout: Option<&LayoutTemplate>) -> Box<dyn SegmentationStrategy> {
        layout
            .cloned()
            .and_then(|template| TemplateGuided::new(template, self.segmentation.search_radius))
            .map(|s| Box::new(s) as Box<dyn SegmentationStrategy>)
            .unwrap_or_else(|| Box::new(FixedBands::new(self.segmentation.bands)))
    }

    /// Extract answers from raw document bytes.
    pub async fn process_answer_sheet(
        &self,
        document: &[u8],
        layout: Option<&LayoutTemplate>,
    ) -> Result<ExtractedAnswers, OcrError> {
        let pages = load_pages_from_bytes(document)?;
        self.process_pages(&pages, layout).await
    }

    /// Extract answers from a document on disk.
    pub async fn process_file(
        &self,
        path: &Path,
        layout: Option<&LayoutTemplate>,
    ) -> Result<ExtractedAnswers, OcrError> {
        let pages = load_pages_from_path(path)?;
        tracing::info!(path = %path.display(), pages = pages.len(), "document loaded");
        self.process_pages(&pages, layout).await
    }

    /// Extract answers from already decoded pages, merging pages in order.
    pub async fn process_pages(
        &self,
        pages: &[DynamicImage],
        layout: Option<&LayoutTemplate>,
    ) -> Result<ExtractedAnswers, OcrError> {
        let strategy = self.strategy_for(layout);
        let mut answers = ExtractedAnswers::new();

        for (page_index, page) in pages.iter().enumerate() {
            let binary = self.preprocessor.preprocess(page);
            for region in strategy.segment(&binary) {
                let text = if region.is_empty() {
                    String::new()
                } else {
                    match self.recognizer.recognize(&region.image).await {
                        Ok(text) => text.trim().to_string(),
                        Err(e) if !e.is_permanent() => {
                            tracing::warn!(question_id = %region.question_id, "skipping region: {e}");
                            String::new()
                        }
                        Err(e) => return Err(e.into()),
                    }
                };
                tracing::debug!(
                    page = page_index + 1,
                    question_id = %region.question_id,
                    chars = text.len(),
                    "region extracted"
                );
                merge_region(
                    &mut answers,
                    region.question_id,
                    text,
                    self.segmentation.collision,
                );
            }
        }

        tracing::info!(
            engine = self.recognizer.name(),
            pages = pages.len(),
            regions = answers.len(),
            "answer sheet extracted"
        );
        Ok(answers)
    }
}

fn merge_region(
    answers: &mut ExtractedAnswers,
    question_id: String,
    text: String,
    policy: RegionCollision,
) {
    match answers.entry(question_id) {
        Entry::Vacant(slot) => {
            slot.insert(text);
        }
        Entry::Occupied(mut slot) => {
            tracing::warn!(question_id = %slot.key(), ?policy, "duplicate region id");
            match policy {
                RegionCollision::Overwrite => {
                    slot.insert(text);
                }
                RegionCollision::KeepFirst => {}
                RegionCollision::Append => {
                    let existing = slot.get_mut();
                    existing.push('\n');
                    existing.push_str(&text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grademark_core::error::RecognitionEngineError;
    use grademark_core::model::TemplateAnchor;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    use crate::mock::MockRecognizer;

    fn page(height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(30, height, Luma([255])))
    }

    fn processor(config: GrademarkConfig, mock: Arc<MockRecognizer>) -> AnswerSheetProcessor {
        AnswerSheetProcessor::new(&config, mock)
    }

    fn config_with(collision: RegionCollision, bands: u32) -> GrademarkConfig {
        let mut config = GrademarkConfig::default();
        config.segmentation.collision = collision;
        config.segmentation.bands = bands;
        config
    }

    #[tokio::test]
    async fn fixed_bands_produce_one_answer_per_band() {
        let mock = Arc::new(MockRecognizer::new(["  one ", "two", "three", "four", "five"]));
        let answers = processor(GrademarkConfig::default(), mock.clone())
            .process_pages(&[page(100)], None)
            .await
            .unwrap();

        assert_eq!(answers.len(), 5);
        assert_eq!(answers["q1"], "one");
        assert_eq!(answers["q5"], "five");
        assert_eq!(mock.region_heights(), vec![20; 5]);
    }

    #[tokio::test]
    async fn later_pages_overwrite_by_default() {
        let mock = Arc::new(MockRecognizer::new(["p1 a", "p1 b", "p2 a", "p2 b"]));
        let answers = processor(config_with(RegionCollision::Overwrite, 2), mock)
            .process_pages(&[page(40), page(40)], None)
            .await
            .unwrap();
        assert_eq!(answers["q1"], "p2 a");
        assert_eq!(answers["q2"], "p2 b");
    }

    #[tokio::test]
    async fn keep_first_and_append_policies() {
        let mock = Arc::new(MockRecognizer::new(["p1 a", "p1 b", "p2 a", "p2 b"]));
        let kept = processor(config_with(RegionCollision::KeepFirst, 2), mock)
            .process_pages(&[page(40), page(40)], None)
            .await
            .unwrap();
        assert_eq!(kept["q1"], "p1 a");

        let mock = Arc::new(MockRecognizer::new(["p1 a", "p1 b", "p2 a", "p2 b"]));
        let appended = processor(config_with(RegionCollision::Append, 2), mock)
            .process_pages(&[page(40), page(40)], None)
            .await
            .unwrap();
        assert_eq!(appended["q2"], "p1 b\np2 b");
    }

    #[tokio::test]
    async fn zero_height_regions_skip_the_engine() {
        let mock = Arc::new(MockRecognizer::with_fixed_response("text"));
        let answers = processor(config_with(RegionCollision::Overwrite, 5), mock.clone())
            .process_pages(&[page(3)], None)
            .await
            .unwrap();
        assert_eq!(answers.len(), 5);
        assert_eq!(mock.call_count(), 3);
        assert_eq!(answers.values().filter(|t| t.is_empty()).count(), 2);
    }

    #[tokio::test]
    async fn layout_template_drives_region_ids() {
        let layout = LayoutTemplate {
            anchors: vec![
                TemplateAnchor {
                    question_id: "q1".into(),
                    start: 0.0,
                },
                TemplateAnchor {
                    question_id: "q2".into(),
                    start: 0.7,
                },
            ],
        };
        let mock = Arc::new(MockRecognizer::new(["top", "bottom"]));
        let answers = processor(GrademarkConfig::default(), mock.clone())
            .process_pages(&[page(100)], Some(&layout))
            .await
            .unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers["q2"], "bottom");
        assert_eq!(mock.region_heights(), vec![70, 30]);
    }

    #[tokio::test]
    async fn empty_layout_falls_back_to_bands() {
        let mock = Arc::new(MockRecognizer::with_fixed_response("x"));
        let answers = processor(GrademarkConfig::default(), mock)
            .process_pages(&[page(50)], Some(&LayoutTemplate::default()))
            .await
            .unwrap();
        assert_eq!(answers.len(), 5);
    }

    #[tokio::test]
    async fn engine_failure_aborts_the_sheet() {
        let mock = Arc::new(MockRecognizer::unavailable());
        let err = processor(GrademarkConfig::default(), mock)
            .process_pages(&[page(50)], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OcrError::Recognition(RecognitionEngineError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn transient_engine_failure_yields_empty_text() {
        let mock = Arc::new(MockRecognizer::broken_pipe());
        let answers = processor(GrademarkConfig::default(), mock.clone())
            .process_pages(&[page(50)], None)
            .await
            .unwrap();
        assert_eq!(answers.len(), 5);
        assert!(answers.values().all(String::is_empty));
        assert_eq!(mock.call_count(), 5);
    }

    #[tokio::test]
    async fn bytes_are_decoded_before_extraction() {
        let mut buf = Cursor::new(Vec::new());
        GrayImage::from_pixel(10, 10, Luma([255]))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        let mock = Arc::new(MockRecognizer::with_fixed_response("ok"));
        let answers = processor(GrademarkConfig::default(), mock)
            .process_answer_sheet(buf.get_ref(), None)
            .await
            .unwrap();
        assert_eq!(answers["q3"], "ok");

        let mock = Arc::new(MockRecognizer::with_fixed_response("ok"));
        let err = processor(GrademarkConfig::default(), mock)
            .process_answer_sheet(b"garbage", None)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Decode(_)));
    }
}
