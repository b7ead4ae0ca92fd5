//! Automated answer scoring.
//!
//! A score blends keyword coverage (60%) with TF-IDF similarity to the model
//! answer (40%), scaled to the question's marks and rounded to one decimal.

use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;
use crate::model::QuestionReference;
use crate::similarity::{tfidf_cosine, Similarity};
use crate::text::TextNormalizer;

/// Weight of the keyword ratio in the composite score.
pub const KEYWORD_WEIGHT: f64 = 0.6;
/// Weight of the similarity in the composite score.
pub const SIMILARITY_WEIGHT: f64 = 0.4;
/// Feedback for blank answers.
pub const NO_ANSWER_FEEDBACK: &str = "No answer provided.";

const DIFFERS_FEEDBACK: &str = "Your answer differs significantly from the expected response.";
const PARTIAL_FEEDBACK: &str = "Your answer partially addresses the question.";
const ALIGNS_FEEDBACK: &str = "Your answer aligns well with the expected response.";
const TOO_BRIEF_FEEDBACK: &str = "Your answer is too brief. Consider providing more details.";
const TOO_LONG_FEEDBACK: &str = "Your answer is unnecessarily long. Try to be more concise.";

/// Similarity this close to 1 counts as a perfect match.
const PERFECT_SIMILARITY_EPSILON: f64 = 1e-9;

/// Result of scoring one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    /// Always within `[0, max_marks]`.
    pub score: f64,
    pub feedback: String,
    /// Keywords found in the answer, in reference order, as written in the reference.
    pub matched_keywords: Vec<String>,
    pub keyword_ratio: f64,
    pub similarity: f64,
}

impl ScoredAnswer {
    fn blank() -> Self {
        Self {
            score: 0.0,
            feedback: NO_ANSWER_FEEDBACK.to_string(),
            matched_keywords: Vec::new(),
            keyword_ratio: 0.0,
            similarity: 0.0,
        }
    }
}

/// Keyword coverage of an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    /// `matched / total`, 0 for an empty keyword list.
    pub ratio: f64,
}

/// Scores student answers against question references.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    normalizer: TextNormalizer,
}

impl ScoringEngine {
    pub fn new(normalizer: TextNormalizer) -> Self {
        Self { normalizer }
    }

    /// Score an answer against a question reference.
    pub fn evaluate(
        &self,
        student_answer: &str,
        reference: &QuestionReference,
    ) -> Result<ScoredAnswer, EvaluationError> {
        self.evaluate_answer(
            student_answer,
            &reference.model_answer,
            &reference.keywords,
            reference.max_marks,
        )
    }

    /// Score `student_answer` out of `max_marks`.
    pub fn evaluate_answer(
        &self,
        student_answer: &str,
        model_answer: &str,
        keywords: &[String],
        max_marks: f64,
    ) -> Result<ScoredAnswer, EvaluationError> {
        if !max_marks.is_finite() {
            return Err(EvaluationError::NonFiniteMaxMarks);
        }
        if max_marks < 0.0 {
            return Err(EvaluationError::NegativeMaxMarks(max_marks));
        }
        if student_answer.trim().is_empty() {
            return Ok(ScoredAnswer::blank());
        }

        let normalized_answer = self.normalizer.normalize(student_answer);
        let keyword_match = self.match_normalized(&normalized_answer, keywords);
        let similarity = match tfidf_cosine(&self.normalizer.normalize(model_answer), &normalized_answer) {
            Similarity::Computed(v) if v >= 1.0 - PERFECT_SIMILARITY_EPSILON => 1.0,
            other => other.value(),
        };

        let perfect = !keywords.is_empty() && keyword_match.ratio >= 1.0 && similarity >= 1.0;
        let score = composite_score(keyword_match.ratio, similarity, max_marks, perfect);

        tracing::debug!(
            keyword_ratio = keyword_match.ratio,
            similarity,
            score,
            max_marks,
            "answer scored"
        );

        Ok(ScoredAnswer {
            score,
            feedback: feedback(student_answer, model_answer, &keyword_match.missing, similarity),
            matched_keywords: keyword_match.matched,
            keyword_ratio: keyword_match.ratio,
            similarity,
        })
    }

    /// Which keywords appear, as normalized contiguous substrings, in the answer.
    pub fn match_keywords(&self, student_answer: &str, keywords: &[String]) -> KeywordMatch {
        self.match_normalized(&self.normalizer.normalize(student_answer), keywords)
    }

    fn match_normalized(&self, normalized_answer: &str, keywords: &[String]) -> KeywordMatch {
        let (matched, missing): (Vec<String>, Vec<String>) = keywords
            .iter()
            .cloned()
            .partition(|keyword| normalized_answer.contains(&self.normalizer.normalize(keyword)));

        let ratio = if keywords.is_empty() {
            0.0
        } else {
            matched.len() as f64 / keywords.len() as f64
        };

        KeywordMatch {
            matched,
            missing,
            ratio,
        }
    }
}

/// Weighted score rounded to one decimal and capped at `max_marks`.
///
/// Full marks are reserved for perfect answers: an imperfect answer that
/// rounds up to the ceiling is held one rounding step below it.
fn composite_score(keyword_ratio: f64, similarity: f64, max_marks: f64, perfect: bool) -> f64 {
    let raw = (KEYWORD_WEIGHT * keyword_ratio + SIMILARITY_WEIGHT * similarity) * max_marks;
    let rounded = round_to(raw, 1).min(max_marks);
    if rounded >= max_marks && !perfect {
        let below = ((max_marks * 10.0).ceil() - 1.0) / 10.0;
        return below.max(0.0).min(rounded);
    }
    rounded.max(0.0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn feedback(student_answer: &str, model_answer: &str, missing: &[String], similarity: f64) -> String {
    let mut parts = Vec::new();

    if !missing.is_empty() {
        parts.push(format!(
            "Your answer is missing key concepts: {}.",
            missing.join(", ")
        ));
    }

    parts.push(
        if similarity < 0.3 {
            DIFFERS_FEEDBACK
        } else if similarity < 0.6 {
            PARTIAL_FEEDBACK
        } else {
            ALIGNS_FEEDBACK
        }
        .to_string(),
    );

    let student_len = student_answer.split_whitespace().count() as f64;
    let model_len = model_answer.split_whitespace().count() as f64;
    if student_len < model_len * 0.5 {
        parts.push(TOO_BRIEF_FEEDBACK.to_string());
    } else if student_len > model_len * 2.0 {
        parts.push(TOO_LONG_FEEDBACK.to_string());
    }

    parts.join(" ")
}
