//! Core data model types for grademark.
//!
//! Exams, questions, answer sheets and answers as the gradebook stores them,
//! plus the definition types an exam is created from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An exam registered in the gradebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub class_name: String,
    /// Marks the whole exam is scored out of.
    pub total_marks: f64,
    /// Optional layout used for template-guided segmentation of this exam's sheets.
    #[serde(default)]
    pub layout: Option<LayoutTemplate>,
    pub created_at: DateTime<Utc>,
}

/// A question of an exam, carrying everything needed to score an answer to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub exam_id: u64,
    /// 1-based position on the answer sheet.
    pub question_number: u32,
    #[serde(default)]
    pub question_text: String,
    pub model_answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub max_marks: f64,
}

impl Question {
    /// Region identifier the segmenter assigns to this question's answer area.
    pub fn region_id(&self) -> String {
        region_id(self.question_number)
    }

    /// The immutable scoring input for this question.
    pub fn reference(&self) -> QuestionReference {
        QuestionReference {
            model_answer: self.model_answer.clone(),
            keywords: self.keywords.clone(),
            max_marks: self.max_marks,
        }
    }
}

/// Region identifier for the `number`th answer area (`q1`, `q2`, ...).
pub fn region_id(number: u32) -> String {
    format!("q{number}")
}

/// One student's submitted document for one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSheet {
    pub id: u64,
    pub exam_id: u64,
    pub student_id: String,
    pub student_name: String,
    #[serde(default)]
    pub file_path: String,
    /// Set once an evaluation pass has scored every answer.
    #[serde(default)]
    pub processed: bool,
    /// Sum of per-answer scores; `None` until the sheet is evaluated.
    #[serde(default)]
    pub total_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// The answer to one question on one answer sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: u64,
    pub answer_sheet_id: u64,
    pub question_id: u64,
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
    /// Set when a teacher overrides the automated score or feedback.
    #[serde(default)]
    pub teacher_reviewed: bool,
}

/// Immutable input to scoring: model answer, required keywords, and the ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionReference {
    pub model_answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub max_marks: f64,
}

/// Ordered anchors describing where each answer area starts on a page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutTemplate {
    #[serde(default)]
    pub anchors: Vec<TemplateAnchor>,
}

/// Expected start of one question's answer area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateAnchor {
    pub question_id: String,
    /// Fraction of the page height, in `[0, 1]`.
    pub start: f64,
}

/// An exam as authored, before the gradebook assigns ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamDefinition {
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub class_name: String,
    /// Defaults to the sum of the questions' max marks.
    #[serde(default)]
    pub total_marks: Option<f64>,
    #[serde(default)]
    pub questions: Vec<QuestionDefinition>,
    #[serde(default)]
    pub layout: Option<LayoutTemplate>,
}

impl ExamDefinition {
    /// Total marks as declared, or the sum of question marks.
    pub fn effective_total_marks(&self) -> f64 {
        self.total_marks
            .unwrap_or_else(|| self.questions.iter().map(|q| q.max_marks).sum())
    }
}

/// A question as authored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub question_number: u32,
    #[serde(default)]
    pub question_text: String,
    pub model_answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub max_marks: f64,
}
