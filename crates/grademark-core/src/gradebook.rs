//! Storage of exams, answer sheets and answers.
//!
//! [`GradebookView`] is the read side the statistics module aggregates over.
//! [`InMemoryGradebook`] is the store the CLI persists as a JSON snapshot.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{EvaluationError, GradebookError};
use crate::model::{region_id, Answer, AnswerSheet, Exam, ExamDefinition, Question};
use crate::scoring::ScoringEngine;

/// Read access to gradebook records.
pub trait GradebookView {
    fn exam(&self, exam_id: u64) -> Option<&Exam>;

    /// Questions of an exam ordered by question number.
    fn questions_for_exam(&self, exam_id: u64) -> Vec<&Question>;

    /// Answer sheets submitted for an exam, oldest first.
    fn answer_sheets_for_exam(&self, exam_id: u64) -> Vec<&AnswerSheet>;

    /// Answer sheets submitted by a student, oldest first.
    fn answer_sheets_for_student(&self, student_id: &str) -> Vec<&AnswerSheet>;

    /// Answers on one sheet.
    fn answers_for_sheet(&self, sheet_id: u64) -> Vec<&Answer>;
}

/// Outcome of scoring a whole answer sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetEvaluation {
    pub sheet_id: u64,
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
}

/// Gradebook held in memory and snapshotted to JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryGradebook {
    #[serde(default)]
    exams: BTreeMap<u64, Exam>,
    #[serde(default)]
    questions: BTreeMap<u64, Question>,
    #[serde(default)]
    answer_sheets: BTreeMap<u64, AnswerSheet>,
    #[serde(default)]
    answers: BTreeMap<u64, Answer>,
    #[serde(default)]
    next_id: u64,
}

impl InMemoryGradebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`save_json`](Self::save_json).
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read gradebook: {}", path.display()))?;
        let gradebook: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse gradebook: {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            exams = gradebook.exams.len(),
            sheets = gradebook.answer_sheets.len(),
            "gradebook loaded"
        );
        Ok(gradebook)
    }

    /// Load a snapshot, or start empty when the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_json(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize gradebook")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write gradebook: {}", path.display()))?;
        Ok(())
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn exams(&self) -> impl Iterator<Item = &Exam> {
        self.exams.values()
    }

    pub fn question(&self, question_id: u64) -> Option<&Question> {
        self.questions.get(&question_id)
    }

    pub fn answer_sheet(&self, sheet_id: u64) -> Option<&AnswerSheet> {
        self.answer_sheets.get(&sheet_id)
    }

    pub fn answer(&self, answer_id: u64) -> Option<&Answer> {
        self.answers.get(&answer_id)
    }

    /// Register an exam and its questions, returning the exam id.
    pub fn add_exam(&mut self, definition: ExamDefinition) -> u64 {
        let exam_id = self.allocate_id();
        let total_marks = definition.effective_total_marks();

        for q in definition.questions {
            let id = self.allocate_id();
            self.questions.insert(
                id,
                Question {
                    id,
                    exam_id,
                    question_number: q.question_number,
                    question_text: q.question_text,
                    model_answer: q.model_answer,
                    keywords: q.keywords,
                    max_marks: q.max_marks,
                },
            );
        }

        self.exams.insert(
            exam_id,
            Exam {
                id: exam_id,
                title: definition.title,
                subject: definition.subject,
                class_name: definition.class_name,
                total_marks,
                layout: definition.layout,
                created_at: Utc::now(),
            },
        );

        tracing::info!(exam_id, total_marks, "exam registered");
        exam_id
    }

    /// Store an uploaded sheet with one answer per exam question.
    ///
    /// Questions with no extracted region get an empty answer.
    pub fn record_answer_sheet(
        &mut self,
        exam_id: u64,
        student_id: &str,
        student_name: &str,
        file_path: &str,
        extracted: &BTreeMap<String, String>,
    ) -> Result<u64, GradebookError> {
        if !self.exams.contains_key(&exam_id) {
            return Err(GradebookError::ExamNotFound(exam_id));
        }

        let sheet_id = self.allocate_id();
        let question_slots: Vec<(u64, String)> = self
            .questions_for_exam(exam_id)
            .into_iter()
            .map(|q| (q.id, region_id(q.question_number)))
            .collect();

        for (question_id, region) in question_slots {
            let id = self.allocate_id();
            self.answers.insert(
                id,
                Answer {
                    id,
                    answer_sheet_id: sheet_id,
                    question_id,
                    extracted_text: extracted.get(&region).cloned().unwrap_or_default(),
                    score: None,
                    feedback: None,
                    teacher_reviewed: false,
                },
            );
        }

        self.answer_sheets.insert(
            sheet_id,
            AnswerSheet {
                id: sheet_id,
                exam_id,
                student_id: student_id.to_string(),
                student_name: student_name.to_string(),
                file_path: file_path.to_string(),
                processed: false,
                total_score: None,
                created_at: Utc::now(),
            },
        );

        tracing::info!(sheet_id, exam_id, student_id, "answer sheet recorded");
        Ok(sheet_id)
    }

    /// Score every answer on a sheet and store the results.
    ///
    /// Answers a teacher has already reviewed keep their score and feedback.
    /// Nothing is written unless every answer scores successfully.
    pub fn evaluate_answer_sheet(
        &mut self,
        sheet_id: u64,
        engine: &ScoringEngine,
    ) -> Result<SheetEvaluation, GradebookError> {
        let sheet = self
            .answer_sheets
            .get(&sheet_id)
            .ok_or(GradebookError::AnswerSheetNotFound(sheet_id))?;
        if !self.exams.contains_key(&sheet.exam_id) {
            return Err(GradebookError::ExamNotFound(sheet.exam_id));
        }
        // out of the marks actually on offer, not the declared exam total
        let max_score: f64 = self
            .questions_for_exam(sheet.exam_id)
            .iter()
            .map(|q| q.max_marks)
            .sum();

        let mut updates = Vec::new();
        for answer in self.answers_for_sheet(sheet_id) {
            if answer.teacher_reviewed {
                continue;
            }
            let question = self
                .questions
                .get(&answer.question_id)
                .ok_or(GradebookError::QuestionNotFound(answer.question_id))?;
            let scored = engine.evaluate(&answer.extracted_text, &question.reference())?;
            tracing::debug!(
                answer_id = answer.id,
                question_number = question.question_number,
                score = scored.score,
                "answer evaluated"
            );
            updates.push((answer.id, scored.score, scored.feedback));
        }

        for (answer_id, score, feedback) in updates {
            if let Some(answer) = self.answers.get_mut(&answer_id) {
                answer.score = Some(score);
                answer.feedback = Some(feedback);
            }
        }

        let total_score = self.sheet_total(sheet_id);
        if let Some(sheet) = self.answer_sheets.get_mut(&sheet_id) {
            sheet.total_score = Some(total_score);
            sheet.processed = true;
        }

        let percentage = percentage_of(total_score, max_score);
        tracing::info!(sheet_id, total_score, max_score, percentage, "answer sheet evaluated");

        Ok(SheetEvaluation {
            sheet_id,
            total_score,
            max_score,
            percentage,
        })
    }

    /// Apply a teacher's score and/or feedback to one answer.
    ///
    /// Returns the sheet's recomputed total.
    pub fn override_answer(
        &mut self,
        answer_id: u64,
        score: Option<f64>,
        feedback: Option<String>,
    ) -> Result<f64, GradebookError> {
        let answer = self
            .answers
            .get(&answer_id)
            .ok_or(GradebookError::AnswerNotFound(answer_id))?;
        let sheet_id = answer.answer_sheet_id;

        if let Some(score) = score {
            let question = self
                .questions
                .get(&answer.question_id)
                .ok_or(GradebookError::QuestionNotFound(answer.question_id))?;
            let max_marks = question.max_marks;
            if !score.is_finite() || score < 0.0 || score > max_marks {
                return Err(EvaluationError::ScoreOutOfRange { score, max_marks }.into());
            }
        }

        if let Some(answer) = self.answers.get_mut(&answer_id) {
            if let Some(score) = score {
                answer.score = Some(score);
            }
            if let Some(feedback) = feedback {
                answer.feedback = Some(feedback);
            }
            answer.teacher_reviewed = true;
        }

        let total = self.sheet_total(sheet_id);
        if let Some(sheet) = self.answer_sheets.get_mut(&sheet_id) {
            sheet.total_score = Some(total);
        }

        tracing::info!(answer_id, sheet_id, total, "answer overridden");
        Ok(total)
    }

    /// Sum of the current per-answer scores on a sheet.
    fn sheet_total(&self, sheet_id: u64) -> f64 {
        self.answers_for_sheet(sheet_id)
            .iter()
            .filter_map(|a| a.score)
            .sum()
    }
}

impl GradebookView for InMemoryGradebook {
    fn exam(&self, exam_id: u64) -> Option<&Exam> {
        self.exams.get(&exam_id)
    }

    fn questions_for_exam(&self, exam_id: u64) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self
            .questions
            .values()
            .filter(|q| q.exam_id == exam_id)
            .collect();
        questions.sort_by_key(|q| (q.question_number, q.id));
        questions
    }

    fn answer_sheets_for_exam(&self, exam_id: u64) -> Vec<&AnswerSheet> {
        self.answer_sheets
            .values()
            .filter(|s| s.exam_id == exam_id)
            .collect()
    }

    fn answer_sheets_for_student(&self, student_id: &str) -> Vec<&AnswerSheet> {
        self.answer_sheets
            .values()
            .filter(|s| s.student_id == student_id)
            .collect()
    }

    fn answers_for_sheet(&self, sheet_id: u64) -> Vec<&Answer> {
        self.answers
            .values()
            .filter(|a| a.answer_sheet_id == sheet_id)
            .collect()
    }
}

/// `value / total × 100` rounded to two decimals; 0 for a zero total.
pub(crate) fn percentage_of(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        round2(value / total * 100.0)
    } else {
        0.0
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
