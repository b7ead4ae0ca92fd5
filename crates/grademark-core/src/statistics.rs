//! Exam and student statistics.
//!
//! Computed on every call from a [`GradebookView`]; nothing is cached.

use serde::{Deserialize, Serialize};

use crate::gradebook::{percentage_of, round2, GradebookView};
use crate::model::Question;

/// Histogram labels, lowest bucket first.
pub const BUCKET_LABELS: [&str; 6] = ["0-35%", "35-50%", "50-60%", "60-75%", "75-90%", "90-100%"];

/// Lower bounds of buckets 1..=5; bucket 0 starts at 0.
const BUCKET_LOWER_BOUNDS: [f64; 5] = [35.0, 50.0, 60.0, 75.0, 90.0];

/// Six-bucket histogram of sheet percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub ranges: Vec<String>,
    pub counts: Vec<u32>,
}

impl Default for ScoreDistribution {
    fn default() -> Self {
        Self {
            ranges: BUCKET_LABELS.iter().map(|l| l.to_string()).collect(),
            counts: vec![0; BUCKET_LABELS.len()],
        }
    }
}

impl ScoreDistribution {
    pub fn from_percentages(percentages: impl IntoIterator<Item = f64>) -> Self {
        let mut distribution = Self::default();
        for p in percentages {
            distribution.counts[bucket_index(p)] += 1;
        }
        distribution
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

/// Bucket for a percentage. Values below 0 fall into the first bucket and
/// values above 100 (or NaN) into the last.
fn bucket_index(percentage: f64) -> usize {
    BUCKET_LOWER_BOUNDS
        .iter()
        .position(|&lower| percentage < lower)
        .unwrap_or(BUCKET_LOWER_BOUNDS.len())
}

/// Per-question aggregate over an exam's answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStatistics {
    pub question_number: u32,
    pub max_marks: f64,
    pub avg_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub avg_percentage: f64,
}

/// Aggregate results for one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamStatistics {
    pub exam_id: u64,
    pub exam_title: String,
    pub subject: String,
    pub class_name: String,
    pub total_marks: f64,
    pub total_students: usize,
    pub completed_evaluations: usize,
    pub avg_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub score_distribution: ScoreDistribution,
    pub question_stats: Vec<QuestionStatistics>,
}

/// One question on one of a student's sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_number: u32,
    pub max_marks: f64,
    pub score: Option<f64>,
    pub percentage: f64,
    pub feedback: Option<String>,
}

/// One of a student's exams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub exam_id: u64,
    pub exam_title: String,
    pub subject: String,
    /// Submission date, `YYYY-MM-DD`.
    pub date: String,
    pub total_marks: f64,
    pub score: Option<f64>,
    pub percentage: f64,
    pub processed: bool,
    pub question_results: Vec<QuestionResult>,
}

/// Everything recorded for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentStatistics {
    pub student_id: String,
    pub student_name: String,
    pub exam_count: usize,
    pub exam_results: Vec<ExamResult>,
}

/// Statistics for an exam, or `None` if the exam does not exist.
pub fn exam_statistics(view: &impl GradebookView, exam_id: u64) -> Option<ExamStatistics> {
    let exam = view.exam(exam_id)?;
    let sheets = view.answer_sheets_for_exam(exam_id);

    let totals: Vec<f64> = sheets.iter().filter_map(|s| s.total_score).collect();
    let (avg_score, max_score, min_score) = summarize(&totals);
    let score_distribution = ScoreDistribution::from_percentages(
        totals.iter().map(|&t| raw_percentage(t, exam.total_marks)),
    );

    let question_stats = view
        .questions_for_exam(exam_id)
        .into_iter()
        .map(|question| {
            let scores: Vec<f64> = sheets
                .iter()
                .flat_map(|s| view.answers_for_sheet(s.id))
                .filter(|a| a.question_id == question.id)
                .filter_map(|a| a.score)
                .collect();
            question_statistics(question, &scores)
        })
        .collect();

    let stats = ExamStatistics {
        exam_id,
        exam_title: exam.title.clone(),
        subject: exam.subject.clone(),
        class_name: exam.class_name.clone(),
        total_marks: exam.total_marks,
        total_students: sheets.len(),
        completed_evaluations: sheets.iter().filter(|s| s.processed).count(),
        avg_score,
        max_score,
        min_score,
        score_distribution,
        question_stats,
    };
    tracing::debug!(
        exam_id,
        total_students = stats.total_students,
        completed = stats.completed_evaluations,
        "exam statistics computed"
    );
    Some(stats)
}

/// Statistics for a student, or `None` if they have no answer sheets.
pub fn student_statistics(view: &impl GradebookView, student_id: &str) -> Option<StudentStatistics> {
    let sheets = view.answer_sheets_for_student(student_id);
    let student_name = sheets.first()?.student_name.clone();

    let mut exam_results = Vec::with_capacity(sheets.len());
    for sheet in &sheets {
        let Some(exam) = view.exam(sheet.exam_id) else {
            tracing::warn!(sheet_id = sheet.id, exam_id = sheet.exam_id, "skipping sheet of unknown exam");
            continue;
        };

        let answers = view.answers_for_sheet(sheet.id);
        let question_results = view
            .questions_for_exam(exam.id)
            .into_iter()
            .map(|question| {
                let answer = answers.iter().find(|a| a.question_id == question.id);
                let score = answer.and_then(|a| a.score);
                QuestionResult {
                    question_number: question.question_number,
                    max_marks: question.max_marks,
                    score,
                    percentage: score.map_or(0.0, |s| percentage_of(s, question.max_marks)),
                    feedback: answer.and_then(|a| a.feedback.clone()),
                }
            })
            .collect();

        let percentage = match sheet.total_score {
            Some(total) if sheet.processed => percentage_of(total, exam.total_marks),
            _ => 0.0,
        };

        exam_results.push(ExamResult {
            exam_id: exam.id,
            exam_title: exam.title.clone(),
            subject: exam.subject.clone(),
            date: sheet.created_at.format("%Y-%m-%d").to_string(),
            total_marks: exam.total_marks,
            score: sheet.total_score,
            percentage,
            processed: sheet.processed,
            question_results,
        });
    }

    Some(StudentStatistics {
        student_id: student_id.to_string(),
        student_name,
        exam_count: exam_results.len(),
        exam_results,
    })
}

fn question_statistics(question: &Question, scores: &[f64]) -> QuestionStatistics {
    let (avg_score, max_score, min_score) = summarize(scores);
    QuestionStatistics {
        question_number: question.question_number,
        max_marks: question.max_marks,
        avg_score,
        max_score,
        min_score,
        avg_percentage: percentage_of(avg_score, question.max_marks),
    }
}

/// Rounded mean with raw max and min; all zero for no values.
fn summarize(values: &[f64]) -> (f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    (round2(mean), max, min)
}

/// Unrounded percentage for bucketing; a zero total reads as 0%.
fn raw_percentage(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}
