//! The `grademark stats` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use grademark_core::gradebook::InMemoryGradebook;
use grademark_core::statistics::{
    exam_statistics, student_statistics, ExamStatistics, StudentStatistics,
};

pub fn execute(
    gradebook_path: PathBuf,
    exam_id: Option<u64>,
    student_id: Option<String>,
    format: String,
) -> Result<()> {
    let gradebook = InMemoryGradebook::load_json(&gradebook_path)?;

    match (exam_id, student_id) {
        (Some(exam_id), _) => {
            let stats = exam_statistics(&gradebook, exam_id)
                .with_context(|| format!("exam not found: {exam_id}"))?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
                _ => print_exam(&stats),
            }
        }
        (None, Some(student_id)) => {
            let stats = student_statistics(&gradebook, &student_id)
                .with_context(|| format!("no answer sheets for student: {student_id}"))?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
                _ => print_student(&stats),
            }
        }
        (None, None) => anyhow::bail!("pass --exam or --student"),
    }

    Ok(())
}

fn print_exam(stats: &ExamStatistics) {
    println!(
        "{} ({} {}) - {} marks",
        stats.exam_title, stats.subject, stats.class_name, stats.total_marks
    );
    println!(
        "Students: {}  Evaluated: {}  Avg: {:.2}  Max: {}  Min: {}",
        stats.total_students,
        stats.completed_evaluations,
        stats.avg_score,
        stats.max_score,
        stats.min_score
    );

    let mut distribution = Table::new();
    distribution.set_header(stats.score_distribution.ranges.clone());
    distribution.add_row(stats.score_distribution.counts.clone());
    println!("\n{distribution}");

    let mut questions = Table::new();
    questions.set_header(vec!["Question", "Max", "Avg", "High", "Low", "Avg %"]);
    for q in &stats.question_stats {
        questions.add_row(vec![
            Cell::new(format!("q{}", q.question_number)),
            Cell::new(q.max_marks),
            Cell::new(format!("{:.2}", q.avg_score)),
            Cell::new(q.max_score),
            Cell::new(q.min_score),
            Cell::new(format!("{:.2}%", q.avg_percentage)),
        ]);
    }
    println!("\n{questions}");
}

fn print_student(stats: &StudentStatistics) {
    println!(
        "{} ({}) - {} exam(s)",
        stats.student_name, stats.student_id, stats.exam_count
    );

    let mut table = Table::new();
    table.set_header(vec!["Exam", "Subject", "Date", "Score", "Percentage", "Status"]);
    for r in &stats.exam_results {
        table.add_row(vec![
            Cell::new(&r.exam_title),
            Cell::new(&r.subject),
            Cell::new(&r.date),
            Cell::new(
                r.score
                    .map_or_else(|| "-".to_string(), |s| format!("{s:.1} / {}", r.total_marks)),
            ),
            Cell::new(format!("{:.2}%", r.percentage)),
            Cell::new(if r.processed { "evaluated" } else { "pending" }),
        ]);
    }
    println!("{table}");
}
