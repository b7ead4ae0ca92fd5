//! The `grademark evaluate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use grademark_core::config::load_config_from;
use grademark_core::gradebook::{GradebookView, InMemoryGradebook};
use grademark_core::scoring::ScoringEngine;
use grademark_core::text::TextNormalizer;

pub fn execute(gradebook_path: PathBuf, sheet_id: u64, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let engine = ScoringEngine::new(TextNormalizer::new(config.scoring.language));

    let mut gradebook = InMemoryGradebook::load_json(&gradebook_path)?;
    let result = gradebook.evaluate_answer_sheet(sheet_id, &engine)?;
    gradebook.save_json(&gradebook_path)?;

    let mut table = Table::new();
    table.set_header(vec!["Answer", "Question", "Score", "Feedback"]);
    for answer in gradebook.answers_for_sheet(sheet_id) {
        let question = gradebook.question(answer.question_id);
        table.add_row(vec![
            Cell::new(answer.id),
            Cell::new(question.map_or_else(|| "?".to_string(), |q| format!("q{}", q.question_number))),
            Cell::new(format!(
                "{:.1} / {}",
                answer.score.unwrap_or(0.0),
                question.map_or(0.0, |q| q.max_marks)
            )),
            Cell::new(answer.feedback.as_deref().unwrap_or("")),
        ]);
    }

    println!("{table}");
    println!(
        "Total: {:.1} / {} ({:.2}%)",
        result.total_score, result.max_score, result.percentage
    );
    Ok(())
}
