//! The `grademark upload` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use grademark_core::config::load_config_from;
use grademark_core::gradebook::{GradebookView, InMemoryGradebook};
use grademark_ocr::{AnswerSheetProcessor, TesseractRecognizer};

pub async fn execute(
    gradebook_path: PathBuf,
    exam_id: u64,
    student_id: String,
    student_name: String,
    file: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let mut gradebook = InMemoryGradebook::load_json(&gradebook_path)?;
    let layout = gradebook
        .exam(exam_id)
        .with_context(|| format!("exam not found: {exam_id}"))?
        .layout
        .clone();

    let recognizer = Arc::new(TesseractRecognizer::new(config.ocr.clone()));
    let processor = AnswerSheetProcessor::new(&config, recognizer);
    let extracted = processor
        .process_file(&file, layout.as_ref())
        .await
        .with_context(|| format!("failed to extract answers from {}", file.display()))?;

    let sheet_id = gradebook.record_answer_sheet(
        exam_id,
        &student_id,
        &student_name,
        &file.display().to_string(),
        &extracted,
    )?;
    gradebook.save_json(&gradebook_path)?;

    println!("Recorded answer sheet {sheet_id} for {student_name} ({student_id})");
    for answer in gradebook.answers_for_sheet(sheet_id) {
        let words = answer.extracted_text.split_whitespace().count();
        println!("  answer {}: {words} word(s) extracted", answer.id);
    }
    Ok(())
}
