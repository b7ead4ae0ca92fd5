//! The `grademark extract` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use grademark_core::config::load_config_from;
use grademark_core::parser;
use grademark_ocr::{AnswerSheetProcessor, TesseractRecognizer};

pub async fn execute(
    file: PathBuf,
    exam_path: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let layout = match &exam_path {
        Some(path) => parser::parse_exam(path)?.layout,
        None => None,
    };

    let recognizer = Arc::new(TesseractRecognizer::new(config.ocr.clone()));
    let processor = AnswerSheetProcessor::new(&config, recognizer);
    let answers = processor
        .process_file(&file, layout.as_ref())
        .await
        .with_context(|| format!("failed to extract answers from {}", file.display()))?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&answers)?),
        _ => {
            for (question_id, text) in &answers {
                println!("[{question_id}]");
                println!("{text}\n");
            }
        }
    }

    Ok(())
}
