//! The `grademark register` command.

use std::path::PathBuf;

use anyhow::Result;

use grademark_core::gradebook::InMemoryGradebook;
use grademark_core::parser;

pub fn execute(gradebook_path: PathBuf, exam_path: PathBuf) -> Result<()> {
    let definition = parser::parse_exam(&exam_path)?;
    for w in parser::validate_exam(&definition) {
        eprintln!("WARNING: {}", w.message);
    }

    let mut gradebook = InMemoryGradebook::load_or_default(&gradebook_path)?;
    let title = definition.title.clone();
    let question_count = definition.questions.len();
    let total_marks = definition.effective_total_marks();

    let exam_id = gradebook.add_exam(definition);
    gradebook.save_json(&gradebook_path)?;

    println!(
        "Registered exam {exam_id}: {title} ({question_count} questions, {total_marks} marks)"
    );
    Ok(())
}
