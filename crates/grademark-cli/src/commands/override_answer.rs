//! The `grademark override` command.

use std::path::PathBuf;

use anyhow::Result;

use grademark_core::gradebook::InMemoryGradebook;

pub fn execute(
    gradebook_path: PathBuf,
    answer_id: u64,
    score: Option<f64>,
    feedback: Option<String>,
) -> Result<()> {
    anyhow::ensure!(
        score.is_some() || feedback.is_some(),
        "nothing to override: pass --score and/or --feedback"
    );

    let mut gradebook = InMemoryGradebook::load_json(&gradebook_path)?;
    let total = gradebook.override_answer(answer_id, score, feedback)?;
    gradebook.save_json(&gradebook_path)?;

    println!("Answer {answer_id} updated. Sheet total: {total:.1}");
    Ok(())
}
