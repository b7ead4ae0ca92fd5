//! The `grademark init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create grademark.toml
    if std::path::Path::new("grademark.toml").exists() {
        println!("grademark.toml already exists, skipping.");
    } else {
        std::fs::write("grademark.toml", SAMPLE_CONFIG)?;
        println!("Created grademark.toml");
    }

    // Create example exam
    std::fs::create_dir_all("exams")?;
    let example_path = std::path::Path::new("exams/example.toml");
    if example_path.exists() {
        println!("exams/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_EXAM)?;
        println!("Created exams/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit grademark.toml for your tesseract install and languages");
    println!("  2. Run: grademark validate --exam exams/example.toml");
    println!("  3. Run: grademark register --gradebook gradebook.json --exam exams/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# grademark configuration

[ocr]
tesseract_cmd = "tesseract"
languages = "eng+hin+guj"
engine_mode = 3
page_segmentation_mode = 6

[preprocess]
window_size = 11
threshold_constant = 2.0
opening_radius = 1

[segmentation]
bands = 5
search_radius = 0.05
collision = "overwrite"

[scoring]
language = "english"
"#;

const EXAMPLE_EXAM: &str = r#"[exam]
title = "Biology Unit 1"
subject = "Biology"
class_name = "10-A"

[[questions]]
question_number = 1
question_text = "What do mitochondria do?"
model_answer = "Mitochondria produce energy for the cell."
keywords = ["mitochondria", "energy"]
max_marks = 10

[[questions]]
question_number = 2
question_text = "What is photosynthesis?"
model_answer = "Photosynthesis is the process by which plants use light energy to make glucose from carbon dioxide and water."
keywords = ["light energy", "glucose", "carbon dioxide"]
max_marks = 10

[layout]
anchors = [{ question_id = "q1", start = 0.0 }, { question_id = "q2", start = 0.5 }]
"#;
