//! TOML exam definition parser.
//!
//! Loads exam definitions from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{ExamDefinition, LayoutTemplate, QuestionDefinition, TemplateAnchor};
use crate::text::TextNormalizer;

/// Intermediate TOML structure for parsing exam files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
    #[serde(default)]
    layout: Option<TomlLayout>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    title: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    class_name: String,
    #[serde(default)]
    total_marks: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    question_number: u32,
    #[serde(default)]
    question_text: String,
    model_answer: String,
    #[serde(default)]
    keywords: Vec<String>,
    max_marks: f64,
}

#[derive(Debug, Deserialize)]
struct TomlLayout {
    #[serde(default)]
    anchors: Vec<TomlAnchor>,
}

#[derive(Debug, Deserialize)]
struct TomlAnchor {
    question_id: String,
    start: f64,
}

/// Parse a single TOML file into an `ExamDefinition`.
pub fn parse_exam(path: &Path) -> Result<ExamDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, path)
}

/// Parse a TOML string into an `ExamDefinition` (useful for testing).
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<ExamDefinition> {
    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| QuestionDefinition {
            question_number: q.question_number,
            question_text: q.question_text,
            model_answer: q.model_answer,
            keywords: q.keywords,
            max_marks: q.max_marks,
        })
        .collect();

    let layout = parsed.layout.map(|l| LayoutTemplate {
        anchors: l
            .anchors
            .into_iter()
            .map(|a| TemplateAnchor {
                question_id: a.question_id,
                start: a.start,
            })
            .collect(),
    });

    Ok(ExamDefinition {
        title: parsed.exam.title,
        subject: parsed.exam.subject,
        class_name: parsed.exam.class_name,
        total_marks: parsed.exam.total_marks,
        questions,
        layout,
    })
}

/// Recursively load all `.toml` exam files from a directory.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<ExamDefinition>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exam(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(exams)
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question number (if applicable).
    pub question_number: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Validate an exam definition for common authoring mistakes.
pub fn validate_exam(exam: &ExamDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if exam.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_number: None,
            message: "exam has no questions".into(),
        });
    }

    // Duplicate question numbers collapse onto one region id
    let mut seen = std::collections::HashSet::new();
    for q in &exam.questions {
        if !seen.insert(q.question_number) {
            warnings.push(ValidationWarning {
                question_number: Some(q.question_number),
                message: format!("duplicate question number: {}", q.question_number),
            });
        }
    }

    let normalizer = TextNormalizer::default();
    for q in &exam.questions {
        if q.model_answer.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_number: Some(q.question_number),
                message: "model_answer is empty".into(),
            });
        }
        if q.keywords.is_empty() {
            warnings.push(ValidationWarning {
                question_number: Some(q.question_number),
                message: "no keywords; keyword coverage will always be 0".into(),
            });
        }
        // an empty normalized keyword is a substring of every answer
        for keyword in &q.keywords {
            if normalizer.normalize(keyword).is_empty() {
                warnings.push(ValidationWarning {
                    question_number: Some(q.question_number),
                    message: format!(
                        "keyword {keyword:?} has no content words and always matches"
                    ),
                });
            }
        }
        if !q.max_marks.is_finite() || q.max_marks < 0.0 {
            warnings.push(ValidationWarning {
                question_number: Some(q.question_number),
                message: format!("max_marks must be a non-negative number, got {}", q.max_marks),
            });
        }
    }

    if let Some(total) = exam.total_marks {
        let sum: f64 = exam.questions.iter().map(|q| q.max_marks).sum();
        if (total - sum).abs() > 1e-9 {
            warnings.push(ValidationWarning {
                question_number: None,
                message: format!("total_marks {total} differs from the question sum {sum}"),
            });
        }
    }

    if let Some(layout) = &exam.layout {
        for anchor in &layout.anchors {
            if !(0.0..=1.0).contains(&anchor.start) {
                warnings.push(ValidationWarning {
                    question_number: None,
                    message: format!(
                        "layout anchor {} starts outside the page: {}",
                        anchor.question_id, anchor.start
                    ),
                });
            }
        }
        if layout
            .anchors
            .windows(2)
            .any(|pair| pair[1].start <= pair[0].start)
        {
            warnings.push(ValidationWarning {
                question_number: None,
                message: "layout anchors are not in ascending order".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[exam]
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
question_text = "Define osmosis."
model_answer = "Osmosis is the movement of water across a semi-permeable membrane."
keywords = ["water", "membrane"]
max_marks = 5

[layout]
anchors = [{ question_id = "q1", start = 0.0 }, { question_id = "q2", start = 0.5 }]
"#;

    #[test]
    fn parse_valid_toml() {
        let exam = parse_exam_str(VALID_TOML, &PathBuf::from("bio.toml")).unwrap();
        assert_eq!(exam.title, "Biology Unit 1");
        assert_eq!(exam.questions.len(), 2);
        assert_eq!(exam.questions[0].keywords, vec!["mitochondria", "energy"]);
        assert_eq!(exam.effective_total_marks(), 15.0);
        let layout = exam.layout.as_ref().unwrap();
        assert_eq!(layout.anchors[1].question_id, "q2");
        assert_eq!(layout.anchors[1].start, 0.5);
        assert!(validate_exam(&exam).is_empty());
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
[exam]
title = "Minimal"

[[questions]]
question_number = 1
model_answer = "Answer"
max_marks = 2
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("min.toml")).unwrap();
        assert!(exam.subject.is_empty());
        assert!(exam.total_marks.is_none());
        assert!(exam.layout.is_none());
        assert!(exam.questions[0].keywords.is_empty());
    }

    #[test]
    fn validate_duplicate_numbers() {
        let toml = r#"
[exam]
title = "Dupes"

[[questions]]
question_number = 1
model_answer = "a"
keywords = ["a"]
max_marks = 1

[[questions]]
question_number = 1
model_answer = "b"
keywords = ["b"]
max_marks = 1
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("dupes.toml")).unwrap();
        let warnings = validate_exam(&exam);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
    }

    #[test]
    fn validate_total_and_layout() {
        let toml = r#"
[exam]
title = "Mismatch"
total_marks = 50

[[questions]]
question_number = 1
model_answer = ""
max_marks = -1

[layout]
anchors = [{ question_id = "q1", start = 0.6 }, { question_id = "q2", start = 1.4 }, { question_id = "q3", start = 0.2 }]
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("bad.toml")).unwrap();
        let messages: Vec<String> = validate_exam(&exam).into_iter().map(|w| w.message).collect();
        assert!(messages.iter().any(|m| m.contains("model_answer is empty")));
        assert!(messages.iter().any(|m| m.contains("no keywords")));
        assert!(messages.iter().any(|m| m.contains("max_marks must be")));
        assert!(messages.iter().any(|m| m.contains("differs from the question sum")));
        assert!(messages.iter().any(|m| m.contains("outside the page")));
        assert!(messages.iter().any(|m| m.contains("ascending")));
    }

    #[test]
    fn validate_stopword_only_keywords() {
        let toml = r#"
[exam]
title = "Stopwords"

[[questions]]
question_number = 3
model_answer = "The heart pumps blood."
keywords = ["the", "heart", "  ", "of the"]
max_marks = 2
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("stop.toml")).unwrap();
        let flagged: Vec<String> = validate_exam(&exam)
            .into_iter()
            .filter(|w| w.message.contains("always matches"))
            .map(|w| {
                assert_eq!(w.question_number, Some(3));
                w.message
            })
            .collect();
        assert_eq!(flagged.len(), 3);
        assert!(flagged[0].contains("\"the\""));
        assert!(!flagged.iter().any(|m| m.contains("heart")));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_exam_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bio.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[exam]\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let exams = load_exam_directory(dir.path()).unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].title, "Biology Unit 1");
    }
}
