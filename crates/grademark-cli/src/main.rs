//! grademark CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "grademark", version, about = "OCR answer sheet grading")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example exam
    Init,

    /// Validate exam definition TOML files
    Validate {
        /// Path to exam file or directory
        #[arg(long)]
        exam: PathBuf,
    },

    /// Extract per-question text from a scanned answer sheet
    Extract {
        /// Image or PDF of the answer sheet
        #[arg(long)]
        file: PathBuf,

        /// Exam definition whose layout guides segmentation
        #[arg(long)]
        exam: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Register an exam definition in a gradebook
    Register {
        /// Gradebook JSON file (created if missing)
        #[arg(long)]
        gradebook: PathBuf,

        /// Exam definition TOML
        #[arg(long)]
        exam: PathBuf,
    },

    /// Extract and record a student's answer sheet
    Upload {
        /// Gradebook JSON file
        #[arg(long)]
        gradebook: PathBuf,

        /// Exam the sheet belongs to
        #[arg(long)]
        exam_id: u64,

        #[arg(long)]
        student_id: String,

        #[arg(long)]
        student_name: String,

        /// Image or PDF of the answer sheet
        #[arg(long)]
        file: PathBuf,
    },

    /// Score every answer on a recorded sheet
    Evaluate {
        /// Gradebook JSON file
        #[arg(long)]
        gradebook: PathBuf,

        /// Answer sheet id
        #[arg(long)]
        sheet: u64,
    },

    /// Set a teacher's score and/or feedback on one answer
    Override {
        /// Gradebook JSON file
        #[arg(long)]
        gradebook: PathBuf,

        /// Answer id
        #[arg(long)]
        answer: u64,

        #[arg(long)]
        score: Option<f64>,

        #[arg(long)]
        feedback: Option<String>,
    },

    /// Show exam or student statistics
    Stats {
        /// Gradebook JSON file
        #[arg(long)]
        gradebook: PathBuf,

        /// Exam id
        #[arg(long, conflicts_with = "student", required_unless_present = "student")]
        exam: Option<u64>,

        /// Student id
        #[arg(long)]
        student: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("grademark=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Extract { file, exam, format } => {
            commands::extract::execute(file, exam, format, config).await
        }
        Commands::Register { gradebook, exam } => commands::register::execute(gradebook, exam),
        Commands::Upload {
            gradebook,
            exam_id,
            student_id,
            student_name,
            file,
        } => {
            commands::upload::execute(gradebook, exam_id, student_id, student_name, file, config)
                .await
        }
        Commands::Evaluate { gradebook, sheet } => {
            commands::evaluate::execute(gradebook, sheet, config)
        }
        Commands::Override {
            gradebook,
            answer,
            score,
            feedback,
        } => commands::override_answer::execute(gradebook, answer, score, feedback),
        Commands::Stats {
            gradebook,
            exam,
            student,
            format,
        } => commands::stats::execute(gradebook, exam, student, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
