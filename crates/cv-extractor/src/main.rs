mod inbox;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use cv_common::batch::BatchRunner;
use cv_common::config::{parse_reference_date, ConfigError, EngineConfig};
use cv_common::extraction::split_signature;
use cv_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use cv_common::sources::{NoOcr, PlainTextExtractor};
use cv_common::{classify_with_score, extract, extract_from_email, DocumentHint, RawDocument};
use dotenvy::dotenv;
use serde::Serialize;
use tracing::info;

const APP_NAME: &str = "cv-extractor";

#[derive(Debug, Parser)]
#[command(
    name = "cv-extractor",
    about = "Classify documents and extract candidate fields from résumés and emails"
)]
struct Cli {
    /// Fixed "today" for duration math (YYYY-MM-DD)
    #[arg(long, global = true, env = "CV_REFERENCE_DATE", value_parser = reference_date)]
    reference_date: Option<NaiveDate>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify a plain-text document and print the extraction result
    Parse {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = HintArg::File)]
        hint: HintArg,
    },
    /// Extract contact details from an email body and optional signature
    Email {
        #[arg(long)]
        body: PathBuf,
        /// Defaults to the block after a sign-off line in the body
        #[arg(long)]
        signature: Option<PathBuf>,
    },
    /// Print the category and keyword scores only
    Classify { path: PathBuf },
    /// Run every *.eml / *.txt file in a directory through the batch runner
    Batch { dir: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HintArg {
    Email,
    File,
}

impl From<HintArg> for DocumentHint {
    fn from(value: HintArg) -> Self {
        match value {
            HintArg::Email => DocumentHint::Email,
            HintArg::File => DocumentHint::File,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("json encode error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mail parse error: {0}")]
    Mail(#[from] mailparse::MailParseError),
}

#[derive(Debug, Serialize)]
struct ClassifyOutput {
    category: String,
    label: &'static str,
    resume_score: u32,
    non_resume_score: u32,
}

fn reference_date(raw: &str) -> Result<NaiveDate, ConfigError> {
    parse_reference_date("--reference-date", raw)
}

fn read_text(path: &Path) -> Result<String, CliError> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn run() -> Result<(), CliError> {
    dotenv().ok();
    init_tracing_subscriber(APP_NAME);
    install_tracing_panic_hook(APP_NAME);

    let cli = Cli::parse();
    let config = EngineConfig::from_env()?.with_reference_date(cli.reference_date);
    info!(
        run_id = cv_common::ids::run_id(),
        today = %config.today(),
        ocr_min_confidence = config.ocr_min_confidence,
        "cv-extractor starting"
    );

    match cli.command {
        Command::Parse { path, hint } => {
            let raw = RawDocument {
                hint: hint.into(),
                ..RawDocument::from_file_text(read_text(&path)?)
            };
            print_json(&extract(&raw, config.today()), cli.pretty)
        }
        Command::Email { body, signature } => {
            let body = read_text(&body)?;
            let signature = match signature {
                Some(path) => read_text(&path)?,
                None => split_signature(&body),
            };
            print_json(&extract_from_email(&body, &signature), cli.pretty)
        }
        Command::Classify { path } => {
            let text = cv_common::normalize::normalize_text(&read_text(&path)?);
            let (category, scores) = classify_with_score(&text);
            let output = ClassifyOutput {
                category: category.as_ref().to_string(),
                label: category.label(),
                resume_score: scores.resume_score,
                non_resume_score: scores.non_resume_score,
            };
            print_json(&output, cli.pretty)
        }
        Command::Batch { dir } => {
            let documents = inbox::load_dir(&dir)?;
            let mut runner =
                BatchRunner::new(Box::new(PlainTextExtractor), Box::new(NoOcr), config);
            let report = runner.run(&documents, |progress| {
                info!(
                    processed = progress.processed,
                    total = progress.total,
                    status = progress.status.as_ref(),
                    subject = progress.current_subject.as_deref().unwrap_or(""),
                    "batch progress"
                );
            });
            print_json(&report, cli.pretty)
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{APP_NAME} failed: {err}");
        std::process::exit(1);
    }
}
