//! One-shot assessment of a JSON survey record.
//!
//! Reads the 22 answers as a JSON object of strings and prints the assessment
//! as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin assess -- <answers.json|->
//! ```
//!
//! Logs go to stderr so stdout stays machine-readable.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use holomed::adapters::load_artifacts;
use holomed::adapters::sanitize::SanitizingMakeWriter;
use holomed::application::AssessmentService;
use holomed::config::Settings;
use holomed::SurveyAnswers;

fn usage() -> String {
    "Usage: assess <answers.json|->".to_string()
}

fn parse_args() -> Result<String> {
    let mut args = env::args().skip(1);
    let input = match args.next() {
        Some(arg) if arg == "-h" || arg == "--help" => return Err(anyhow!(usage())),
        Some(arg) => arg,
        None => return Err(anyhow!(usage())),
    };
    if args.next().is_some() {
        return Err(anyhow!(usage()));
    }
    Ok(input)
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read answers from stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read {source:?}"))
    }
}

fn main() -> Result<()> {
    let source = parse_args()?;
    let settings = Settings::from_env();

    let (writer, _guard) = tracing_appender::non_blocking(io::stderr());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(
            SanitizingMakeWriter::new(writer).with_limit(settings.sanitize_max_bytes),
        ))
        .init();
    settings.report_ignored();

    let answers = SurveyAnswers::from_json(&read_input(&source)?)?;

    let loaded = load_artifacts(&settings.model_path, settings.require_manifest)
        .with_context(|| format!("Failed to load model from {:?}", settings.model_path))?;
    let service = AssessmentService::new(Arc::new(loaded.encoder), Arc::new(loaded.classifier));

    let assessment = service.assess(&answers)?;
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}
