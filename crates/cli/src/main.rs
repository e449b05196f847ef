//! Genrefy CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: command-line flags, with defaults taken from
//!    [`catalog::config`], plus the `GOOGLE_API_KEY` credential.
//! 2. **Wire observability**: configure `tracing-subscriber` with an env
//!    filter (`RUST_LOG`, default `info`) and a pretty or JSON formatter. All
//!    `tracing` events emitted by every crate in the workspace flow through it.
//! 3. **Construct infrastructure**: create the [`GeminiProvider`] and inject
//!    it into [`LlmBatchClassifier`] and [`DatasetClassifier`].
//! 4. **Run**: read the input CSV, classify it, write the output CSV and, if
//!    requested, the JSON run report.
//!
//! A run where every batch failed still exits successfully: the output then
//! labels every row `Unknown`. Only startup problems (credential, input file,
//! missing columns, configuration) produce a non-zero exit status.

mod table_io;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
use catalog::{
    ClassifierConfig, ConfigError, DatasetConfig, ModelName, RetryPolicy, RunId, RunReport,
};
use clap::{Parser, ValueEnum};
use classifier::{DatasetClassifier, LlmBatchClassifier};
use llm::{GeminiConfig, GeminiProvider};
use tracing::{info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the Gemini API key.
const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

/// Classify a CSV of books ("Item ID", "Title", "Author") into genres.
#[derive(Debug, Parser)]
#[command(name = "genrefy", version, long_about = None)]
struct Cli {
    /// Input CSV with "Item ID", "Title" and "Author" columns.
    #[arg(long)]
    input: PathBuf,

    /// Where to write the input table with an added "Genre" column.
    #[arg(long)]
    output: PathBuf,

    /// Gemini model used for classification.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Books sent per request.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Attempts per batch before it falls back to "Unknown".
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Seconds to wait between attempts (first delay when backing off).
    #[arg(long, default_value_t = 5)]
    retry_delay_secs: u64,

    /// Double the retry delay after each failed attempt.
    #[arg(long)]
    exponential_backoff: bool,

    /// Upper bound for a single retry delay when backing off exponentially.
    #[arg(long, default_value_t = 60)]
    max_retry_delay_secs: u64,

    /// Milliseconds to pause between batches.
    #[arg(long, default_value_t = 1000)]
    batch_delay_ms: u64,

    /// Sampling temperature.
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Gemini API base URL.
    #[arg(long, default_value = llm::DEFAULT_BASE_URL)]
    api_base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Also write a JSON run report to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Cli {
    fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_secs(self.retry_delay_secs);
        if self.exponential_backoff {
            RetryPolicy::exponential(
                self.max_attempts,
                delay,
                Duration::from_secs(self.max_retry_delay_secs),
            )
        } else {
            RetryPolicy::fixed(self.max_attempts, delay)
        }
    }

    fn classifier_config(&self) -> Result<ClassifierConfig, ConfigError> {
        let model = ModelName::new(self.model.as_str())
            .ok_or_else(|| ConfigError::new("--model must not be empty"))?;
        Ok(ClassifierConfig {
            model,
            temperature: self.temperature,
            retry: self.retry_policy(),
            ..ClassifierConfig::default()
        })
    }

    fn dataset_config(&self) -> DatasetConfig {
        DatasetConfig {
            batch_size: self.batch_size,
            batch_delay: Duration::from_millis(self.batch_delay_ms),
        }
    }

    fn gemini_config(&self, api_key: String) -> GeminiConfig {
        GeminiConfig {
            base_url: self.api_base_url.clone(),
            api_key,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let api_key = load_api_key(std::env::var(API_KEY_ENV).ok())?;
    let run_id = RunId::new_random();

    run(cli, api_key, run_id)
        .instrument(info_span!("run", run_id = %run_id))
        .await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

fn load_api_key(value: Option<String>) -> Result<String> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => anyhow::bail!("{API_KEY_ENV} environment variable not set."),
    }
}

async fn run(cli: Cli, api_key: String, run_id: RunId) -> Result<()> {
    let classifier_config = cli.classifier_config()?;
    let model = classifier_config.model.clone();

    let provider = GeminiProvider::new(cli.gemini_config(api_key))?;
    let classifier = LlmBatchClassifier::new(provider, classifier_config)?;
    let merger = DatasetClassifier::new(classifier, cli.dataset_config())?;

    let table = table_io::read_csv(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    table
        .require_book_columns()
        .with_context(|| format!("{} cannot be classified", cli.input.display()))?;
    info!(rows = table.len(), input = %cli.input.display(), model = %model, "Classifying books");

    let mut report = RunReport::start(run_id, model);
    let classified = merger.classify_dataset(table, &mut report).await?;
    report.finish();

    table_io::write_csv(&cli.output, &classified)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    info!(
        rows = report.rows,
        batches = report.batches,
        failed_batches = report.failed_batches,
        coerced = report.coerced_labels,
        unknown = report.unknown_rows(),
        output = %cli.output.display(),
        "Classification finished"
    );

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
    }

    Ok(())
}
