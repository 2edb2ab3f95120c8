use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use docfidelity::{
    render_accuracy, render_comparison, render_fidelity, render_quality, ComparisonInput,
    EngineConfig, Evaluator, SemanticCapability, SourceTextProvider, TextFileProvider,
};

#[derive(Parser)]
#[command(
    name = "docfidelity",
    about = "Score how faithfully a converted document preserves its source",
    version
)]
struct Cli {
    /// TOML file with thresholds and report settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Word fidelity, sentence parity and heading scores against the source
    Compare(PairArgs),
    /// Word fidelity only, with assessment and foundation check
    Fidelity(PairArgs),
    /// Standalone quality of a converted document
    Quality(QualityArgs),
    /// Completeness, structure and semantic accuracy against extracted text
    Accuracy(AccuracyArgs),
}

#[derive(Args)]
struct OutputArgs {
    /// Write the rendered report to this file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print metrics as JSON instead of the report
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PairArgs {
    /// Extracted source text
    #[arg(long)]
    source: PathBuf,

    /// Converted markup
    #[arg(long)]
    target: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct QualityArgs {
    /// Converted markup
    file: PathBuf,

    /// Page count, when known; estimated from word count otherwise
    #[arg(long)]
    pages: Option<usize>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct AccuracyArgs {
    /// Extracted source text files, tried in order
    #[arg(long, required = true)]
    source: Vec<PathBuf>,

    /// Converted markup
    #[arg(long)]
    target: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let evaluator = Evaluator::new(config, SemanticCapability::Absent);

    match cli.command {
        Commands::Compare(args) => {
            let input = read_pair(&args)?;
            let report = evaluator.compare(&input);
            emit(&args.output, &report, render_comparison(&report, &now_utc_string()))
        }
        Commands::Fidelity(args) => {
            let input = read_pair(&args)?;
            let report = evaluator.word_fidelity(&input);
            emit(&args.output, &report, render_fidelity(&report, &now_utc_string()))
        }
        Commands::Quality(args) => {
            let target = read_text(&args.file)?;
            let metrics = evaluator.analyze_quality(&target, args.pages);
            emit(&args.output, &metrics, render_quality(&metrics, &now_utc_string()))
        }
        Commands::Accuracy(args) => {
            let providers: Vec<Box<dyn SourceTextProvider>> = args
                .source
                .iter()
                .map(|path| Box::new(TextFileProvider::new(path)) as Box<dyn SourceTextProvider>)
                .collect();
            let selection = evaluator
                .select_source(&providers)
                .context("no usable source text")?;
            let target = read_text(&args.target)?;
            let metrics = evaluator.validate_accuracy(&selection.text, &target);
            let report =
                render_accuracy(&metrics, Some(selection.provider.as_str()), &now_utc_string());
            emit(&args.output, &metrics, report)
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_pair(args: &PairArgs) -> Result<ComparisonInput> {
    Ok(ComparisonInput::new(
        read_text(&args.source)?,
        read_text(&args.target)?,
    ))
}

fn emit<T: Serialize>(output: &OutputArgs, value: &T, report: String) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{report}");
    }

    if let Some(path) = &output.output {
        fs::write(path, &report)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!(path = %path.display(), "report saved");
    }
    Ok(())
}

fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
