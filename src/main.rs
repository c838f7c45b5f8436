use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use omr_grade::answer_key::AnswerKey;
use omr_grade::config::Config;
use omr_grade::grading::{AnswerComparator, ExamScore, ScoreCalculator};
use omr_grade::sheet::{load_sheet, AnswerExtractor};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Grade one or more sheets of measurements against the answer key
    Grade {
        /// Sheet measurement files (YAML); glob patterns are expanded
        #[arg(required = true)]
        sheets: Vec<String>,

        /// Answer key file (overrides `answer_key` in the config)
        #[arg(short, long)]
        key: Option<PathBuf>,

        /// Use the built-in sample key when no key file is given or it cannot be read
        #[arg(long)]
        sample_key: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Show one line per question
        #[arg(short, long)]
        details: bool,
    },
    /// Strictly check an answer key file and report every malformed line
    CheckKey {
        path: PathBuf,
    },
    /// Write the sample answer key to a file
    InitKey {
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "omr-grade")]
#[command(about = "Grade scanned exam sheets against an answer key", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/omr-grade/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Serialize)]
struct SheetReport<'a> {
    sheet: String,
    score: &'a ExamScore,
    statistics: BTreeMap<&'static str, f64>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Commands::Grade {
            sheets,
            key,
            sample_key,
            format,
            details,
        } => {
            let config_path = cli.config.map(PathBuf::from);
            let config = match omr_grade::config::load_config(config_path) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Config error: {:#}", e);
                    std::process::exit(EXIT_CONFIG);
                }
            };
            run_grade(&config, &sheets, key, sample_key, format, details)
        }
        Commands::CheckKey { path } => run_check_key(&path),
        Commands::InitKey { path, force } => run_init_key(&path, force),
    };

    std::process::exit(code);
}

fn resolve_answer_key(config: &Config, key: Option<PathBuf>, sample_key: bool) -> Result<AnswerKey, i32> {
    let Some(path) = key.or_else(|| config.answer_key.clone()) else {
        if sample_key {
            info!("no answer key given, using the sample key");
            return Ok(AnswerKey::sample());
        }
        eprintln!("No answer key given. Pass --key, set `answer_key` in the config, or use --sample-key.");
        return Err(EXIT_CONFIG);
    };

    let mut answer_key = AnswerKey::new();
    match answer_key.load_from_file(&path) {
        Ok(()) => Ok(answer_key),
        Err(e) if sample_key => {
            warn!("{:#}; using the sample key", e);
            Ok(AnswerKey::sample())
        }
        Err(e) => {
            eprintln!("Answer key error: {:#}", e);
            Err(EXIT_INPUT)
        }
    }
}

/// Expand each argument as a glob pattern, keeping arguments that match
/// nothing so the load step can report them.
fn expand_sheet_paths(patterns: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let matched: Vec<PathBuf> = match glob::glob(pattern) {
            Ok(entries) => entries.filter_map(Result::ok).collect(),
            Err(e) => {
                warn!("invalid pattern '{}': {}", pattern, e);
                Vec::new()
            }
        };

        if matched.is_empty() {
            paths.push(PathBuf::from(pattern));
        } else {
            paths.extend(matched);
        }
    }
    paths
}

fn run_grade(
    config: &Config,
    sheets: &[String],
    key: Option<PathBuf>,
    sample_key: bool,
    format: OutputFormat,
    details: bool,
) -> i32 {
    if let Err(errors) = omr_grade::config::validate_config(config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return EXIT_CONFIG;
    }

    let answer_key = match resolve_answer_key(config, key, sample_key) {
        Ok(k) => k,
        Err(code) => return code,
    };

    let grading = config.grading.clone().unwrap_or_default();
    let detection = config.detection.clone().unwrap_or_default();

    let comparator = AnswerComparator::new(grading.case_sensitive.unwrap_or(false));
    let calculator = ScoreCalculator::from_config(&answer_key, &comparator, &grading);
    let extractor = AnswerExtractor::from_config(&detection);

    let use_colors = omr_grade::output::should_use_colors();
    let mut scores = Vec::new();
    let mut any_failed = false;

    // Sheets are independent; one bad file does not stop the batch
    for path in expand_sheet_paths(sheets) {
        let sheet = match load_sheet(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Sheet error: {:#}", e);
                any_failed = true;
                continue;
            }
        };

        let label = sheet
            .name
            .clone()
            .unwrap_or_else(|| path.display().to_string());
        let answers = extractor.extract(&sheet);
        let score = calculator.calculate_score(&answers);
        info!(sheet = %label, "{:.2}%", score.percentage_score);

        scores.push((label, score));
    }

    match format {
        OutputFormat::Text => {
            for (label, score) in &scores {
                println!("{}", omr_grade::output::format_score_summary(label, score, use_colors));
                if details {
                    println!(
                        "{}",
                        omr_grade::output::format_question_results(score, use_colors)
                    );
                }
                println!(
                    "{}",
                    omr_grade::output::format_statistics(&calculator.statistics(score))
                );
                println!();
            }
        }
        OutputFormat::Json => {
            let reports: Vec<SheetReport> = scores
                .iter()
                .map(|(label, score)| SheetReport {
                    sheet: label.clone(),
                    score,
                    statistics: calculator.statistics(score),
                })
                .collect();

            match serde_json::to_string_pretty(&reports) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Failed to serialize results: {}", e);
                    return EXIT_INPUT;
                }
            }
        }
    }

    if any_failed {
        EXIT_INPUT
    } else {
        EXIT_SUCCESS
    }
}

fn run_check_key(path: &Path) -> i32 {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to read answer key at {}: {}", path.display(), e);
            return EXIT_INPUT;
        }
    };

    match AnswerKey::parse_strict(&content) {
        Ok(key) => {
            println!("{}: {} answers, no errors", path.display(), key.total_questions());
            EXIT_SUCCESS
        }
        Err(errors) => {
            eprintln!("{}: {} malformed lines", path.display(), errors.len());
            for error in errors {
                eprintln!("  - {}", error);
            }
            EXIT_CONFIG
        }
    }
}

fn run_init_key(path: &Path, force: bool) -> i32 {
    if path.exists() && !force {
        eprintln!("{} already exists. Use --force to overwrite.", path.display());
        return EXIT_INPUT;
    }

    let key = AnswerKey::sample();
    match key.save_to_file(path) {
        Ok(()) => {
            println!("Wrote {} answers to {}", key.total_questions(), path.display());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to write answer key: {:#}", e);
            EXIT_INPUT
        }
    }
}
