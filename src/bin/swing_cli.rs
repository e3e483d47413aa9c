use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use swing_highlights::config::AppConfig;
use swing_highlights::engine::backend::{MemoryExporter, MemoryRecorder, SystemTimeSource};
use swing_highlights::engine::{EngineHandle, HighlightRequest};
use swing_highlights::fixtures::{video_library, ExpectationDiff, FixtureCatalog};
use swing_highlights::highlight::{CourseFilter, DurationIntent, SelectionBudget};
use swing_highlights::offline::{CancellationFlag, RecordingScan, SequenceExtractor};

#[derive(Parser, Debug)]
#[command(
    name = "swing_cli",
    about = "Deterministic label-stream fixture harness for swing highlights"
)]
struct Cli {
    /// Override directory containing fixture assets (defaults to ./fixtures)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// JSON config file; defaults are used when absent or invalid
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the offline extractor over a fixture and check its expectations
    Scan {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a fixture through the live trigger, one command per line
    Replay {
        #[arg(long)]
        fixture: String,
    },
    /// Scan, select and compose a highlight reel from several fixtures
    Plan {
        /// Fixtures to include; all discovered fixtures when omitted
        #[arg(long = "fixture")]
        fixtures: Vec<String>,
        /// Keep only clips from these courses
        #[arg(long = "course")]
        courses: Vec<String>,
        #[arg(long, value_enum)]
        intent: Option<IntentArg>,
        #[arg(long)]
        max_clips: Option<usize>,
        /// Seconds
        #[arg(long)]
        max_duration: Option<f64>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum IntentArg {
    Short,
    Standard,
    Long,
}

impl From<IntentArg> for DurationIntent {
    fn from(arg: IntentArg) -> Self {
        match arg {
            IntentArg::Short => DurationIntent::Short,
            IntentArg::Standard => DurationIntent::Standard,
            IntentArg::Long => DurationIntent::Long,
        }
    }
}

fn main() -> ExitCode {
    swing_highlights::init_logging();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_default();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Scan { fixture, output } => run_scan(&catalog, &config, &fixture, output),
        Commands::Replay { fixture } => run_replay(&catalog, &config, &fixture),
        Commands::Plan {
            fixtures,
            courses,
            intent,
            max_clips,
            max_duration,
            output,
        } => {
            let mut budget = SelectionBudget::from_config(&config.highlight);
            if let Some(intent) = intent {
                budget = budget.with_intent(intent.into());
            }
            if let Some(max_clips) = max_clips {
                budget.max_clips = max_clips;
            }
            if let Some(max_duration) = max_duration {
                budget.max_total_duration = max_duration;
            }
            run_plan(&catalog, config, fixtures, courses, budget, output)
        }
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn run_scan(
    catalog: &FixtureCatalog,
    config: &AppConfig,
    fixture: &str,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let data = catalog.load(fixture)?;
    let library = video_library(std::slice::from_ref(&data));
    let scan = SequenceExtractor::new(config.offline.clone())
        .scan_recording(&library, &data.recording(), &CancellationFlag::new())
        .with_context(|| format!("scanning fixture {}", fixture))?;

    write_json(&ScanReportPayload { fixture, scan: &scan }, output_path)?;

    match data.expect {
        Some(expectations) => match expectations.verify(&scan.sequences) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        },
        None => Ok(ExitCode::from(0)),
    }
}

fn run_replay(catalog: &FixtureCatalog, config: &AppConfig, fixture: &str) -> Result<ExitCode> {
    let data = catalog.load(fixture)?;

    for command in data.replay_trigger(config.trigger.clone()) {
        println!("{}", serde_json::to_string(&command)?);
    }

    Ok(ExitCode::from(0))
}

fn run_plan(
    catalog: &FixtureCatalog,
    config: AppConfig,
    fixtures: Vec<String>,
    courses: Vec<String>,
    budget: SelectionBudget,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let names = if fixtures.is_empty() {
        catalog.discover()?
    } else {
        fixtures
    };
    let data = catalog.load_all(&names)?;
    let library = video_library(&data);

    let request = HighlightRequest::new(data.iter().map(|f| f.recording()).collect())
        .with_filter(CourseFilter::only(courses))
        .with_budget(budget);

    let engine = EngineHandle::from_config(
        config,
        Arc::new(MemoryRecorder::new()),
        Arc::new(SystemTimeSource::new()),
    );
    let exporter = MemoryExporter::new();
    let outcome = engine
        .build_highlight(&request, &library, &exporter, &CancellationFlag::new())
        .context("building highlight")?;

    write_json(&outcome, output_path)?;
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for name in fixtures {
        println!("{name}");
    }
    Ok(ExitCode::from(0))
}

fn write_json<T: Serialize>(value: &T, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct ScanReportPayload<'a> {
    fixture: &'a str,
    #[serde(flatten)]
    scan: &'a RecordingScan,
}
