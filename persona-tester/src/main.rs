mod common;
mod logic;
mod store;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::parse_levels;
use logic::{RunReport, SweepGrid, run_sweep};
use persona_core::{
    AnalyticsSink, DesignTable, PersonaEngine, PersonaEvent, PreferenceRecord, PreferenceSource,
    StaticPreferences, design,
};
use store::{KeyValueFile, PreferenceFile, PreferenceOverrides};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "persona-tester", version = "0.1.0")]
#[command(about = "QA harness for persona block assignment and design table audits")]
struct Args {
    /// JSON file holding a preference record
    #[arg(long, conflicts_with = "store")]
    prefs: Option<PathBuf>,

    /// Key-value store snapshot (JSON object) with preferences under "prefs"
    #[arg(long)]
    store: Option<PathBuf>,

    /// Override the maximum delivery fee
    #[arg(long, allow_negative_numbers = true)]
    max_fee: Option<f64>,

    /// Override the maximum walking distance
    #[arg(long, allow_negative_numbers = true)]
    max_walk: Option<f64>,

    /// Override the minimum CO2 saving
    #[arg(long = "min-co2", allow_negative_numbers = true)]
    min_co2: Option<f64>,

    /// Override the maximum delivery days
    #[arg(long, allow_negative_numbers = true)]
    max_day: Option<f64>,

    /// Override the delivery mode code
    #[arg(long, allow_negative_numbers = true)]
    mode: Option<f64>,

    /// Design table JSON to use instead of the embedded one
    #[arg(long)]
    design: Option<PathBuf>,

    /// Audit the design table for duplicate keys, bad ranges and missing blocks
    #[arg(long)]
    audit: bool,

    /// Sweep a preference grid and report the block distribution
    #[arg(long)]
    sweep: bool,

    /// Sweep grid JSON; omitted attributes use the default levels
    #[arg(long, requires = "sweep")]
    grid: Option<PathBuf>,

    /// Comma-separated mode levels for the sweep, replacing the grid's
    #[arg(long, requires = "sweep")]
    mode_levels: Option<String>,

    /// Exit non-zero on audit issues, unreachable blocks or an empty assignment
    #[arg(long)]
    strict: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    const fn overrides(&self) -> PreferenceOverrides {
        PreferenceOverrides {
            max_fee: self.max_fee,
            max_walk: self.max_walk,
            min_co2: self.min_co2,
            max_day: self.max_day,
            mode: self.mode,
        }
    }
}

/// Analytics sink that writes persona events to the log.
struct LogAnalytics;

impl AnalyticsSink for LogAnalytics {
    type Error = std::convert::Infallible;

    fn send_event(&self, event: &PersonaEvent) -> Result<(), Self::Error> {
        log::info!("analytics event {} persona_id={}", event.name, event.persona_id);
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.report == ReportFormat::Console {
        announce_banner();
    }

    let start_time = Instant::now();
    let preferences = load_preferences(&args)?;
    let table = load_design_table(args.design.as_deref())?;

    if args.verbose {
        eprintln!(
            "🔧 Preferences: {}",
            serde_json::to_string(&preferences).unwrap_or_default()
        );
        eprintln!("🔧 Design rows: {}", table.len());
    }

    let engine = PersonaEngine::new(StaticPreferences(preferences))
        .with_table(&table)
        .with_analytics(LogAnalytics);
    let mut report = RunReport::new(preferences, engine.initialize());

    if args.audit {
        report.audit = Some(table.audit());
    }
    if args.sweep {
        let grid = load_sweep_grid(&args)?;
        report.sweep = Some(run_sweep(&table, &grid));
    }

    write_report(&args, &report, start_time)?;

    if args.strict {
        let failures = report.strict_failures();
        if !failures.is_empty() {
            for failure in &failures {
                eprintln!("❌ {}", failure.red());
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🧪 Persona Block Tester".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn load_preferences(args: &Args) -> Result<PreferenceRecord> {
    let base = if let Some(path) = &args.prefs {
        PreferenceFile::new(path)
            .load_preferences()
            .context("loading preference file")?
    } else if let Some(path) = &args.store {
        KeyValueFile::new(path)
            .load_preferences()
            .context("loading preference store")?
    } else {
        PreferenceRecord::default()
    };
    Ok(args.overrides().apply(base))
}

fn load_design_table(path: Option<&Path>) -> Result<DesignTable> {
    let Some(path) = path else {
        return Ok(design::embedded().clone());
    };
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    DesignTable::from_json(&json)
        .with_context(|| format!("failed to parse design table {}", path.display()))
}

fn load_sweep_grid(args: &Args) -> Result<SweepGrid> {
    let mut grid = if let Some(path) = &args.grid {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        SweepGrid::from_json(&json)
            .with_context(|| format!("failed to parse sweep grid {}", path.display()))?
    } else {
        SweepGrid::default()
    };
    if let Some(levels) = &args.mode_levels {
        grid.mode = parse_levels(levels)?;
    }
    Ok(grid)
}

fn write_report(args: &Args, report: &RunReport, start_time: Instant) -> Result<()> {
    let mut out = open_output(args.output.as_deref())?;

    match args.report {
        ReportFormat::Json => logic::reports::generate_json_report(&mut *out, report)?,
        ReportFormat::Markdown => logic::reports::generate_markdown_report(&mut *out, report)?,
        ReportFormat::Console => {
            logic::reports::generate_console_report(&mut *out, report, start_time.elapsed())?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Buffered report sink: the `--output` file when given, stdout otherwise.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(stdout().lock())));
    };
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}
