use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use table_facts::{
    ExtractionReport, Extractor, FactRow, PipelineConfig, QualityMode, TableInput, write_facts_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "grid2facts",
    version,
    about = "Turn extracted table cell grids into normalized fact rows"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract fact rows from a JSON array of tables.
    Extract(ExtractArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input JSON path holding an array of tables.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path for the fact rows.
    #[arg(short, long)]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Calibration file overriding patterns and thresholds.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Drop tables whose layout stays unresolved instead of extracting them
    /// with low confidence.
    #[arg(long)]
    skip_unresolved: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &ExtractArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("failed to load calibration '{}'", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.skip_unresolved {
        config.quality_mode = QualityMode::SkipUnresolved;
    }
    Ok(config)
}

fn read_tables(path: &Path) -> Result<Vec<TableInput>> {
    let file = File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("failed to parse tables from '{}'", path.display()))
}

fn write_rows(path: &Path, rows: &[FactRow], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => write_facts_csv(path, rows)?,
        OutputFormat::Json => {
            let file = File::create(path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), rows)?;
        }
    }
    Ok(())
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {} page={:?} table={:?} confidence={:?}: {}",
                warning.code, warning.page, warning.table_index, warning.confidence, warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let extractor = Extractor::new(load_config(args)?).context("invalid calibration")?;
    let tables = read_tables(&args.input)?;
    let (rows, report) = extractor.extract_tables(&tables);
    write_rows(&args.output, &rows, args.format)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    Ok(report)
}

fn main() -> ExitCode {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("table_facts=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if report.row_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
