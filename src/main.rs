//! CLI entry point for the GPA report tool.
//!
//! Loads a transcript CSV, computes GPAs under every configured scale, and
//! prints or writes the resulting report.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gpa_report::gpa::{self, OnEmpty, PeriodFilter};
use gpa_report::output::{self, ReportFormat};
use gpa_report::scales::ScaleSet;
use gpa_report::transcript::{ColumnMap, LoadOptions, Period, Transcript};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gpa_report")]
#[command(about = "Compute University, AMCAS and TMDSAS GPAs from a transcript", long_about = None)]
struct Cli {
    /// JSON file of grade scales (defaults to $GPA_SCALES_PATH, then the built-in scales)
    #[arg(long, global = true, value_name = "FILE")]
    scales: Option<PathBuf>,

    #[command(flatten)]
    columns: ColumnArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ColumnArgs {
    /// Header of the credit hours column
    #[arg(long, global = true, default_value = "Credit_Hours")]
    credit_column: String,

    /// Header of the letter grade column
    #[arg(long, global = true, default_value = "Grade")]
    grade_column: String,

    /// Header of the BCPM/AO category column
    #[arg(long, global = true, default_value = "Type")]
    category_column: String,

    /// Header of the year column
    #[arg(long, global = true, default_value = "Year")]
    year_column: String,

    /// Header of the term column
    #[arg(long, global = true, default_value = "Semester")]
    term_column: String,

    /// Field delimiter of the transcript file
    #[arg(long, global = true, default_value_t = ',')]
    delimiter: char,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full scale × category GPA report
    Report {
        /// Transcript CSV file
        #[arg(value_name = "CSV")]
        transcript: PathBuf,

        /// Restrict to a period, as YEAR:TERM (repeatable)
        #[arg(short, long = "period", value_name = "YEAR:TERM")]
        periods: Vec<Period>,

        /// Print one report per period found in the transcript
        #[arg(long, default_value_t = false, conflicts_with = "periods")]
        per_period: bool,

        /// Decimal places to round point sums and GPAs to
        #[arg(short, long, default_value_t = 3)]
        round: u32,

        /// What to do with a category that has no courses: fail, zero or omit
        #[arg(long, default_value = "fail")]
        on_empty: OnEmpty,

        /// Also write the report to this .json, .yaml or .yml file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Format printed to stdout: yaml or json
        #[arg(short, long, default_value = "yaml")]
        format: ReportFormat,
    },
    /// Print a single GPA
    Gpa {
        /// Transcript CSV file
        #[arg(value_name = "CSV")]
        transcript: PathBuf,

        /// Grade scale, e.g. University, AMCAS or TMDSAS
        #[arg(short, long, default_value = "University")]
        scale: String,

        /// Overall, BCPM or AO
        #[arg(short, long, default_value = "Overall")]
        category: String,

        /// Restrict to a period, as YEAR:TERM (repeatable)
        #[arg(short, long = "period", value_name = "YEAR:TERM")]
        periods: Vec<Period>,

        /// Decimal places to round the point sum and GPA to
        #[arg(short, long)]
        round: Option<u32>,

        /// Format printed to stdout: yaml or json
        #[arg(short, long, default_value = "yaml")]
        format: ReportFormat,
    },
    /// List the academic periods found in a transcript
    Periods {
        /// Transcript CSV file
        #[arg(value_name = "CSV")]
        transcript: PathBuf,
    },
    /// Print the grade scales in use
    Scales,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gpa_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gpa_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let scales = load_scales(cli.scales.as_deref())?;
    let options = load_options(&cli.columns)?;

    match cli.command {
        Commands::Report {
            transcript,
            periods,
            per_period,
            round,
            on_empty,
            output: output_path,
            format,
        } => {
            let transcript = open_transcript(&transcript, scales, &options)?;

            if per_period {
                let reports = gpa::report_by_period(&transcript, Some(round), on_empty)?;
                for (period, report) in &reports {
                    println!("# {period}");
                    println!("{}", format.render(report)?);
                }
                if let Some(path) = output_path {
                    let keyed: Vec<_> = reports
                        .iter()
                        .map(|(period, report)| (period.to_string(), report))
                        .collect();
                    output::write_report(&path, &PeriodReports(keyed))
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                }
            } else {
                let filter = period_filter(periods);
                let report = gpa::report(&transcript, filter.as_ref(), Some(round), on_empty)?;
                if let Some(path) = output_path {
                    output::write_report(&path, &report)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                }
                println!("{}", format.render(&report)?);
            }
        }
        Commands::Gpa {
            transcript,
            scale,
            category,
            periods,
            round,
            format,
        } => {
            let transcript = open_transcript(&transcript, scales, &options)?;
            let filter = period_filter(periods);
            let result = gpa::compute(&transcript, &scale, &category, filter.as_ref(), round)?;
            println!("{}", format.render(&result)?);
        }
        Commands::Periods { transcript } => {
            let transcript = open_transcript(&transcript, scales, &options)?;
            if !transcript.has_periods() {
                info!("Transcript has no year/term columns");
            }
            for period in transcript.periods() {
                println!("{period}");
            }
        }
        Commands::Scales => {
            println!("{}", output::to_yaml(&scales)?);
        }
    }

    Ok(())
}

/// Per-period reports keyed by `YEAR:TERM`, in transcript order.
struct PeriodReports<'a>(Vec<(String, &'a gpa::GpaReport)>);

impl serde::Serialize for PeriodReports<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (period, report) in &self.0 {
            map.serialize_entry(period, report)?;
        }
        map.end()
    }
}

/// Resolves the scale file from `--scales`, then `GPA_SCALES_PATH`, then the
/// built-in definitions.
fn load_scales(path: Option<&Path>) -> Result<ScaleSet> {
    let from_env = std::env::var_os("GPA_SCALES_PATH").map(PathBuf::from);
    match path.map(Path::to_path_buf).or(from_env) {
        Some(path) => ScaleSet::load(&path)
            .with_context(|| format!("Failed to load scales from {}", path.display())),
        None => {
            debug!("Using built-in GPA scales");
            Ok(ScaleSet::builtin()?)
        }
    }
}

fn load_options(args: &ColumnArgs) -> Result<LoadOptions> {
    let delimiter = u8::try_from(args.delimiter)
        .with_context(|| format!("Delimiter {:?} must be a single-byte character", args.delimiter))?;
    Ok(LoadOptions {
        columns: ColumnMap {
            credit_hours: args.credit_column.clone(),
            grade: args.grade_column.clone(),
            category: args.category_column.clone(),
            year: args.year_column.clone(),
            term: args.term_column.clone(),
        },
        delimiter,
    })
}

#[tracing::instrument(skip_all, fields(path = %path.display()))]
fn open_transcript(path: &Path, scales: ScaleSet, options: &LoadOptions) -> Result<Transcript> {
    Transcript::from_path_with(path, scales, options)
        .with_context(|| format!("Failed to load transcript {}", path.display()))
}

fn period_filter(periods: Vec<Period>) -> Option<PeriodFilter> {
    if periods.is_empty() {
        None
    } else {
        Some(periods.into_iter().collect())
    }
}
