//! Pulse CLI - Command-line interface for Pulse Metrics
//!
//! Commands:
//! - report: Compute every metric and print the full report
//! - metric: Compute a single metric
//! - export: Write one JSON file per metric into a directory
//! - validate: Check raw users/events exports for integrity problems

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use pulse_metrics::report::AnalyticsReport;
use pulse_metrics::schema::{RawEvent, RawUser, SnapshotLoader};
use pulse_metrics::{AnalyticsConfig, MetricsEngine, PRODUCER_NAME, PULSE_VERSION};

/// Pulse - Deterministic behavioral analytics for product usage data
#[derive(Parser)]
#[command(name = "pulse")]
#[command(author = "Pulse Analytics")]
#[command(version = PULSE_VERSION)]
#[command(about = "Compute product metrics from users and events exports", long_about = None)]
struct Cli {
    /// Log filter (e.g. "warn", "debug", "pulse_metrics=trace")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every metric and print the full report
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: ReportFormat,
    },

    /// Compute a single metric
    Metric {
        /// Metric to compute
        #[arg(value_enum)]
        kind: MetricKind,

        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Write the report and one JSON file per metric into a directory
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory (created if missing)
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Check raw users/events exports for integrity problems
    Validate {
        /// Users file path (use - for stdin)
        #[arg(long)]
        users: PathBuf,

        /// Events file path (use - for stdin)
        #[arg(long)]
        events: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Users file path (use - for stdin)
    #[arg(long)]
    users: PathBuf,

    /// Events file path (use - for stdin)
    #[arg(long)]
    events: PathBuf,

    /// Input format
    #[arg(long, default_value = "ndjson")]
    input_format: InputFormat,

    /// Analytics configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// As-of date (YYYY-MM-DD), overrides the configuration file
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one row per line)
    Ndjson,
    /// JSON array of rows
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable summary
    Text,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricKind {
    /// Daily active users
    Dau,
    /// Monthly active users
    Mau,
    /// Cohort retention
    Retention,
    /// Churn by plan
    Churn,
    /// Feature adoption
    Features,
    /// Engagement scores
    Engagement,
    /// Cohort activation
    Activation,
    /// Per-user engagement segments
    Segments,
    /// Cohort activity matrix
    Cohorts,
    /// Plan distribution
    Plans,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Report {
            input,
            output_format,
        } => cmd_report(&input, output_format),

        Commands::Metric {
            kind,
            input,
            output_format,
        } => cmd_metric(kind, &input, output_format),

        Commands::Export { input, out_dir } => cmd_export(&input, &out_dir),

        Commands::Validate {
            users,
            events,
            input_format,
            json,
        } => cmd_validate(&users, &events, input_format, json),
    }
}

fn cmd_report(input: &InputArgs, format: ReportFormat) -> Result<(), PulseCliError> {
    let engine = load_engine(input)?;
    let report = engine.report()?;

    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string(&report)?),
        ReportFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print_report_text(&report),
    }
    Ok(())
}

fn cmd_metric(
    kind: MetricKind,
    input: &InputArgs,
    format: OutputFormat,
) -> Result<(), PulseCliError> {
    let engine = load_engine(input)?;

    let output = match kind {
        MetricKind::Dau => format_rows(&engine.daily_active_users(), format)?,
        MetricKind::Mau => format_rows(&engine.monthly_active_users(), format)?,
        MetricKind::Retention => format_rows(&engine.retention()?, format)?,
        MetricKind::Churn => format_rows(&engine.churn()?, format)?,
        MetricKind::Features => format_rows(&engine.feature_adoption(), format)?,
        MetricKind::Engagement => format_rows(&engine.engagement()?, format)?,
        MetricKind::Activation => format_rows(&engine.activation()?, format)?,
        MetricKind::Segments => format_rows(&engine.segments()?, format)?,
        MetricKind::Cohorts => format_rows(&engine.cohort_activity(), format)?,
        MetricKind::Plans => format_rows(&engine.plan_distribution(), format)?,
    };

    print!("{}", output);
    Ok(())
}

fn cmd_export(input: &InputArgs, out_dir: &Path) -> Result<(), PulseCliError> {
    let engine = load_engine(input)?;
    let documents = engine.export_documents()?;

    fs::create_dir_all(out_dir)?;

    for (stem, contents) in &documents {
        let path = out_dir.join(format!("{}.json", stem));
        fs::write(&path, contents)?;
        tracing::info!(path = %path.display(), "wrote metric file");
    }

    println!("Wrote {} files to {}", documents.len(), out_dir.display());
    Ok(())
}

fn cmd_validate(
    users_path: &Path,
    events_path: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), PulseCliError> {
    let (users, events) = read_records(users_path, events_path, input_format)?;
    let result = SnapshotLoader::validate_records(&users, &events);

    let report = ValidationReport {
        producer: PRODUCER_NAME.to_string(),
        version: PULSE_VERSION.to_string(),
        total_users: result.total_users,
        total_events: result.total_events,
        duplicate_users: result.duplicate_users,
        duplicate_events: result.duplicate_events,
        invalid_records: result.issues.len(),
        errors: result
            .issues
            .iter()
            .map(|issue| ValidationErrorDetail {
                record: issue.record.to_string(),
                index: issue.index,
                id: issue.id,
                error: issue.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total users:       {}", report.total_users);
        println!("Total events:      {}", report.total_events);
        println!("Duplicate users:   {}", report.duplicate_users);
        println!("Duplicate events:  {}", report.duplicate_events);
        println!("Invalid records:   {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                let id = err
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "  - {} {} (index {}): {}",
                    err.record, id, err.index, err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(PulseCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

// Helper functions

fn load_engine(input: &InputArgs) -> Result<MetricsEngine, PulseCliError> {
    let mut config = match &input.config {
        Some(path) => AnalyticsConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalyticsConfig::default(),
    };
    if let Some(as_of) = input.as_of {
        config = config.with_as_of_date(as_of);
    }

    let (users, events) = read_records(&input.users, &input.events, input.input_format)?;
    let dataset = SnapshotLoader::build_dataset(&users, &events)?;
    tracing::info!(
        users = dataset.user_count(),
        events = dataset.event_count(),
        "snapshot loaded"
    );

    Ok(MetricsEngine::new(dataset, config)?)
}

fn read_records(
    users_path: &Path,
    events_path: &Path,
    format: InputFormat,
) -> Result<(Vec<RawUser>, Vec<RawEvent>), PulseCliError> {
    if is_stdin(users_path) && is_stdin(events_path) {
        return Err(PulseCliError::StdinTwice);
    }

    let users_data = read_input(users_path)?;
    let events_data = read_input(events_path)?;

    let records = match format {
        InputFormat::Ndjson => (
            SnapshotLoader::parse_ndjson(&users_data)?,
            SnapshotLoader::parse_ndjson(&events_data)?,
        ),
        InputFormat::Json => (
            SnapshotLoader::parse_array(&users_data)?,
            SnapshotLoader::parse_array(&events_data)?,
        ),
    };
    Ok(records)
}

fn is_stdin(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_input(path: &Path) -> Result<String, PulseCliError> {
    if is_stdin(path) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn format_rows<T: Serialize>(rows: &[T], format: OutputFormat) -> Result<String, PulseCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for row in rows {
                out.push_str(&serde_json::to_string(row)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(rows)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(rows)? + "\n"),
    }
}

fn print_report_text(report: &AnalyticsReport) {
    let summary = &report.summary;

    println!("Pulse Report");
    println!("============");
    println!("As of:        {}", report.as_of_date);
    println!("Run:          {}", report.producer.run_id);
    println!();
    println!("Users:            {}", summary.total_users);
    println!("Events:           {}", summary.total_events);
    println!("Events per user:  {:.2}", summary.events_per_user);
    println!("Latest DAU:       {}", summary.latest_dau);
    println!("Latest MAU:       {}", summary.latest_mau);
    println!("DAU/MAU:          {:.2}%", summary.dau_mau_ratio);
    println!("Avg retention:    {:.2}%", summary.average_retention_rate);
    println!("Avg churn:        {:.2}%", summary.average_churn_rate);

    if !summary.top_features.is_empty() {
        println!("\nTop features:");
        for row in &summary.top_features {
            println!(
                "  - {}: {} events, {} users",
                row.feature, row.total_events, row.unique_users
            );
        }
    }

    if !report.metrics.churn.is_empty() {
        println!("\nChurn by plan:");
        for row in &report.metrics.churn {
            println!(
                "  - {}: {}/{} churned ({:.2}%)",
                row.plan, row.churned_users, row.total_users, row.churn_rate
            );
        }
    }

    if !report.metrics.segments.is_empty() {
        println!("\nSegments:");
        for row in &report.metrics.segments {
            println!("  - {}: {}", row.level.as_str(), row.users);
        }
    }
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Compute(pulse_metrics::ComputeError),
    Json(serde_json::Error),
    StdinTwice,
    ValidationFailed(usize),
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<pulse_metrics::ComputeError> for PulseCliError {
    fn from(e: pulse_metrics::ComputeError) -> Self {
        PulseCliError::Compute(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        use pulse_metrics::ComputeError;

        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Compute(ComputeError::DataIntegrity(e)) => CliError {
                code: "DATA_INTEGRITY_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'pulse validate' for details".to_string()),
            },
            PulseCliError::Compute(ComputeError::InvalidConfiguration(e)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Pass --as-of or fix the configuration file".to_string()),
            },
            PulseCliError::Compute(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check --input-format matches the input files".to_string()),
            },
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::StdinTwice => CliError {
                code: "USAGE_ERROR".to_string(),
                message: "Only one of --users and --events can read from stdin".to_string(),
                hint: Some("Pass a file path for the other input".to_string()),
            },
            PulseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    producer: String,
    version: String,
    total_users: usize,
    total_events: usize,
    duplicate_users: usize,
    duplicate_events: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    record: String,
    index: usize,
    id: Option<u64>,
    error: String,
}
