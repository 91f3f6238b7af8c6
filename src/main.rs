// Entry point and high-level CLI flow.
//
// One subcommand per metric:
// - the CSV is loaded and checked against the metric's column contract,
// - the metric is computed once,
// - a markdown preview is printed and the full result is optionally
//   written as JSON (plus a season summary CSV for the season metrics).
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ipa_stats::config::Settings;
use ipa_stats::loader::LoadReport;
use ipa_stats::metrics::adequacy::AdequacyOptions;
use ipa_stats::metrics::{compute_from_csv, MetricReport, MetricRequest, ReferenceArea};
use ipa_stats::output::{self, ReportEnvelope};
use ipa_stats::types::Metric;
use ipa_stats::util::format_int;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "ipa_stats")]
#[command(about = "Irrigation performance indicators from agronomic CSV data", long_about = None)]
struct Cli {
    #[command(flatten)]
    out: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OutputArgs {
    /// Write the full result as JSON to this path
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Write the season summary table as CSV to this path
    #[arg(long, global = true)]
    summary_csv: Option<String>,

    /// Number of years shown per preview table
    #[arg(long, global = true)]
    preview_rows: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Water-delivery adequacy: 1 - mean(ETa)/mean(ETa90)
    Adequacy {
        #[arg(short, long, value_name = "CSV")]
        file: PathBuf,

        /// Additional crop types to leave out ("Other Unirrigated" always is)
        #[arg(long = "exclude-crop", value_name = "NAME")]
        exclude_crops: Vec<String>,
    },
    /// Crop productivity: TBP / (ETa * 10), area-weighted per year
    Productivity {
        #[arg(short, long, value_name = "CSV")]
        file: PathBuf,
    },
    /// Distribution equity: coefficient of variation of ETa
    Equity {
        #[arg(short, long, value_name = "CSV")]
        file: PathBuf,

        /// Crop id for the seasonal columns (defaults to the first in the file)
        #[arg(long)]
        crop_id: Option<u8>,
    },
    /// Cropping intensity: total cropped area / CCA
    CroppingIntensity {
        #[arg(short, long, value_name = "CSV")]
        file: PathBuf,

        /// Culturable command area (falls back to IPA_CCA)
        #[arg(long)]
        cca: Option<f64>,
    },
    /// Irrigation utilization: irrigated area / CCA
    IrrigationUtilization {
        #[arg(short, long, value_name = "CSV")]
        file: PathBuf,

        /// Culturable command area (falls back to IPA_CCA)
        #[arg(long)]
        cca: Option<f64>,
    },
}

fn init_logging() {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        );
    tracing_subscriber::registry().with(stderr_layer).init();
}

/// Turn a subcommand into the file to read and the request to run.
/// A missing or non-positive CCA is rejected here, before any row is read.
fn build_request(command: Commands, settings: &Settings) -> Result<(PathBuf, MetricRequest)> {
    let resolve_cca = |cca: Option<f64>, metric: Metric| {
        ReferenceArea::require(cca.or(settings.default_cca), metric)
            .with_context(|| format!("invalid parameters for {}", metric))
    };
    let out = match command {
        Commands::Adequacy {
            file,
            exclude_crops,
        } => {
            let mut options = AdequacyOptions::default();
            options.excluded_crops.extend(exclude_crops);
            (file, MetricRequest::Adequacy(options))
        }
        Commands::Productivity { file } => (file, MetricRequest::Productivity),
        Commands::Equity { file, crop_id } => (file, MetricRequest::Equity { crop_id }),
        Commands::CroppingIntensity { file, cca } => (
            file,
            MetricRequest::CroppingIntensity {
                cca: resolve_cca(cca, Metric::CroppingIntensity)?,
            },
        ),
        Commands::IrrigationUtilization { file, cca } => (
            file,
            MetricRequest::IrrigationUtilization {
                cca: resolve_cca(cca, Metric::IrrigationUtilization)?,
            },
        ),
    };
    Ok(out)
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Processing dataset... ({} rows read, {} used)",
        format_int(report.total_rows as u64),
        format_int(report.loaded_rows as u64)
    );
    if report.skipped_rows > 0 {
        println!(
            "Note: {} rows skipped due to parse/validation errors.",
            format_int(report.skipped_rows as u64)
        );
    }
    println!();
}

/// Writes whichever outputs were requested.
fn write_outputs(
    out: &OutputArgs,
    settings: &Settings,
    metric: Metric,
    file: &Path,
    load_report: &LoadReport,
    report: &MetricReport,
) -> Result<()> {
    if let Some(path) = &out.output {
        let path = settings.resolve_output(path);
        let envelope = ReportEnvelope {
            generated_at: chrono::Utc::now(),
            metric,
            source: file.display().to_string(),
            rows: load_report,
            result: report,
        };
        output::write_json(&path, &envelope)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("(Full result exported to {})", path.display());
    }

    if let Some(path) = &out.summary_csv {
        match output::season_summary(report) {
            Some(summary) => {
                let path = settings.resolve_output(path);
                output::write_csv(&path, &summary.summary)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("(Season summary exported to {})", path.display());
            }
            None => warn!(%metric, "Metric has no season summary; --summary-csv ignored"),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let settings = Settings::from_env();
    let preview_rows = cli.out.preview_rows.unwrap_or(settings.preview_rows);

    let (file, request) = build_request(cli.command, &settings)?;
    let metric = request.metric();
    info!(%metric, file = %file.display(), "Computing metric");

    let (report, load_report) = compute_from_csv(&file, &request)
        .with_context(|| format!("failed to compute {} from {}", metric, file.display()))?;

    print_load_report(&load_report);
    println!("{}\n", output::render_report(&report, preview_rows));

    write_outputs(&cli.out, &settings, metric, &file, &load_report, &report)?;
    Ok(())
}
