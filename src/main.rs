//! CLI entry point for the datalab analyses.
//!
//! Provides one subcommand per dataset: census demographics, 3×3 matrix
//! statistics, medical examination charts, sea level prediction and forum
//! page-view charts.

use anyhow::{Result, ensure};
use clap::{Parser, Subcommand};
use datalab::analyzers::{demographic, mean_var_std, medical, page_views, sea_level};
use datalab::output::print_json;
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
#[command(name = "datalab")]
#[command(about = "Descriptive statistics and charts over small CSV datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate census data and write a one-row CSV report
    Demographic {
        /// Census CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Field separator of the CSV file
        #[arg(short, long, default_value_t = ',')]
        sep: char,

        /// Do not print the report to stdout
        #[arg(short, long, default_value_t = false)]
        quiet: bool,

        /// Directory the report is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Mean, variance, standard deviation, max, min and sum of a 3x3 matrix
    MeanVarStd {
        /// Exactly nine numbers, row-major
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        numbers: Vec<f64>,
    },
    /// Draw the categorical plot and correlation heat map of medical examinations
    Medical {
        /// Medical examination CSV file
        #[arg(value_name = "FILE", default_value = "medical_examination.csv")]
        file: PathBuf,

        /// Directory the charts are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Fit and extrapolate the rise in sea level
    SeaLevel {
        /// EPA sea level CSV file
        #[arg(value_name = "FILE", default_value = "epa-sea-level.csv")]
        file: PathBuf,

        /// First year of the second regression
        #[arg(short = 't', long, default_value_t = sea_level::DEFAULT_YEAR_THRESHOLD)]
        year_threshold: i32,

        /// Year to predict the sea level for
        #[arg(short = 'p', long, default_value_t = sea_level::DEFAULT_YEAR_PREDICT)]
        year_predict: i32,

        /// Directory the chart is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Draw line, bar and box plots of daily forum page views
    PageViews {
        /// Page view CSV file with `date` and `value` columns
        #[arg(value_name = "FILE", default_value = "fcc-forum-pageviews.csv")]
        file: PathBuf,

        /// Directory the charts are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/datalab.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("datalab.log"));

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

    match cli.command {
        Commands::Demographic {
            file,
            sep,
            quiet,
            output_dir,
        } => {
            ensure!(sep.is_ascii(), "separator must be a single ASCII character, got {sep:?}");
            demographic::run(&file, sep as u8, quiet, &output_dir)?;
        }
        Commands::MeanVarStd { numbers } => {
            debug!(count = numbers.len(), "Computing matrix statistics");
            let stats = mean_var_std::calculate(&numbers)?;
            print_json(&stats)?;
        }
        Commands::Medical { file, output_dir } => {
            std::fs::create_dir_all(&output_dir)?;
            let summary = medical::run(&file, &output_dir)?;
            info!(
                rows = summary.rows,
                cleaned_rows = summary.cleaned_rows,
                cat_plot = %summary.cat_plot.display(),
                heat_map = %summary.heat_map.display(),
                "Medical analysis finished"
            );
        }
        Commands::SeaLevel {
            file,
            year_threshold,
            year_predict,
            output_dir,
        } => {
            std::fs::create_dir_all(&output_dir)?;
            let (_, plot) = sea_level::run(&file, &output_dir, year_threshold, year_predict)?;
            info!(plot = %plot.display(), "Sea level analysis finished");
        }
        Commands::PageViews { file, output_dir } => {
            std::fs::create_dir_all(&output_dir)?;
            let summary = page_views::run(&file, &output_dir)?;
            info!(
                rows = summary.rows,
                kept = summary.kept,
                months = summary.monthly.len(),
                "Page view analysis finished"
            );
        }
    }

    Ok(())
}
