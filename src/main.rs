// Entry point and high-level CLI flow.
//
// - `ingest` normalizes the raw surveillance table and writes the tidy file.
// - `report` loads the tidy file once, derives snapshots, rankings and KPIs,
//   writes them for the presentation layer and prints previews.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use mpox_report::config::{IngestConfig, ReportConfig};
use mpox_report::output::{self, kpi_lines, preview_table};
use mpox_report::types::SnapshotPreviewRow;
use mpox_report::util::format_int;
use mpox_report::{generate_report, loader, Dataset, PopulationTable};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mpox_report")]
#[command(about = "Top-N surveillance report: ingestion and derived metrics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize a raw surveillance CSV into the tidy table
    Ingest {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "data/processed/mpox_clean.csv")]
        output: PathBuf,

        /// Extra date format (chrono syntax), tried before the defaults
        #[arg(long = "date-format")]
        date_formats: Vec<String>,
    },
    /// Derive snapshots, rankings and KPIs from the tidy table
    Report {
        #[arg(short, long, default_value = "data/processed/mpox_clean.csv")]
        data: PathBuf,

        /// Population reference (JSON object or Country,pop_millions CSV);
        /// the embedded table is used when omitted
        #[arg(short, long)]
        population: Option<PathBuf>,

        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,

        /// Entities per ranking
        #[arg(long, default_value_t = 5)]
        top: usize,

        #[arg(long, default_value_t = 5)]
        preview_rows: usize,
    },
}

fn handle_ingest(input: PathBuf, output: PathBuf, date_formats: Vec<String>) -> Result<()> {
    let defaults = IngestConfig::default();
    let cfg = IngestConfig {
        date_formats: date_formats.into_iter().chain(defaults.date_formats).collect(),
    };
    let report = loader::ingest_file(&input, &output, &cfg)
        .with_context(|| format!("Failed to ingest {}", input.display()))?;
    println!(
        "Loaded {} rows ({} countries) -> {}",
        format_int(report.total_rows),
        format_int(report.entities),
        output.display()
    );
    if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
        println!("Report dates: {} to {}", first, last);
    }
    Ok(())
}

fn handle_report(data: PathBuf, population: Option<PathBuf>, cfg: ReportConfig) -> Result<()> {
    let dataset = Dataset::load(&data)
        .with_context(|| format!("Failed to load tidy table {}", data.display()))?;
    let population = match population {
        Some(path) => PopulationTable::load(&path)
            .with_context(|| format!("Failed to load population reference {}", path.display()))?,
        None => PopulationTable::embedded(),
    };
    if dataset.is_empty() {
        warn!("{} has no rows; outputs will be empty", data.display());
    }

    let report = generate_report(dataset.records(), &population, cfg.top_n);
    for w in report.derived.warnings() {
        println!("Note: {}", w);
    }

    let written = output::write_report(&cfg.out_dir, &report)
        .with_context(|| format!("Failed to write reports to {}", cfg.out_dir.display()))?;
    info!("Report files: {:?}", written);

    println!();
    for (label, value) in kpi_lines(&report.kpis) {
        println!("{:<16} {}", label, value);
    }
    println!();

    for table in &report.rankings {
        preview_table(&table.title, &table.rows, cfg.preview_rows);
    }
    let previews: Vec<SnapshotPreviewRow> = report
        .derived
        .snapshots
        .iter()
        .map(SnapshotPreviewRow::from)
        .collect();
    preview_table("Latest snapshot per country", &previews, cfg.preview_rows);
    println!(
        "(Full tables exported to {}, {} files)",
        cfg.out_dir.display(),
        written.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Ingest {
            input,
            output,
            date_formats,
        } => handle_ingest(input, output, date_formats),
        Command::Report {
            data,
            population,
            out_dir,
            top,
            preview_rows,
        } => {
            let cfg = ReportConfig {
                top_n: top,
                preview_rows,
                out_dir,
            };
            handle_report(data, population, cfg)
        }
    }
}
