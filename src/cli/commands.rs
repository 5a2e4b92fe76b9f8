use anyhow::Context;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, info_span};

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::models::{WeatherDataset, YearMonth};
use crate::processors::{download_history, update_history, IntegrityChecker, MonthWalker};
use crate::readers::{DayTableParser, HttpPageFetcher};
use crate::settings::Settings;
use crate::utils::filename::{default_boxplot_filename, default_lineplot_filename};
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use crate::writers::{ChartWriter, RecordStore};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    info!(
        station = settings.station_id,
        database = %settings.database.display(),
        "Settings loaded"
    );

    match cli.command {
        Commands::Download => {
            println!("Downloading full history for {}...", settings.location);

            let mut store = open_store(&settings)?;
            let mut walker = build_walker(&settings)?;
            let progress = ProgressReporter::new_spinner("Walking month pages...", false);
            let outcome = download_history(
                &mut walker,
                &mut store,
                &settings.location,
                YearMonth::current(),
                Some(&progress),
            )
            .await;
            let done = match &outcome {
                Ok(outcome) => format!("Collected {} days", outcome.report.dataset.len()),
                Err(_) => "Walk stopped".to_string(),
            };
            progress.finish_with_message(&done);

            let outcome = outcome.context("Download failed, stored data left untouched")?;
            println!("\n{}", outcome.report.summary());
            println!(
                "Saved {} days to {}",
                outcome.inserted,
                settings.database.display()
            );
        }

        Commands::Update => {
            let mut store = open_store(&settings)?;
            let mut walker = build_walker(&settings)?;
            let progress = ProgressReporter::new_spinner("Checking for new days...", false);
            let outcome = update_history(
                &mut walker,
                &mut store,
                &settings.location,
                YearMonth::current(),
                Some(&progress),
            )
            .await;
            let done = match &outcome {
                Ok(outcome) => format!("Found {} new days", outcome.report.dataset.len()),
                Err(_) => "Walk stopped".to_string(),
            };
            progress.finish_with_message(&done);

            let outcome = outcome.context("Update failed, nothing was written")?;
            println!("\n{}", outcome.report.summary());
            println!("Saved {} new days", outcome.inserted);
        }

        Commands::BoxPlot {
            start_year,
            end_year,
            output,
        } => {
            let output = output.unwrap_or_else(|| default_boxplot_filename(start_year, end_year));
            let dataset = open_store(&settings)?.read_all()?;

            ChartWriter::new()
                .write_boxplot(&dataset, start_year, end_year, &output)
                .with_context(|| format!("Failed to write box plot {}", output.display()))?;
            println!("Box plot written to {}", output.display());
        }

        Commands::LinePlot {
            year,
            month,
            output,
        } => {
            let month = YearMonth::new(year, month)?;
            let output = output.unwrap_or_else(|| default_lineplot_filename(month));
            let dataset = open_store(&settings)?.read_all()?;

            ChartWriter::new()
                .write_lineplot(&dataset, month, &output)
                .with_context(|| format!("Failed to write line plot {}", output.display()))?;
            println!("Line plot written to {}", output.display());
        }

        Commands::Info => {
            let store = open_store(&settings)?;
            println!("{}", store.store_info()?.summary());

            let checker = IntegrityChecker::new();
            let report = checker.check_integrity(&store.read_all()?);
            println!("\n{}", checker.generate_summary(&report));

            if report.temperature_violations.is_empty() {
                println!("✅ All data passed validation checks");
            } else {
                println!(
                    "⚠️  Found {} validation issues",
                    report.temperature_violations.len()
                );
            }
        }

        Commands::Export { output } => {
            let dataset = open_store(&settings)?.read_all()?;
            export_json(&dataset, &output)
                .with_context(|| format!("Failed to export to {}", output.display()))?;
            println!("Exported {} days to {}", dataset.len(), output.display());
        }

        Commands::Purge => {
            let removed = open_store(&settings)?.purge()?;
            println!("Removed {} rows", removed);
        }
    }

    Ok(())
}

fn open_store(settings: &Settings) -> anyhow::Result<RecordStore> {
    RecordStore::open(&settings.database)
        .with_context(|| format!("Failed to open database {}", settings.database.display()))
}

fn build_walker(settings: &Settings) -> Result<MonthWalker<HttpPageFetcher>> {
    let span = info_span!("scrape", station = settings.station_id);
    let fetcher = HttpPageFetcher::new(settings)?;
    let parser = DayTableParser::new(settings.columns, settings.missing_values)?
        .with_span(info_span!(parent: &span, "day_table_parser"));

    Ok(MonthWalker::new(fetcher, parser, settings.earliest_year).with_span(span))
}

/// Write the dataset as pretty JSON, most recent date first.
pub fn export_json(dataset: &WeatherDataset, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(output)?);
    serde_json::to_writer_pretty(writer, dataset)?;
    Ok(())
}
