use std::collections::HashMap;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::analyzers::{ClimateAnalyzer, ClimateReport};
use crate::cli::args::{Cli, Commands};
use crate::config::AnalysisConfig;
use crate::error::{ProcessingError, Result};
use crate::processors::{IngestEngine, IngestStats};
use crate::readers::{ObservationReader, StationReader};
use crate::utils::progress::ProgressReporter;
use crate::writers::{ReportFormat, ReportWriter};

pub async fn run(cli: Cli) -> Result<()> {
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            input,
            stations,
            output,
            format,
            baseline_start,
            baseline_end,
            threshold_high,
            threshold_low,
            first_year,
            last_year,
            precip_target,
            snow_target,
            months_window,
            modern_start,
            mmap,
        } => {
            let config = AnalysisConfig {
                baseline_start_year: baseline_start,
                baseline_end_year: baseline_end,
                threshold_high,
                threshold_low,
                first_year,
                last_year,
                precipitation_target: precip_target,
                snow_target,
                months_window,
                modern_start_year: modern_start,
            }
            .validated()?;

            let format = parse_format(&format)?;

            let directory = match stations {
                Some(path) => {
                    let directory = StationReader::new().read_stations_map(&path)?;
                    info!(stations = directory.len(), "loaded station directory");
                    directory
                }
                None => HashMap::new(),
            };

            let (report, stats) = run_analysis(config, directory, input, mmap).await?;

            println!("Stations used in this analysis: {}", report.stations.len());
            println!(
                "Lines read: {} ({} folded, {} dropped)",
                stats.lines_read,
                stats.observations_folded,
                stats.short_lines + stats.malformed_lines + stats.unknown_elements
            );

            let writer = ReportWriter::new(format);
            match output {
                Some(path) => {
                    writer.write_to_path(&report, &path)?;
                    println!("Report written to {}", path.display());
                }
                None => writer.write_to_stdout(&report)?,
            }
        }

        Commands::Validate { input, mmap } => {
            let config = AnalysisConfig::default();
            let stats = tokio::task::spawn_blocking(move || -> Result<IngestStats> {
                let progress = ProgressReporter::new_spinner("Validating observations...", false);
                let mut engine = IngestEngine::new(config, HashMap::new());
                ObservationReader::with_mmap(mmap).ingest_file(
                    &input,
                    &mut engine,
                    Some(&progress),
                )?;
                progress.finish_with_message("Validation complete");
                Ok(*engine.stats())
            })
            .await??;

            println!("Lines read:          {}", stats.lines_read);
            println!("Observations folded: {}", stats.observations_folded);
            println!("Short lines:         {}", stats.short_lines);
            println!("Malformed lines:     {}", stats.malformed_lines);
            println!("Unknown elements:    {}", stats.unknown_elements);
            println!("Out-of-scope years:  {}", stats.out_of_scope_years);
            println!("Implausible values:  {}", stats.implausible_readings);

            if stats.short_lines + stats.malformed_lines + stats.unknown_elements == 0 {
                println!("All lines parsed cleanly");
            }
        }
    }

    Ok(())
}

async fn run_analysis(
    config: AnalysisConfig,
    directory: HashMap<String, crate::models::StationInfo>,
    input: PathBuf,
    mmap: bool,
) -> Result<(ClimateReport, IngestStats)> {
    tokio::task::spawn_blocking(move || -> Result<(ClimateReport, IngestStats)> {
        let progress = ProgressReporter::new_spinner("Ingesting observations...", false);

        let mut engine = IngestEngine::new(config.clone(), directory);
        ObservationReader::with_mmap(mmap).ingest_file(&input, &mut engine, Some(&progress))?;

        let (country, stats) = engine.finish();
        progress.set_message("Deriving statistics...");

        let report = ClimateAnalyzer::new(config).analyze(&country, stats);
        progress.finish_with_message(&format!(
            "Processed {} stations across {} years",
            report.stations.len(),
            report.years.len()
        ));

        Ok((report, stats))
    })
    .await?
}

fn parse_format(format: &str) -> Result<ReportFormat> {
    match format.to_lowercase().as_str() {
        "csv" => Ok(ReportFormat::Csv),
        "json" => Ok(ReportFormat::Json),
        other => Err(ProcessingError::Config(format!(
            "unknown report format '{}' (expected csv or json)",
            other
        ))),
    }
}
