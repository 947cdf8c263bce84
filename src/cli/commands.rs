use std::path::Path;
use std::sync::Arc;
use tracing::Level;
use validator::Validate;

use crate::analyzers::AirQualityAnalyzer;
use crate::charts::{HeatmapBuilder, SeasonalChart, TimeseriesChart};
use crate::cli::args::{Cli, Commands, OutputFormat};
use crate::error::{ProcessingError, Result};
use crate::models::{MergedRecord, Pollutant};
use crate::processors::{Aggregator, GroupBy, MergeConfig, Merger, Normalizer, RollingAverager};
use crate::readers::{DatasetReader, FirmsReader};
use crate::utils::coordinates::validate_colorado_coordinates;
use crate::utils::filename::{
    aggregate_filename, default_merged_filename, pollutant_split_filename, yearly_merged_filename,
};
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvTableWriter, ParquetTableWriter};

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Process {
            aqi_file,
            fires_file,
            output_dir,
            start_year,
            end_year,
            radius_km,
            day_window,
            min_confidence,
            rolling_window,
            format,
            compression,
            max_workers,
            chunk_size,
            use_mmap,
        } => {
            println!("Processing Colorado AQI and wildfire data...");
            println!("AQI file: {}", aqi_file.display());
            println!("FIRMS files: {}", fires_file.len());
            println!("Years: {}-{}, workers: {}", start_year, end_year, max_workers);

            configure_worker_pool(max_workers)?;

            let progress = ProgressReporter::new_spinner("Reading input files...", false);
            let dataset = DatasetReader::new()
                .with_mmap(use_mmap)
                .read_all(&aqi_file, &fires_file)
                .await?;
            progress.finish_with_message(&format!(
                "Read {} AQI rows and {} fire rows",
                dataset.aqi.rows.len(),
                dataset.fires.rows.len()
            ));

            let normalizer = Normalizer::new()
                .with_year_range(start_year, end_year)
                .with_min_confidence(min_confidence.into());
            let (readings, aqi_report) = normalizer.normalize_aqi(dataset.aqi);
            let (detections, fire_report) = normalizer.normalize_fires(dataset.fires);

            println!("\n{}", aqi_report.summary("AQI"));
            println!("\n{}", fire_report.summary("FIRMS"));

            let merger = Merger::new(MergeConfig {
                radius_km,
                day_window,
            });
            let mut records = merger.merge(&readings, &detections);

            if records.is_empty() {
                println!("\nNo records survived cleaning and merging - nothing to write");
                return Ok(());
            }

            RollingAverager::new()
                .with_window_days(rolling_window)
                .apply(&mut records);

            println!("\nWriting {} merged records...", records.len());
            match format {
                OutputFormat::Csv => {
                    write_csv_outputs(&records, &output_dir, start_year, end_year)?
                }
                OutputFormat::Parquet => {
                    let path =
                        default_merged_filename(&output_dir, start_year, end_year, "parquet");
                    let writer = ParquetTableWriter::new().with_compression(&compression)?;
                    writer.write_records_batched(&records, &path, chunk_size)?;
                    println!("Wrote {}", path.display());
                    println!("{}", writer.get_file_info(&path)?.summary());
                }
            }

            // The aggregate table ships alongside either format
            let stats = Aggregator::new().aggregate(&records, GroupBy::YearSeasonPollutant);
            let stats_path = aggregate_filename(&output_dir, start_year, end_year);
            CsvTableWriter::new().write_aggregates(&stats, &stats_path)?;
            println!("Wrote {}", stats_path.display());

            let analysis = AirQualityAnalyzer::new().analyze(&records)?;
            println!("\n{}", analysis.summary());

            println!("\nProcessing complete!");
        }

        Commands::Validate {
            aqi_file,
            fires_file,
            start_year,
            end_year,
            min_confidence,
            use_mmap,
        } => {
            println!("Validating input data...");
            println!("AQI file: {}", aqi_file.display());

            let progress = ProgressReporter::new_spinner("Reading input files...", false);
            let dataset = DatasetReader::new()
                .with_mmap(use_mmap)
                .read_all(&aqi_file, &fires_file)
                .await?;
            progress.finish_with_message("Read complete");

            let normalizer = Normalizer::new()
                .with_year_range(start_year, end_year)
                .with_min_confidence(min_confidence.into());
            let (readings, aqi_report) = normalizer.normalize_aqi(dataset.aqi);
            let (detections, fire_report) = normalizer.normalize_fires(dataset.fires);

            println!("\n{}", aqi_report.summary("AQI"));
            println!("\n{}", fire_report.summary("FIRMS"));

            let invalid = readings
                .iter()
                .filter(|r| {
                    r.validate().is_err()
                        || validate_colorado_coordinates(r.latitude, r.longitude).is_err()
                })
                .count()
                + detections
                    .iter()
                    .filter(|d| {
                        d.validate().is_err()
                            || validate_colorado_coordinates(d.latitude, d.longitude).is_err()
                    })
                    .count();

            if invalid == 0 {
                println!("\n✅ All {} cleaned records passed validation", readings.len() + detections.len());
            } else {
                println!("\n⚠️  Found {} records failing validation", invalid);
            }
            println!("Validation complete - no output files written");
        }

        Commands::Stats {
            input,
            group_by,
            output,
        } => {
            let records = read_merged_table(&input)?;
            println!("Read {} merged records from {}", records.len(), input.display());

            let stats = Aggregator::new().aggregate(&records, group_by.into());

            match output {
                Some(path) => {
                    CsvTableWriter::new().write_aggregates(&stats, &path)?;
                    println!("Wrote {} aggregate rows to {}", stats.len(), path.display());
                }
                None => {
                    println!(
                        "\n{:<28} {:>8} {:>10} {:>10} {:>10} {:>10}",
                        "group", "count", "mean", "median", "fire mean", "base mean"
                    );
                    for stat in &stats {
                        println!(
                            "{:<28} {:>8} {:>10.1} {:>10.1} {:>10} {:>10}",
                            stat.group,
                            stat.count,
                            stat.mean_aqi,
                            stat.median_aqi,
                            format_optional(stat.wildfire_mean_aqi),
                            format_optional(stat.baseline_mean_aqi),
                        );
                    }
                }
            }
        }

        Commands::Visualize {
            input,
            fires_file,
            visuals_dir,
            year,
        } => {
            let mut records = read_merged_table(&input)?;
            if let Some(year) = year {
                records.retain(|r| r.year == year);
                println!("Filtered to {} records for {}", records.len(), year);
            }

            let detections = if fires_file.is_empty() {
                Vec::new()
            } else {
                let outcome = FirmsReader::new().read_many(&fires_file)?;
                let (mut detections, report) = Normalizer::new().normalize_fires(outcome);
                println!("\n{}", report.summary("FIRMS"));
                if let Some(year) = year {
                    detections.retain(|d| chrono::Datelike::year(&d.date) == year);
                }
                detections
            };

            render_visuals(&records, &detections, &visuals_dir, year)?;
        }

        Commands::Info { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetTableWriter::new();
            let file_info = writer.get_file_info(&file)?;
            let records = writer.read_records(&file, 0)?;

            let analysis = AirQualityAnalyzer::new().analyze(&records)?;
            println!("\n{}", analysis.detailed_summary());

            println!("\nFile Details:");
            println!("{}", file_info.summary());

            if sample > 0 {
                println!("\nSample Records (showing up to {}):", sample);
                for (i, record) in records.iter().take(sample).enumerate() {
                    println!(
                        "{}. {} on {}: {} AQI {} ({}){}",
                        i + 1,
                        record.site_name,
                        record.date,
                        record.pollutant,
                        record.aqi,
                        record.category,
                        match record.nearest_fire_km {
                            Some(km) => format!(", fire {:.1} km away", km),
                            None => String::new(),
                        }
                    );
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_max_level(level).init();
        }
    }

    Ok(())
}

fn configure_worker_pool(max_workers: usize) -> Result<()> {
    if max_workers == 0 {
        return Err(ProcessingError::Config(
            "max_workers must be at least 1".to_string(),
        ));
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers)
        .build_global()
        .map_err(|e| ProcessingError::Config(e.to_string()))
}

fn write_csv_outputs(
    records: &[MergedRecord],
    output_dir: &Path,
    start_year: i32,
    end_year: i32,
) -> Result<()> {
    let writer = CsvTableWriter::new();

    let combined = default_merged_filename(output_dir, start_year, end_year, "csv");
    writer.write_merged(records, &combined)?;
    println!("Wrote {}", combined.display());

    let year_count = (end_year - start_year + 1).max(0) as u64;
    let progress = ProgressReporter::new(year_count, "Writing per-year tables", false);
    for year in start_year..=end_year {
        progress.set_message(&format!("Writing {}", year));
        let yearly: Vec<MergedRecord> = records
            .iter()
            .filter(|r| r.year == year)
            .cloned()
            .collect();
        if !yearly.is_empty() {
            let path = yearly_merged_filename(output_dir, year);
            writer.write_merged(&yearly, &path)?;
        }
        progress.increment(1);
    }
    progress.finish_with_message("Per-year tables written");

    for pollutant in Pollutant::all() {
        let split: Vec<MergedRecord> = records
            .iter()
            .filter(|r| r.pollutant == pollutant)
            .cloned()
            .collect();
        let path = pollutant_split_filename(output_dir, pollutant.slug(), start_year, end_year);
        writer.write_merged(&split, &path)?;
        println!("Wrote {} ({} records)", path.display(), split.len());
    }

    Ok(())
}

fn render_visuals(
    records: &[MergedRecord],
    detections: &[crate::models::WildfireDetection],
    visuals_dir: &Path,
    year: Option<i32>,
) -> Result<()> {
    let suffix = year.map(|y| format!("-{}", y)).unwrap_or_default();

    let timeseries_path = visuals_dir.join(format!("aqi-timeseries{}.svg", suffix));
    TimeseriesChart::new().render(records, &timeseries_path)?;
    println!("Wrote {}", timeseries_path.display());

    let seasonal_path = visuals_dir.join(format!("aqi-seasonal{}.svg", suffix));
    SeasonalChart::new().render(records, &seasonal_path)?;
    println!("Wrote {}", seasonal_path.display());

    let map_path = visuals_dir.join(format!("aqi-wildfire-map{}.html", suffix));
    HeatmapBuilder::new().render(records, detections, &map_path)?;
    println!("Wrote {}", map_path.display());

    Ok(())
}

fn read_merged_table(path: &Path) -> Result<Vec<MergedRecord>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => ParquetTableWriter::new().read_records(path, 0),
        _ => CsvTableWriter::new().read_merged(path),
    }
}

fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}
