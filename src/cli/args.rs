use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::models::Confidence;
use crate::processors::GroupBy;
use crate::utils::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_DAY_WINDOW, DEFAULT_END_YEAR, DEFAULT_MATCH_RADIUS_KM,
    DEFAULT_ROLLING_WINDOW_DAYS, DEFAULT_START_YEAR,
};

#[derive(Parser)]
#[command(name = "aqi-wildfire-processor")]
#[command(about = "Colorado air-quality and wildfire correlation processor")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: read, clean, merge, aggregate, write
    Process {
        #[arg(short, long, help = "AirNow AQI export (CSV)")]
        aqi_file: PathBuf,

        #[arg(
            short,
            long,
            required = true,
            help = "FIRMS detection files (CSV); archive and NRT files are concatenated"
        )]
        fires_file: Vec<PathBuf>,

        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        #[arg(long, default_value_t = DEFAULT_START_YEAR)]
        start_year: i32,

        #[arg(long, default_value_t = DEFAULT_END_YEAR)]
        end_year: i32,

        #[arg(long, default_value_t = DEFAULT_MATCH_RADIUS_KM, help = "Fire match radius in km")]
        radius_km: f64,

        #[arg(
            long,
            default_value_t = DEFAULT_DAY_WINDOW,
            help = "Widen the date match by +/- N days"
        )]
        day_window: i64,

        #[arg(long, value_enum, default_value = "nominal")]
        min_confidence: ConfidenceArg,

        #[arg(
            long,
            default_value_t = DEFAULT_ROLLING_WINDOW_DAYS,
            help = "Trailing rolling-mean window in days"
        )]
        rolling_window: i64,

        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,

        #[arg(short, long, default_value = "snappy")]
        compression: String,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,

        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, help = "Parquet write batch size")]
        chunk_size: usize,

        #[arg(long, default_value = "false", help = "Memory-map large FIRMS archives")]
        use_mmap: bool,
    },

    /// Clean the inputs and report what would be dropped, without writing
    Validate {
        #[arg(short, long, help = "AirNow AQI export (CSV)")]
        aqi_file: PathBuf,

        #[arg(short, long, required = true, help = "FIRMS detection files (CSV)")]
        fires_file: Vec<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_START_YEAR)]
        start_year: i32,

        #[arg(long, default_value_t = DEFAULT_END_YEAR)]
        end_year: i32,

        #[arg(long, value_enum, default_value = "nominal")]
        min_confidence: ConfidenceArg,

        #[arg(long, default_value = "false")]
        use_mmap: bool,
    },

    /// Aggregate a merged table into grouped AQI statistics
    Stats {
        #[arg(short, long, help = "Merged table (CSV or Parquet)")]
        input: PathBuf,

        #[arg(short, long, value_enum, default_value = "year-season-pollutant")]
        group_by: GroupByArg,

        #[arg(short, long, help = "Write the aggregate table here instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Render charts and the interactive map from a merged table
    Visualize {
        #[arg(short, long, help = "Merged table (CSV or Parquet)")]
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "FIRMS detection files for the heat layer (optional)"
        )]
        fires_file: Vec<PathBuf>,

        #[arg(long, default_value = "visuals")]
        visuals_dir: PathBuf,

        #[arg(short, long, help = "Restrict the visuals to a single year")]
        year: Option<i32>,
    },

    /// Display information about a merged Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfidenceArg {
    Low,
    Nominal,
    High,
}

impl From<ConfidenceArg> for Confidence {
    fn from(arg: ConfidenceArg) -> Self {
        match arg {
            ConfidenceArg::Low => Confidence::Low,
            ConfidenceArg::Nominal => Confidence::Nominal,
            ConfidenceArg::High => Confidence::High,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GroupByArg {
    Year,
    Season,
    Pollutant,
    YearSeasonPollutant,
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Year => GroupBy::Year,
            GroupByArg::Season => GroupBy::Season,
            GroupByArg::Pollutant => GroupBy::Pollutant,
            GroupByArg::YearSeasonPollutant => GroupBy::YearSeasonPollutant,
        }
    }
}
