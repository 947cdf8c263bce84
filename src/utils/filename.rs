use std::path::{Path, PathBuf};

/// Default merged output name: co-aqi-wildfire-{start}-{end}.{ext}
pub fn default_merged_filename(output_dir: &Path, start_year: i32, end_year: i32, ext: &str) -> PathBuf {
    output_dir.join(format!("co-aqi-wildfire-{}-{}.{}", start_year, end_year, ext))
}

/// Per-year merged output name: co-aqi-wildfire-{year}.csv
pub fn yearly_merged_filename(output_dir: &Path, year: i32) -> PathBuf {
    output_dir.join(format!("co-aqi-wildfire-{}.csv", year))
}

/// Per-pollutant split name: {pollutant_slug}-aqi-{start}-{end}.csv
pub fn pollutant_split_filename(
    output_dir: &Path,
    pollutant_slug: &str,
    start_year: i32,
    end_year: i32,
) -> PathBuf {
    output_dir.join(format!(
        "{}-aqi-{}-{}.csv",
        pollutant_slug, start_year, end_year
    ))
}

/// Aggregate table name: aggregates-{start}-{end}.csv
pub fn aggregate_filename(output_dir: &Path, start_year: i32, end_year: i32) -> PathBuf {
    output_dir.join(format!("aggregates-{}-{}.csv", start_year, end_year))
}
