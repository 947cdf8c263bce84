use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::warn;

use crate::error::{ProcessingError, Result};
use crate::readers::CsvReadOutcome;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;

/// One row of an AirNow bulk-download CSV, exactly as the provider ships it.
/// Numeric fields stay optional so malformed rows can be dropped and counted
/// downstream instead of aborting the read.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAqiRow {
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,

    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,

    #[serde(rename = "UTC")]
    pub utc: String,

    #[serde(rename = "Parameter")]
    pub parameter: String,

    #[serde(rename = "Unit", default)]
    pub unit: String,

    #[serde(rename = "AQI")]
    pub aqi: Option<f64>,

    #[serde(rename = "RawConcentration", default)]
    pub raw_concentration: Option<f64>,

    #[serde(rename = "SiteName", default)]
    pub site_name: String,

    #[serde(rename = "FullAQSCode", default)]
    pub full_aqs_code: Option<String>,
}

pub struct AqiReader;

impl AqiReader {
    pub fn new() -> Self {
        Self
    }

    /// Read raw station rows from an AirNow CSV. Rows the CSV layer cannot
    /// deserialize at all are skipped and counted, never fatal.
    pub fn read_rows(&self, path: &Path) -> Result<CsvReadOutcome<RawAqiRow>> {
        let file = File::open(path).map_err(|e| {
            ProcessingError::MissingData(format!("AQI file {}: {}", path.display(), e))
        })?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);

        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        let mut malformed_rows = 0usize;

        for result in csv_reader.deserialize::<RawAqiRow>() {
            match result {
                Ok(row) => rows.push(row),
                Err(e) => {
                    malformed_rows += 1;
                    warn!(error = %e, "skipping malformed AQI row");
                }
            }
        }

        Ok(CsvReadOutcome {
            rows,
            malformed_rows,
        })
    }
}

impl Default for AqiReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "Latitude,Longitude,UTC,Parameter,Unit,AQI,Category,SiteName,FullAQSCode,RawConcentration";

    #[test]
    fn test_read_airnow_rows() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "{}", HEADER)?;
        writeln!(
            temp_file,
            "39.7512,-104.9876,2020-08-15T13,PM2.5,UG/M3,180,4,Denver - CAMP,080310002,95.2"
        )?;
        writeln!(
            temp_file,
            "39.7512,-104.9876,2020-08-15T13,OZONE,PPB,52,2,Denver - CAMP,080310002,61.0"
        )?;

        let reader = AqiReader::new();
        let outcome = reader.read_rows(temp_file.path())?;

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.malformed_rows, 0);
        assert_eq!(outcome.rows[0].parameter, "PM2.5");
        assert_eq!(outcome.rows[0].aqi, Some(180.0));
        assert_eq!(outcome.rows[0].site_name, "Denver - CAMP");

        Ok(())
    }

    #[test]
    fn test_malformed_rows_are_counted() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "{}", HEADER)?;
        writeln!(
            temp_file,
            "39.7512,-104.9876,2020-08-15T13,PM2.5,UG/M3,180,4,Denver - CAMP,080310002,95.2"
        )?;
        // Latitude is not a number
        writeln!(
            temp_file,
            "not-a-latitude,-104.9876,2020-08-15T13,PM2.5,UG/M3,44,1,Denver - CAMP,080310002,10.0"
        )?;

        let reader = AqiReader::new();
        let outcome = reader.read_rows(temp_file.path())?;

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.malformed_rows, 1);

        Ok(())
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let reader = AqiReader::new();
        assert!(reader.read_rows(Path::new("does-not-exist.csv")).is_err());
    }
}
