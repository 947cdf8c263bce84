use csv::{ReaderBuilder, Trim};
use memmap2::Mmap;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::warn;

use crate::error::{ProcessingError, Result};
use crate::readers::CsvReadOutcome;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;

/// One row of a FIRMS hotspot CSV. Column names differ between the MODIS
/// and VIIRS products (brightness vs bright_ti4), so both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFirmsRow {
    pub latitude: Option<f64>,

    pub longitude: Option<f64>,

    pub acq_date: String,

    #[serde(default)]
    pub brightness: Option<f64>,

    #[serde(default)]
    pub bright_ti4: Option<f64>,

    #[serde(default)]
    pub confidence: Option<String>,

    #[serde(default)]
    pub frp: Option<f64>,

    #[serde(rename = "type", default)]
    pub detection_type: Option<i32>,

    #[serde(default)]
    pub daynight: Option<String>,
}

impl RawFirmsRow {
    /// Brightness temperature regardless of sensor product
    pub fn brightness_value(&self) -> Option<f64> {
        self.brightness.or(self.bright_ti4)
    }
}

/// Reads FIRMS detection archives. The full-archive downloads run to
/// millions of rows, so a memory-mapped path is available for them.
pub struct FirmsReader {
    use_mmap: bool,
}

impl FirmsReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    pub fn read_rows(&self, path: &Path) -> Result<CsvReadOutcome<RawFirmsRow>> {
        if self.use_mmap {
            self.read_rows_mmap(path)
        } else {
            self.read_rows_buffered(path)
        }
    }

    /// Read several FIRMS files (e.g. archive plus near-real-time) and
    /// concatenate them sorted by acquisition date.
    pub fn read_many(&self, paths: &[impl AsRef<Path>]) -> Result<CsvReadOutcome<RawFirmsRow>> {
        let mut rows = Vec::new();
        let mut malformed_rows = 0usize;

        for path in paths {
            let outcome = self.read_rows(path.as_ref())?;
            rows.extend(outcome.rows);
            malformed_rows += outcome.malformed_rows;
        }

        // ISO dates sort correctly as strings
        rows.sort_by(|a, b| a.acq_date.cmp(&b.acq_date));

        Ok(CsvReadOutcome {
            rows,
            malformed_rows,
        })
    }

    fn read_rows_buffered(&self, path: &Path) -> Result<CsvReadOutcome<RawFirmsRow>> {
        let file = File::open(path).map_err(|e| {
            ProcessingError::MissingData(format!("FIRMS file {}: {}", path.display(), e))
        })?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        Self::collect_rows(csv_reader)
    }

    fn read_rows_mmap(&self, path: &Path) -> Result<CsvReadOutcome<RawFirmsRow>> {
        let file = File::open(path).map_err(|e| {
            ProcessingError::MissingData(format!("FIRMS file {}: {}", path.display(), e))
        })?;
        let mmap = unsafe { Mmap::map(&file)? };
        let csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(&mmap[..]);

        Self::collect_rows(csv_reader)
    }

    fn collect_rows<R: std::io::Read>(
        mut csv_reader: csv::Reader<R>,
    ) -> Result<CsvReadOutcome<RawFirmsRow>> {
        let mut rows = Vec::new();
        let mut malformed_rows = 0usize;

        for result in csv_reader.deserialize::<RawFirmsRow>() {
            match result {
                Ok(row) => rows.push(row),
                Err(e) => {
                    malformed_rows += 1;
                    warn!(error = %e, "skipping malformed FIRMS row");
                }
            }
        }

        Ok(CsvReadOutcome {
            rows,
            malformed_rows,
        })
    }
}

impl Default for FirmsReader {
    fn default() -> Self {
        Self::new()
    }
}
