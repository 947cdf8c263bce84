use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs::File;
use std::path::Path;
use tracing::warn;

use crate::error::{ProcessingError, Result};
use crate::models::MergedRecord;
use crate::processors::AggregateStat;

/// Flat-file output for merged and aggregate tables
pub struct CsvTableWriter;

impl CsvTableWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_merged(&self, records: &[MergedRecord], path: &Path) -> Result<()> {
        self.write_serializable(records, path)
    }

    pub fn write_aggregates(&self, stats: &[AggregateStat], path: &Path) -> Result<()> {
        self.write_serializable(stats, path)
    }

    fn write_serializable<T: serde::Serialize>(&self, rows: &[T], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if rows.is_empty() {
            // An empty table still produces a file, so downstream steps
            // see "no data" rather than "missing input"
            warn!(path = %path.display(), "writing empty table");
            File::create(path)?;
            return Ok(());
        }

        let mut writer = WriterBuilder::new().from_path(path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Read a merged table back, e.g. for the stats and visualize commands
    pub fn read_merged(&self, path: &Path) -> Result<Vec<MergedRecord>> {
        let file = File::open(path).map_err(|e| {
            ProcessingError::MissingData(format!("merged file {}: {}", path.display(), e))
        })?;

        if file.metadata()?.len() == 0 {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);
        let mut records = Vec::new();
        for result in reader.deserialize::<MergedRecord>() {
            records.push(result?);
        }

        Ok(records)
    }
}

impl Default for CsvTableWriter {
    fn default() -> Self {
        Self::new()
    }
}
