pub mod aqi_reader;
pub mod dataset_reader;
pub mod firms_reader;

pub use aqi_reader::{AqiReader, RawAqiRow};
pub use dataset_reader::{DatasetReader, RawDataset};
pub use firms_reader::{FirmsReader, RawFirmsRow};

/// Result of reading one CSV source: the rows the CSV layer could
/// deserialize plus a count of the ones it could not.
#[derive(Debug)]
pub struct CsvReadOutcome<T> {
    pub rows: Vec<T>,
    pub malformed_rows: usize,
}
