use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::Result;
use crate::readers::{AqiReader, CsvReadOutcome, FirmsReader, RawAqiRow, RawFirmsRow};

/// Raw rows from both providers, before any normalization
pub struct RawDataset {
    pub aqi: CsvReadOutcome<RawAqiRow>,
    pub fires: CsvReadOutcome<RawFirmsRow>,
}

/// Reads the AQI file and the FIRMS file set concurrently. The two inputs
/// are independent, so this is a straight fan-out/join.
pub struct DatasetReader {
    use_mmap: bool,
}

impl DatasetReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub async fn read_all(&self, aqi_path: &Path, fire_paths: &[PathBuf]) -> Result<RawDataset> {
        let aqi_path = aqi_path.to_path_buf();
        let fire_paths = fire_paths.to_vec();
        let use_mmap = self.use_mmap;

        let aqi_handle: JoinHandle<Result<CsvReadOutcome<RawAqiRow>>> =
            tokio::task::spawn_blocking(move || AqiReader::new().read_rows(&aqi_path));

        let fires_handle: JoinHandle<Result<CsvReadOutcome<RawFirmsRow>>> =
            tokio::task::spawn_blocking(move || {
                FirmsReader::with_mmap(use_mmap).read_many(&fire_paths)
            });

        let (aqi, fires) = tokio::try_join!(aqi_handle, fires_handle)?;
        let (aqi, fires) = (aqi?, fires?);

        info!(
            aqi_rows = aqi.rows.len(),
            fire_rows = fires.rows.len(),
            "loaded raw datasets"
        );

        Ok(RawDataset { aqi, fires })
    }
}

impl Default for DatasetReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_concurrent_read() -> Result<()> {
        let mut aqi_file = NamedTempFile::new()?;
        writeln!(
            aqi_file,
            "Latitude,Longitude,UTC,Parameter,Unit,AQI,Category,SiteName,FullAQSCode,RawConcentration"
        )?;
        writeln!(
            aqi_file,
            "39.7512,-104.9876,2020-08-15T13,PM2.5,UG/M3,180,4,Denver - CAMP,080310002,95.2"
        )?;

        let mut fire_file = NamedTempFile::new()?;
        writeln!(
            fire_file,
            "latitude,longitude,bright_ti4,acq_date,confidence,frp,type"
        )?;
        writeln!(fire_file, "40.1672,-105.5828,345.1,2020-08-15,n,12.4,0")?;

        let reader = DatasetReader::new();
        let dataset = reader
            .read_all(aqi_file.path(), &[fire_file.path().to_path_buf()])
            .await?;

        assert_eq!(dataset.aqi.rows.len(), 1);
        assert_eq!(dataset.fires.rows.len(), 1);

        Ok(())
    }
}
