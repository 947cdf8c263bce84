use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Datelike;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ProcessingError, Result};
use crate::models::{AqiCategory, MergedRecord, Pollutant, Season};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};

/// Arrow Date32 counts days since the Unix epoch; chrono counts from 0001-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub struct ParquetTableWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetTableWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write the merged table to a Parquet file
    pub fn write_records(&self, records: &[MergedRecord], path: &Path) -> Result<()> {
        self.write_records_batched(records, path, records.len().max(1))
    }

    /// Write records in batches for memory efficiency
    pub fn write_records_batched(
        &self,
        records: &[MergedRecord],
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let schema = self.create_schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in records.chunks(batch_size) {
            let batch = self.records_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        Ok(())
    }

    fn create_schema(&self) -> Arc<Schema> {
        let fields = vec![
            Field::new("date", DataType::Date32, false),
            Field::new("year", DataType::Int32, false),
            Field::new("month", DataType::UInt32, false),
            Field::new("season", DataType::Utf8, false),
            Field::new("site_id", DataType::Utf8, false),
            Field::new("site_name", DataType::Utf8, false),
            Field::new("latitude", DataType::Float64, false),
            Field::new("longitude", DataType::Float64, false),
            Field::new("pollutant", DataType::Utf8, false),
            Field::new("aqi", DataType::Int32, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("rolling_aqi", DataType::Float64, true),
            Field::new("wildfire_present", DataType::Boolean, false),
            Field::new("nearest_fire_km", DataType::Float64, true),
            Field::new("nearest_fire_frp", DataType::Float64, true),
        ];

        Arc::new(Schema::new(fields))
    }

    fn records_to_batch(
        &self,
        records: &[MergedRecord],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let dates: Vec<i32> = records
            .iter()
            .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();
        let years: Vec<i32> = records.iter().map(|r| r.year).collect();
        let months: Vec<u32> = records.iter().map(|r| r.month).collect();
        let seasons: Vec<&str> = records.iter().map(|r| r.season.as_str()).collect();
        let site_ids: Vec<&str> = records.iter().map(|r| r.site_id.as_str()).collect();
        let site_names: Vec<&str> = records.iter().map(|r| r.site_name.as_str()).collect();
        let latitudes: Vec<f64> = records.iter().map(|r| r.latitude).collect();
        let longitudes: Vec<f64> = records.iter().map(|r| r.longitude).collect();
        let pollutants: Vec<&str> = records.iter().map(|r| r.pollutant.as_str()).collect();
        let aqis: Vec<i32> = records.iter().map(|r| r.aqi).collect();
        let categories: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();
        let rolling_aqis: Vec<Option<f64>> = records.iter().map(|r| r.rolling_aqi).collect();
        let wildfire_flags: Vec<bool> = records.iter().map(|r| r.wildfire_present).collect();
        let fire_distances: Vec<Option<f64>> = records.iter().map(|r| r.nearest_fire_km).collect();
        let fire_frps: Vec<Option<f64>> = records.iter().map(|r| r.nearest_fire_frp).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Date32Array::from(dates)),
                Arc::new(Int32Array::from(years)),
                Arc::new(UInt32Array::from(months)),
                Arc::new(StringArray::from(seasons)),
                Arc::new(StringArray::from(site_ids)),
                Arc::new(StringArray::from(site_names)),
                Arc::new(Float64Array::from(latitudes)),
                Arc::new(Float64Array::from(longitudes)),
                Arc::new(StringArray::from(pollutants)),
                Arc::new(Int32Array::from(aqis)),
                Arc::new(StringArray::from(categories)),
                Arc::new(Float64Array::from(rolling_aqis)),
                Arc::new(BooleanArray::from(wildfire_flags)),
                Arc::new(Float64Array::from(fire_distances)),
                Arc::new(Float64Array::from(fire_frps)),
            ],
        )?;

        Ok(batch)
    }

    /// Read merged records back from a Parquet file. A limit of 0 reads
    /// everything.
    pub fn read_records(&self, path: &Path, limit: usize) -> Result<Vec<MergedRecord>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(8192)
            .build()?;

        let limit = if limit == 0 { usize::MAX } else { limit };
        let mut records = Vec::new();

        for batch_result in parquet_reader {
            let batch = batch_result?;

            let dates = downcast::<Date32Array>(&batch, 0, "date")?;
            let years = downcast::<Int32Array>(&batch, 1, "year")?;
            let months = downcast::<UInt32Array>(&batch, 2, "month")?;
            let seasons = downcast::<StringArray>(&batch, 3, "season")?;
            let site_ids = downcast::<StringArray>(&batch, 4, "site_id")?;
            let site_names = downcast::<StringArray>(&batch, 5, "site_name")?;
            let latitudes = downcast::<Float64Array>(&batch, 6, "latitude")?;
            let longitudes = downcast::<Float64Array>(&batch, 7, "longitude")?;
            let pollutants = downcast::<StringArray>(&batch, 8, "pollutant")?;
            let aqis = downcast::<Int32Array>(&batch, 9, "aqi")?;
            let categories = downcast::<StringArray>(&batch, 10, "category")?;
            let rolling_aqis = downcast::<Float64Array>(&batch, 11, "rolling_aqi")?;
            let wildfire_flags = downcast::<BooleanArray>(&batch, 12, "wildfire_present")?;
            let fire_distances = downcast::<Float64Array>(&batch, 13, "nearest_fire_km")?;
            let fire_frps = downcast::<Float64Array>(&batch, 14, "nearest_fire_frp")?;

            for i in 0..batch.num_rows() {
                if records.len() >= limit {
                    return Ok(records);
                }

                let date = chrono::NaiveDate::from_num_days_from_ce_opt(
                    dates.value(i) + UNIX_EPOCH_DAYS_FROM_CE,
                )
                .ok_or_else(|| {
                    ProcessingError::InvalidFormat("Invalid date in Parquet file".to_string())
                })?;

                records.push(MergedRecord {
                    date,
                    year: years.value(i),
                    month: months.value(i),
                    season: Season::from_str(seasons.value(i))?,
                    site_id: site_ids.value(i).to_string(),
                    site_name: site_names.value(i).to_string(),
                    latitude: latitudes.value(i),
                    longitude: longitudes.value(i),
                    pollutant: Pollutant::from_str(pollutants.value(i))?,
                    aqi: aqis.value(i),
                    category: AqiCategory::from_str(categories.value(i))?,
                    rolling_aqi: (!rolling_aqis.is_null(i)).then(|| rolling_aqis.value(i)),
                    wildfire_present: wildfire_flags.value(i),
                    nearest_fire_km: (!fire_distances.is_null(i))
                        .then(|| fire_distances.value(i)),
                    nearest_fire_frp: (!fire_frps.is_null(i)).then(|| fire_frps.value(i)),
                });
            }
        }

        Ok(records)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let total_rows = metadata.file_metadata().num_rows();
        let row_groups = metadata.num_row_groups();
        let file_size = std::fs::metadata(path)?.len();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            file_size,
        })
    }
}

impl Default for ParquetTableWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast<'a, T: 'static>(batch: &'a RecordBatch, column: usize, name: &str) -> Result<&'a T> {
    batch
        .column(column)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column type", name)))
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub file_size: u64,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Rows: {}\nRow groups: {}\nFile size: {:.1} KB",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0
        )
    }
}
