/// Colorado bounding box (AirNow BBOX order: minLon, minLat, maxLon, maxLat)
pub const CO_MIN_LAT: f64 = 36.992424;
pub const CO_MAX_LAT: f64 = 41.003444;
pub const CO_MIN_LON: f64 = -109.060253;
pub const CO_MAX_LON: f64 = -102.041524;

/// Map view center for rendered HTML maps
pub const CO_CENTER_LAT: f64 = 39.5501;
pub const CO_CENTER_LON: f64 = -105.7821;

/// Sentinel used by both providers for missing numeric values
pub const MISSING_SENTINEL: f64 = -999.0;

/// Wildfire proximity matching defaults. A station is flagged as
/// wildfire-influenced when a detection lies within this great-circle
/// radius on the same calendar date (day window 0).
pub const DEFAULT_MATCH_RADIUS_KM: f64 = 50.0;
pub const DEFAULT_DAY_WINDOW: i64 = 0;

/// Analysis period covered by the archived datasets
pub const DEFAULT_START_YEAR: i32 = 2019;
pub const DEFAULT_END_YEAR: i32 = 2024;

/// Trailing window for the per-site rolling AQI mean
pub const DEFAULT_ROLLING_WINDOW_DAYS: i64 = 30;

/// MODIS numeric confidence bins (VIIRS already reports l/n/h letters)
pub const MODIS_LOW_CONFIDENCE_MAX: f64 = 30.0;
pub const MODIS_HIGH_CONFIDENCE_MIN: f64 = 80.0;

/// AQI scale breakpoints (upper bound of each category)
pub const AQI_GOOD_MAX: i32 = 50;
pub const AQI_MODERATE_MAX: i32 = 100;
pub const AQI_SENSITIVE_MAX: i32 = 150;
pub const AQI_UNHEALTHY_MAX: i32 = 200;
pub const AQI_VERY_UNHEALTHY_MAX: i32 = 300;

/// Marker cap for interactive maps, keeps the HTML responsive
pub const MAX_MAP_MARKERS: usize = 1000;

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
