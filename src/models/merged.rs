use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::{AqiCategory, Pollutant};

/// Meteorological season, Dec-Feb winter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Fall,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }

    pub fn all() -> [Season; 4] {
        [Season::Winter, Season::Spring, Season::Summer, Season::Fall]
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Winter" => Ok(Season::Winter),
            "Spring" => Ok(Season::Spring),
            "Summer" => Ok(Season::Summer),
            "Fall" => Ok(Season::Fall),
            other => Err(ProcessingError::InvalidFormat(format!(
                "Unknown season: '{}'",
                other
            ))),
        }
    }
}

/// One station reading joined against wildfire activity.
///
/// The merge guarantees at most one record per (date, pollutant, site_id).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MergedRecord {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub season: Season,

    #[validate(length(min = 1))]
    pub site_id: String,

    pub site_name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub pollutant: Pollutant,
    pub aqi: i32,
    pub category: AqiCategory,

    /// Trailing rolling mean of this site's AQI for the same pollutant;
    /// absent until the rolling pass has run
    #[serde(default)]
    pub rolling_aqi: Option<f64>,

    /// True when a detection fell inside the match radius and day window
    pub wildfire_present: bool,

    /// Distance to the nearest qualifying detection, when one exists
    pub nearest_fire_km: Option<f64>,

    /// Radiative power of that detection
    pub nearest_fire_frp: Option<f64>,
}

impl MergedRecord {
    /// Uniqueness key for the merged table
    pub fn key(&self) -> (NaiveDate, Pollutant, &str) {
        (self.date, self.pollutant, self.site_id.as_str())
    }
}
