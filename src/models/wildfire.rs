use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::Season;
use crate::utils::constants::{MODIS_HIGH_CONFIDENCE_MIN, MODIS_LOW_CONFIDENCE_MAX};
use crate::utils::coordinates::is_within_colorado;

/// Detection confidence. VIIRS reports l/n/h letters; MODIS reports a
/// 0-100 score which is binned the same way the archive documentation
/// suggests (<30 low, 30-80 nominal, >80 high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Nominal,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Nominal => "nominal",
            Confidence::High => "high",
        }
    }
}

impl FromStr for Confidence {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "l" | "low" => return Ok(Confidence::Low),
            "n" | "nominal" => return Ok(Confidence::Nominal),
            "h" | "high" => return Ok(Confidence::High),
            _ => {}
        }

        // MODIS numeric score
        if let Ok(score) = value.parse::<f64>() {
            return Ok(if score < MODIS_LOW_CONFIDENCE_MAX {
                Confidence::Low
            } else if score > MODIS_HIGH_CONFIDENCE_MIN {
                Confidence::High
            } else {
                Confidence::Nominal
            });
        }

        Err(ProcessingError::InvalidConfidence(s.to_string()))
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized satellite hotspot detection
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WildfireDetection {
    pub date: NaiveDate,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    /// Brightness temperature in Kelvin (bright_ti4 for VIIRS)
    pub brightness: Option<f64>,

    /// Fire radiative power in MW
    pub frp: Option<f64>,

    pub confidence: Confidence,
}

impl WildfireDetection {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn season(&self) -> Season {
        Season::from_month(self.date.month())
    }

    pub fn is_within_colorado(&self) -> bool {
        is_within_colorado(self.latitude, self.longitude)
    }
}
