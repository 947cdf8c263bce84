use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::Season;
use crate::utils::constants::{
    AQI_GOOD_MAX, AQI_MODERATE_MAX, AQI_SENSITIVE_MAX, AQI_UNHEALTHY_MAX, AQI_VERY_UNHEALTHY_MAX,
};

/// Pollutants tracked by the analysis. AirNow reports others (CO, NO2) but
/// only these two are relevant to the wildfire comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "OZONE")]
    Ozone,
    #[serde(rename = "PM2.5")]
    Pm25,
}

impl Pollutant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Ozone => "OZONE",
            Pollutant::Pm25 => "PM2.5",
        }
    }

    /// Short form used in output filenames
    pub fn slug(&self) -> &'static str {
        match self {
            Pollutant::Ozone => "ozone",
            Pollutant::Pm25 => "pm25",
        }
    }

    pub fn all() -> [Pollutant; 2] {
        [Pollutant::Pm25, Pollutant::Ozone]
    }
}

impl FromStr for Pollutant {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "OZONE" | "O3" => Ok(Pollutant::Ozone),
            "PM2.5" | "PM25" => Ok(Pollutant::Pm25),
            other => Err(ProcessingError::InvalidPollutant(other.to_string())),
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// EPA AQI severity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn from_aqi(aqi: i32) -> Self {
        if aqi <= AQI_GOOD_MAX {
            AqiCategory::Good
        } else if aqi <= AQI_MODERATE_MAX {
            AqiCategory::Moderate
        } else if aqi <= AQI_SENSITIVE_MAX {
            AqiCategory::UnhealthyForSensitiveGroups
        } else if aqi <= AQI_UNHEALTHY_MAX {
            AqiCategory::Unhealthy
        } else if aqi <= AQI_VERY_UNHEALTHY_MAX {
            AqiCategory::VeryUnhealthy
        } else {
            AqiCategory::Hazardous
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    /// EPA standard category color, used in map legends
    pub fn color(&self) -> &'static str {
        match self {
            AqiCategory::Good => "#00e400",
            AqiCategory::Moderate => "#ffff00",
            AqiCategory::UnhealthyForSensitiveGroups => "#ff7e00",
            AqiCategory::Unhealthy => "#ff0000",
            AqiCategory::VeryUnhealthy => "#8f3f97",
            AqiCategory::Hazardous => "#7e0023",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AqiCategory {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Good" => Ok(AqiCategory::Good),
            "Moderate" => Ok(AqiCategory::Moderate),
            "Unhealthy for Sensitive Groups" => Ok(AqiCategory::UnhealthyForSensitiveGroups),
            "Unhealthy" => Ok(AqiCategory::Unhealthy),
            "Very Unhealthy" => Ok(AqiCategory::VeryUnhealthy),
            "Hazardous" => Ok(AqiCategory::Hazardous),
            other => Err(ProcessingError::InvalidFormat(format!(
                "Unknown AQI category: '{}'",
                other
            ))),
        }
    }
}

/// A single normalized station reading. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AqiReading {
    pub date: NaiveDate,

    #[validate(length(min = 1))]
    pub site_id: String,

    pub site_name: String,

    pub pollutant: Pollutant,

    /// Raw measured concentration (ppb for ozone, ug/m3 for PM2.5)
    pub concentration: Option<f64>,

    pub aqi: i32,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl AqiReading {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn season(&self) -> Season {
        Season::from_month(self.date.month())
    }

    pub fn category(&self) -> AqiCategory {
        AqiCategory::from_aqi(self.aqi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pollutant_parsing() {
        assert_eq!("OZONE".parse::<Pollutant>().unwrap(), Pollutant::Ozone);
        assert_eq!("ozone".parse::<Pollutant>().unwrap(), Pollutant::Ozone);
        assert_eq!("PM2.5".parse::<Pollutant>().unwrap(), Pollutant::Pm25);
        assert_eq!("pm25".parse::<Pollutant>().unwrap(), Pollutant::Pm25);
        assert!("PM10".parse::<Pollutant>().is_err());
    }

    #[test]
    fn test_aqi_categories() {
        assert_eq!(AqiCategory::from_aqi(42), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(50), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(51), AqiCategory::Moderate);
        assert_eq!(
            AqiCategory::from_aqi(150),
            AqiCategory::UnhealthyForSensitiveGroups
        );
        assert_eq!(AqiCategory::from_aqi(180), AqiCategory::Unhealthy);
        assert_eq!(AqiCategory::from_aqi(250), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::from_aqi(400), AqiCategory::Hazardous);
    }

    #[test]
    fn test_category_round_trip() {
        for aqi in [10, 75, 125, 175, 250, 350] {
            let category = AqiCategory::from_aqi(aqi);
            assert_eq!(category.as_str().parse::<AqiCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_reading_validation() {
        let reading = AqiReading {
            date: NaiveDate::from_ymd_opt(2020, 8, 15).unwrap(),
            site_id: "080310002".to_string(),
            site_name: "Denver - CAMP".to_string(),
            pollutant: Pollutant::Pm25,
            concentration: Some(95.2),
            aqi: 180,
            latitude: 39.7512,
            longitude: -104.9876,
        };

        assert!(reading.validate().is_ok());
        assert_eq!(reading.year(), 2020);
        assert_eq!(reading.season(), Season::Summer);
        assert_eq!(reading.category(), AqiCategory::Unhealthy);
    }
}
