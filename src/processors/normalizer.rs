use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::models::{AqiReading, Confidence, Pollutant, WildfireDetection};
use crate::readers::{CsvReadOutcome, RawAqiRow, RawFirmsRow};
use crate::utils::constants::MISSING_SENTINEL;
use crate::utils::coordinates::is_within_colorado;

/// Per-dataset cleaning outcome. Every dropped row lands in exactly one
/// counter; nothing in normalization is fatal.
#[derive(Debug, Clone, Default)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub malformed_rows: usize,
    pub bad_date: usize,
    pub missing_value: usize,
    pub unknown_pollutant: usize,
    pub out_of_bounds: usize,
    pub below_confidence: usize,
    pub outside_year_range: usize,
    pub kept: usize,
}

impl CleaningReport {
    pub fn dropped(&self) -> usize {
        self.rows_in + self.malformed_rows - self.kept
    }

    pub fn summary(&self, label: &str) -> String {
        format!(
            "{} cleaning report:\n\
             \x20 rows read:            {}\n\
             \x20 malformed:            {}\n\
             \x20 unparseable dates:    {}\n\
             \x20 missing values:       {}\n\
             \x20 unknown pollutant:    {}\n\
             \x20 outside Colorado:     {}\n\
             \x20 below confidence:     {}\n\
             \x20 outside year range:   {}\n\
             \x20 kept:                 {}",
            label,
            self.rows_in + self.malformed_rows,
            self.malformed_rows,
            self.bad_date,
            self.missing_value,
            self.unknown_pollutant,
            self.out_of_bounds,
            self.below_confidence,
            self.outside_year_range,
            self.kept,
        )
    }
}

/// Converts raw provider rows into canonical records: ISO dates, decimal
/// degrees inside the Colorado box, -999 sentinels mapped to missing.
pub struct Normalizer {
    year_range: Option<(i32, i32)>,
    min_confidence: Confidence,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            year_range: None,
            min_confidence: Confidence::Nominal,
        }
    }

    pub fn with_year_range(mut self, start_year: i32, end_year: i32) -> Self {
        self.year_range = Some((start_year, end_year));
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: Confidence) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn normalize_aqi(
        &self,
        outcome: CsvReadOutcome<RawAqiRow>,
    ) -> (Vec<AqiReading>, CleaningReport) {
        let mut report = CleaningReport {
            rows_in: outcome.rows.len(),
            malformed_rows: outcome.malformed_rows,
            ..Default::default()
        };

        let mut readings = Vec::with_capacity(outcome.rows.len());

        for row in outcome.rows {
            let Some(date) = parse_observation_date(&row.utc) else {
                report.bad_date += 1;
                continue;
            };

            if !self.in_year_range(date) {
                report.outside_year_range += 1;
                continue;
            }

            let Ok(pollutant) = row.parameter.parse::<Pollutant>() else {
                report.unknown_pollutant += 1;
                continue;
            };

            let aqi = match row.aqi {
                Some(v) if v != MISSING_SENTINEL => v.round() as i32,
                _ => {
                    report.missing_value += 1;
                    continue;
                }
            };

            let (Some(latitude), Some(longitude)) = (row.latitude, row.longitude) else {
                report.missing_value += 1;
                continue;
            };

            if !is_within_colorado(latitude, longitude) {
                report.out_of_bounds += 1;
                continue;
            }

            let concentration = row
                .raw_concentration
                .filter(|v| *v != MISSING_SENTINEL && *v >= 0.0);

            let site_id = row
                .full_aqs_code
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| row.site_name.clone());

            readings.push(AqiReading {
                date,
                site_id,
                site_name: row.site_name,
                pollutant,
                concentration,
                aqi,
                latitude,
                longitude,
            });
        }

        report.kept = readings.len();
        info!(
            kept = report.kept,
            dropped = report.dropped(),
            "normalized AQI readings"
        );

        (readings, report)
    }

    pub fn normalize_fires(
        &self,
        outcome: CsvReadOutcome<RawFirmsRow>,
    ) -> (Vec<WildfireDetection>, CleaningReport) {
        let mut report = CleaningReport {
            rows_in: outcome.rows.len(),
            malformed_rows: outcome.malformed_rows,
            ..Default::default()
        };

        let mut detections = Vec::with_capacity(outcome.rows.len());

        for row in outcome.rows {
            let Some(date) = parse_observation_date(&row.acq_date) else {
                report.bad_date += 1;
                continue;
            };

            if !self.in_year_range(date) {
                report.outside_year_range += 1;
                continue;
            }

            let (Some(latitude), Some(longitude)) = (row.latitude, row.longitude) else {
                report.missing_value += 1;
                continue;
            };

            if !is_within_colorado(latitude, longitude) {
                report.out_of_bounds += 1;
                continue;
            }

            let confidence = match row.confidence.as_deref() {
                Some(raw) => match raw.parse::<Confidence>() {
                    Ok(c) => c,
                    Err(_) => {
                        report.missing_value += 1;
                        continue;
                    }
                },
                None => {
                    report.missing_value += 1;
                    continue;
                }
            };

            if confidence < self.min_confidence {
                report.below_confidence += 1;
                continue;
            }

            let brightness = row.brightness_value().filter(|v| *v != MISSING_SENTINEL);
            let frp = row.frp.filter(|v| *v != MISSING_SENTINEL);

            detections.push(WildfireDetection {
                date,
                latitude,
                longitude,
                brightness,
                frp,
                confidence,
            });
        }

        report.kept = detections.len();
        info!(
            kept = report.kept,
            dropped = report.dropped(),
            "normalized wildfire detections"
        );

        (detections, report)
    }

    fn in_year_range(&self, date: NaiveDate) -> bool {
        match self.year_range {
            Some((start, end)) => (start..=end).contains(&date.year()),
            None => true,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a provider timestamp down to a calendar date. AirNow ships
/// `YYYY-MM-DDTHH`, FIRMS ships plain `YYYY-MM-DD`; both lead with the
/// ISO date, so the first ten characters carry everything needed.
pub fn parse_observation_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    // get() rather than slicing: byte 10 may fall inside a multi-byte
    // character on garbage input, which must count as a bad date
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aqi_row(utc: &str, parameter: &str, aqi: Option<f64>, lat: f64, lon: f64) -> RawAqiRow {
        RawAqiRow {
            latitude: Some(lat),
            longitude: Some(lon),
            utc: utc.to_string(),
            parameter: parameter.to_string(),
            unit: "UG/M3".to_string(),
            aqi,
            raw_concentration: Some(95.2),
            site_name: "Denver - CAMP".to_string(),
            full_aqs_code: Some("080310002".to_string()),
        }
    }

    fn fire_row(acq_date: &str, confidence: &str, lat: f64, lon: f64) -> RawFirmsRow {
        RawFirmsRow {
            latitude: Some(lat),
            longitude: Some(lon),
            acq_date: acq_date.to_string(),
            brightness: None,
            bright_ti4: Some(345.1),
            confidence: Some(confidence.to_string()),
            frp: Some(12.4),
            detection_type: Some(0),
            daynight: Some("D".to_string()),
        }
    }

    fn outcome<T>(rows: Vec<T>) -> CsvReadOutcome<T> {
        CsvReadOutcome {
            rows,
            malformed_rows: 0,
        }
    }

    #[test]
    fn test_normalize_aqi_happy_path() {
        let normalizer = Normalizer::new();
        let (readings, report) = normalizer.normalize_aqi(outcome(vec![aqi_row(
            "2020-08-15T13",
            "PM2.5",
            Some(180.0),
            39.7512,
            -104.9876,
        )]));

        assert_eq!(readings.len(), 1);
        assert_eq!(report.kept, 1);
        assert_eq!(report.dropped(), 0);
        assert_eq!(
            readings[0].date,
            NaiveDate::from_ymd_opt(2020, 8, 15).unwrap()
        );
        assert_eq!(readings[0].pollutant, Pollutant::Pm25);
        assert_eq!(readings[0].aqi, 180);
        assert_eq!(readings[0].site_id, "080310002");
    }

    #[test]
    fn test_drop_reasons_are_counted() {
        let normalizer = Normalizer::new();
        let (readings, report) = normalizer.normalize_aqi(outcome(vec![
            aqi_row("2020-08-15T13", "PM2.5", Some(180.0), 39.7512, -104.9876),
            aqi_row("garbage", "PM2.5", Some(44.0), 39.7512, -104.9876),
            aqi_row("2020-08-15T13", "NO2", Some(44.0), 39.7512, -104.9876),
            aqi_row("2020-08-15T13", "PM2.5", Some(-999.0), 39.7512, -104.9876),
            aqi_row("2020-08-15T13", "OZONE", Some(44.0), 35.0844, -106.6504),
        ]));

        assert_eq!(readings.len(), 1);
        assert_eq!(report.bad_date, 1);
        assert_eq!(report.unknown_pollutant, 1);
        assert_eq!(report.missing_value, 1);
        assert_eq!(report.out_of_bounds, 1);
        assert_eq!(report.dropped(), 4);
    }

    #[test]
    fn test_year_range_filter() {
        let normalizer = Normalizer::new().with_year_range(2019, 2024);
        let (readings, report) = normalizer.normalize_aqi(outcome(vec![
            aqi_row("2018-12-31T23", "PM2.5", Some(60.0), 39.7512, -104.9876),
            aqi_row("2019-01-01T00", "PM2.5", Some(60.0), 39.7512, -104.9876),
        ]));

        assert_eq!(readings.len(), 1);
        assert_eq!(report.outside_year_range, 1);
    }

    #[test]
    fn test_confidence_filter() {
        let normalizer = Normalizer::new().with_min_confidence(Confidence::Nominal);
        let (detections, report) = normalizer.normalize_fires(outcome(vec![
            fire_row("2020-08-15", "l", 40.1672, -105.5828),
            fire_row("2020-08-15", "n", 40.1672, -105.5828),
            fire_row("2020-08-15", "h", 40.1672, -105.5828),
        ]));

        assert_eq!(detections.len(), 2);
        assert_eq!(report.below_confidence, 1);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let normalizer = Normalizer::new();
        let (first, _) = normalizer.normalize_aqi(outcome(vec![aqi_row(
            "2020-08-15T13",
            "PM2.5",
            Some(180.0),
            39.7512,
            -104.9876,
        )]));

        // Re-normalize from the canonical representation
        let canonical = aqi_row(
            &first[0].date.to_string(),
            first[0].pollutant.as_str(),
            Some(first[0].aqi as f64),
            first[0].latitude,
            first[0].longitude,
        );
        let (second, report) = normalizer.normalize_aqi(outcome(vec![canonical]));

        assert_eq!(report.dropped(), 0);
        assert_eq!(second[0].date, first[0].date);
        assert_eq!(second[0].pollutant, first[0].pollutant);
        assert_eq!(second[0].aqi, first[0].aqi);
    }

    #[test]
    fn test_parse_observation_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2020, 8, 15).unwrap();
        assert_eq!(parse_observation_date("2020-08-15"), Some(expected));
        assert_eq!(parse_observation_date("2020-08-15T13"), Some(expected));
        assert_eq!(parse_observation_date("2020-08-15T13:00"), Some(expected));
        assert_eq!(parse_observation_date("08/15/2020"), None);
        assert_eq!(parse_observation_date(""), None);
    }

    #[test]
    fn test_parse_observation_date_multibyte_garbage() {
        // Byte 10 lands inside the two-byte 'é'; must drop, not panic
        assert_eq!(parse_observation_date("2020-08-1é"), None);
        assert_eq!(parse_observation_date("日付なし"), None);

        // A clean ISO prefix with trailing junk still truncates like any
        // other timestamp suffix
        let expected = NaiveDate::from_ymd_opt(2020, 8, 15).unwrap();
        assert_eq!(parse_observation_date("2020-08-15é"), Some(expected));
    }

    #[test]
    fn test_multibyte_date_rows_are_dropped_and_counted() {
        let normalizer = Normalizer::new();
        let (detections, report) = normalizer.normalize_fires(outcome(vec![
            fire_row("2020-08-1é", "n", 40.1672, -105.5828),
            fire_row("2020-08-15", "n", 40.1672, -105.5828),
        ]));

        assert_eq!(detections.len(), 1);
        assert_eq!(report.bad_date, 1);
    }
}
