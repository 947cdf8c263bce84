use chrono::Duration;
use std::collections::BTreeMap;
use tracing::info;

use crate::models::{MergedRecord, Pollutant};
use crate::utils::constants::DEFAULT_ROLLING_WINDOW_DAYS;

/// Fills the trailing rolling AQI mean per (site, pollutant). The window is
/// calendar-based: a record's mean covers every reading of the same site and
/// pollutant dated within the preceding `window_days` days, itself included.
pub struct RollingAverager {
    window_days: i64,
}

impl RollingAverager {
    pub fn new() -> Self {
        Self {
            window_days: DEFAULT_ROLLING_WINDOW_DAYS,
        }
    }

    pub fn with_window_days(mut self, window_days: i64) -> Self {
        self.window_days = window_days.max(1);
        self
    }

    /// Compute rolling means in place. Requires date-sorted input, which the
    /// merge stage guarantees.
    pub fn apply(&self, records: &mut [MergedRecord]) {
        let mut groups: BTreeMap<(String, Pollutant), Vec<usize>> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            groups
                .entry((record.site_id.clone(), record.pollutant))
                .or_default()
                .push(index);
        }

        let horizon = Duration::days(self.window_days - 1);

        for indices in groups.values() {
            let mut start = 0usize;
            let mut sum = 0.0f64;

            for (position, &index) in indices.iter().enumerate() {
                sum += records[index].aqi as f64;

                let cutoff = records[index].date - horizon;
                while records[indices[start]].date < cutoff {
                    sum -= records[indices[start]].aqi as f64;
                    start += 1;
                }

                let count = (position - start + 1) as f64;
                records[index].rolling_aqi = Some(sum / count);
            }
        }

        info!(
            records = records.len(),
            window_days = self.window_days,
            "computed rolling AQI means"
        );
    }
}

impl Default for RollingAverager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AqiCategory, Season};
    use chrono::NaiveDate;

    fn record(date: &str, site_id: &str, pollutant: Pollutant, aqi: i32) -> MergedRecord {
        let date: NaiveDate = date.parse().unwrap();
        MergedRecord {
            date,
            year: chrono::Datelike::year(&date),
            month: chrono::Datelike::month(&date),
            season: Season::from_month(chrono::Datelike::month(&date)),
            site_id: site_id.to_string(),
            site_name: format!("Site {}", site_id),
            latitude: 39.7512,
            longitude: -104.9876,
            pollutant,
            aqi,
            category: AqiCategory::from_aqi(aqi),
            rolling_aqi: None,
            wildfire_present: false,
            nearest_fire_km: None,
            nearest_fire_frp: None,
        }
    }

    #[test]
    fn test_trailing_mean_over_consecutive_days() {
        let mut records = vec![
            record("2020-08-01", "080310002", Pollutant::Pm25, 40),
            record("2020-08-02", "080310002", Pollutant::Pm25, 60),
            record("2020-08-03", "080310002", Pollutant::Pm25, 80),
        ];

        RollingAverager::new().apply(&mut records);

        assert_eq!(records[0].rolling_aqi, Some(40.0));
        assert_eq!(records[1].rolling_aqi, Some(50.0));
        assert_eq!(records[2].rolling_aqi, Some(60.0));
    }

    #[test]
    fn test_window_of_one_day_is_identity() {
        let mut records = vec![
            record("2020-08-01", "080310002", Pollutant::Pm25, 40),
            record("2020-08-02", "080310002", Pollutant::Pm25, 60),
        ];

        RollingAverager::new().with_window_days(1).apply(&mut records);

        assert_eq!(records[0].rolling_aqi, Some(40.0));
        assert_eq!(records[1].rolling_aqi, Some(60.0));
    }

    #[test]
    fn test_readings_beyond_window_fall_out() {
        let mut records = vec![
            record("2020-07-01", "080310002", Pollutant::Pm25, 200),
            record("2020-08-14", "080310002", Pollutant::Pm25, 40),
            record("2020-08-15", "080310002", Pollutant::Pm25, 60),
        ];

        RollingAverager::new().with_window_days(30).apply(&mut records);

        // The July reading is 45 days old on 08-15, outside the window
        assert_eq!(records[2].rolling_aqi, Some(50.0));
    }

    #[test]
    fn test_sites_and_pollutants_average_independently() {
        let mut records = vec![
            record("2020-08-01", "080310002", Pollutant::Pm25, 100),
            record("2020-08-01", "080410013", Pollutant::Pm25, 20),
            record("2020-08-02", "080310002", Pollutant::Pm25, 100),
            record("2020-08-02", "080310002", Pollutant::Ozone, 30),
        ];

        RollingAverager::new().apply(&mut records);

        assert_eq!(records[1].rolling_aqi, Some(20.0));
        assert_eq!(records[2].rolling_aqi, Some(100.0));
        assert_eq!(records[3].rolling_aqi, Some(30.0));
    }

    #[test]
    fn test_empty_input_is_a_no_op() {
        let mut records: Vec<MergedRecord> = Vec::new();
        RollingAverager::new().apply(&mut records);
        assert!(records.is_empty());
    }
}
