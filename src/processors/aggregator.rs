use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{MergedRecord, Pollutant, Season};

/// Grouping axis for the aggregate tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Year,
    Season,
    Pollutant,
    YearSeasonPollutant,
}

/// Sortable group identity; ordering drives the output row order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum GroupKey {
    Year(i32),
    Season(Season),
    Pollutant(Pollutant),
    YearSeasonPollutant(i32, Season, Pollutant),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Year(year) => write!(f, "{}", year),
            GroupKey::Season(season) => write!(f, "{}", season),
            GroupKey::Pollutant(pollutant) => write!(f, "{}", pollutant),
            GroupKey::YearSeasonPollutant(year, season, pollutant) => {
                write!(f, "{}/{}/{}", year, season, pollutant)
            }
        }
    }
}

/// One aggregate row: AQI statistics for a group, split into wildfire and
/// baseline days.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateStat {
    pub group: String,
    pub count: usize,
    pub mean_aqi: f64,
    pub median_aqi: f64,
    pub wildfire_days: usize,
    pub baseline_days: usize,
    pub wildfire_mean_aqi: Option<f64>,
    pub baseline_mean_aqi: Option<f64>,
}

pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Group the merged table and reduce each group to summary statistics.
    /// Pure and deterministic: output order follows the natural key order.
    pub fn aggregate(&self, records: &[MergedRecord], group_by: GroupBy) -> Vec<AggregateStat> {
        let mut groups: BTreeMap<GroupKey, Vec<&MergedRecord>> = BTreeMap::new();

        for record in records {
            let key = match group_by {
                GroupBy::Year => GroupKey::Year(record.year),
                GroupBy::Season => GroupKey::Season(record.season),
                GroupBy::Pollutant => GroupKey::Pollutant(record.pollutant),
                GroupBy::YearSeasonPollutant => {
                    GroupKey::YearSeasonPollutant(record.year, record.season, record.pollutant)
                }
            };
            groups.entry(key).or_default().push(record);
        }

        groups
            .into_iter()
            .map(|(key, members)| Self::reduce(key, &members))
            .collect()
    }

    fn reduce(key: GroupKey, members: &[&MergedRecord]) -> AggregateStat {
        let values: Vec<f64> = members.iter().map(|r| r.aqi as f64).collect();
        let wildfire: Vec<f64> = members
            .iter()
            .filter(|r| r.wildfire_present)
            .map(|r| r.aqi as f64)
            .collect();
        let baseline: Vec<f64> = members
            .iter()
            .filter(|r| !r.wildfire_present)
            .map(|r| r.aqi as f64)
            .collect();

        AggregateStat {
            group: key.to_string(),
            count: values.len(),
            mean_aqi: mean(&values).unwrap_or(0.0),
            median_aqi: median(&values).unwrap_or(0.0),
            wildfire_days: wildfire.len(),
            baseline_days: baseline.len(),
            wildfire_mean_aqi: mean(&wildfire),
            baseline_mean_aqi: mean(&baseline),
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AqiCategory;
    use chrono::NaiveDate;

    fn record(date: &str, pollutant: Pollutant, aqi: i32, wildfire: bool) -> MergedRecord {
        let date: NaiveDate = date.parse().unwrap();
        MergedRecord {
            date,
            year: chrono::Datelike::year(&date),
            month: chrono::Datelike::month(&date),
            season: Season::from_month(chrono::Datelike::month(&date)),
            site_id: "080310002".to_string(),
            site_name: "Denver - CAMP".to_string(),
            latitude: 39.7512,
            longitude: -104.9876,
            pollutant,
            aqi,
            category: AqiCategory::from_aqi(aqi),
            rolling_aqi: None,
            wildfire_present: wildfire,
            nearest_fire_km: wildfire.then_some(30.0),
            nearest_fire_frp: None,
        }
    }

    #[test]
    fn test_mean_matches_arithmetic_mean() {
        let records = vec![
            record("2020-07-01", Pollutant::Pm25, 40, false),
            record("2020-07-02", Pollutant::Pm25, 60, false),
            record("2020-07-03", Pollutant::Pm25, 80, true),
        ];

        let stats = Aggregator::new().aggregate(&records, GroupBy::Year);

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].group, "2020");
        assert_eq!(stats[0].count, 3);
        assert!((stats[0].mean_aqi - 60.0).abs() < f64::EPSILON);
        assert!((stats[0].median_aqi - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wildfire_baseline_split() {
        let records = vec![
            record("2020-08-15", Pollutant::Pm25, 180, true),
            record("2020-08-16", Pollutant::Pm25, 160, true),
            record("2020-08-17", Pollutant::Pm25, 40, false),
        ];

        let stats = Aggregator::new().aggregate(&records, GroupBy::Pollutant);

        assert_eq!(stats[0].wildfire_days, 2);
        assert_eq!(stats[0].baseline_days, 1);
        assert_eq!(stats[0].wildfire_mean_aqi, Some(170.0));
        assert_eq!(stats[0].baseline_mean_aqi, Some(40.0));
    }

    #[test]
    fn test_season_groups_in_calendar_order() {
        let records = vec![
            record("2020-10-01", Pollutant::Ozone, 30, false),
            record("2020-07-01", Pollutant::Ozone, 70, false),
            record("2020-01-15", Pollutant::Ozone, 20, false),
            record("2020-04-15", Pollutant::Ozone, 45, false),
        ];

        let stats = Aggregator::new().aggregate(&records, GroupBy::Season);

        let groups: Vec<&str> = stats.iter().map(|s| s.group.as_str()).collect();
        assert_eq!(groups, vec!["Winter", "Spring", "Summer", "Fall"]);
    }

    #[test]
    fn test_composite_group_splits_by_pollutant() {
        // A summer 2020 PM2.5 record flagged by a nearby fire contributes
        // to the 2020/Summer/PM2.5 mean
        let records = vec![
            record("2020-08-15", Pollutant::Pm25, 180, true),
            record("2020-08-20", Pollutant::Pm25, 20, false),
            record("2020-08-15", Pollutant::Ozone, 52, true),
        ];

        let stats = Aggregator::new().aggregate(&records, GroupBy::YearSeasonPollutant);

        let pm25_summer = stats
            .iter()
            .find(|s| s.group == "2020/Summer/PM2.5")
            .unwrap();
        assert_eq!(pm25_summer.count, 2);
        assert!((pm25_summer.mean_aqi - 100.0).abs() < f64::EPSILON);
        assert_eq!(pm25_summer.wildfire_days, 1);
    }

    #[test]
    fn test_median_even_count() {
        let records = vec![
            record("2020-07-01", Pollutant::Pm25, 10, false),
            record("2020-07-02", Pollutant::Pm25, 20, false),
            record("2020-07-03", Pollutant::Pm25, 30, false),
            record("2020-07-04", Pollutant::Pm25, 100, false),
        ];

        let stats = Aggregator::new().aggregate(&records, GroupBy::Year);
        assert!((stats[0].median_aqi - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let stats = Aggregator::new().aggregate(&[], GroupBy::YearSeasonPollutant);
        assert!(stats.is_empty());
    }
}
