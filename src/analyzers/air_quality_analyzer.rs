use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

use crate::error::Result;
use crate::models::{AqiCategory, MergedRecord, Pollutant};

#[derive(Debug)]
pub struct DatasetStatistics {
    pub total_records: usize,
    pub unique_sites: usize,
    pub date_range: (NaiveDate, NaiveDate),
    pub pollutant_stats: Vec<PollutantStats>,
    pub wildfire_summary: WildfireSummary,
    pub geographic_bounds: GeographicBounds,
}

#[derive(Debug)]
pub struct PollutantStats {
    pub pollutant: Pollutant,
    pub count: usize,
    pub min_aqi: i32,
    pub max_aqi: i32,
    pub mean_aqi: f64,
    pub max_aqi_location: String,
    pub unhealthy_days: usize,
}

#[derive(Debug)]
pub struct WildfireSummary {
    pub total_records: usize,
    pub wildfire_records: usize,
    pub min_fire_distance_km: Option<f64>,
    pub max_fire_frp: Option<f64>,
}

impl WildfireSummary {
    pub fn wildfire_percentage(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        (self.wildfire_records as f64 / self.total_records as f64) * 100.0
    }
}

#[derive(Debug)]
pub struct GeographicBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

pub struct AirQualityAnalyzer;

impl AirQualityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, records: &[MergedRecord]) -> Result<DatasetStatistics> {
        if records.is_empty() {
            return Err(crate::error::ProcessingError::MissingData(
                "No records to analyze".to_string(),
            ));
        }

        let mut unique_sites = HashSet::new();
        let mut min_date = records[0].date;
        let mut max_date = records[0].date;

        let mut min_lat = records[0].latitude;
        let mut max_lat = records[0].latitude;
        let mut min_lon = records[0].longitude;
        let mut max_lon = records[0].longitude;

        let mut wildfire_records = 0;
        let mut min_fire_distance: Option<f64> = None;
        let mut max_fire_frp: Option<f64> = None;

        let mut by_pollutant: BTreeMap<Pollutant, Vec<&MergedRecord>> = BTreeMap::new();

        for record in records {
            unique_sites.insert(record.site_id.as_str());

            if record.date < min_date {
                min_date = record.date;
            }
            if record.date > max_date {
                max_date = record.date;
            }

            if record.latitude < min_lat {
                min_lat = record.latitude;
            }
            if record.latitude > max_lat {
                max_lat = record.latitude;
            }
            if record.longitude < min_lon {
                min_lon = record.longitude;
            }
            if record.longitude > max_lon {
                max_lon = record.longitude;
            }

            if record.wildfire_present {
                wildfire_records += 1;
            }
            if let Some(distance) = record.nearest_fire_km {
                min_fire_distance = Some(match min_fire_distance {
                    Some(best) if best <= distance => best,
                    _ => distance,
                });
            }
            if let Some(frp) = record.nearest_fire_frp {
                max_fire_frp = Some(match max_fire_frp {
                    Some(best) if best >= frp => best,
                    _ => frp,
                });
            }

            by_pollutant.entry(record.pollutant).or_default().push(record);
        }

        let pollutant_stats = by_pollutant
            .into_iter()
            .map(|(pollutant, members)| Self::pollutant_stats(pollutant, &members))
            .collect();

        Ok(DatasetStatistics {
            total_records: records.len(),
            unique_sites: unique_sites.len(),
            date_range: (min_date, max_date),
            pollutant_stats,
            wildfire_summary: WildfireSummary {
                total_records: records.len(),
                wildfire_records,
                min_fire_distance_km: min_fire_distance,
                max_fire_frp,
            },
            geographic_bounds: GeographicBounds {
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            },
        })
    }

    fn pollutant_stats(pollutant: Pollutant, members: &[&MergedRecord]) -> PollutantStats {
        let mut min_aqi = i32::MAX;
        let mut max_aqi = i32::MIN;
        let mut max_aqi_location = String::new();
        let mut sum = 0.0f64;
        let mut unhealthy_days = 0;

        for record in members {
            if record.aqi < min_aqi {
                min_aqi = record.aqi;
            }
            if record.aqi > max_aqi {
                max_aqi = record.aqi;
                max_aqi_location = format!("{} ({})", record.site_name, record.date);
            }
            sum += record.aqi as f64;
            if record.category != AqiCategory::Good && record.category != AqiCategory::Moderate {
                unhealthy_days += 1;
            }
        }

        PollutantStats {
            pollutant,
            count: members.len(),
            min_aqi,
            max_aqi,
            mean_aqi: sum / members.len() as f64,
            max_aqi_location,
            unhealthy_days,
        }
    }
}

impl Default for AirQualityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetStatistics {
    pub fn summary(&self) -> String {
        format!(
            "Sites: {} monitoring sites\n\
            Date Range: {} to {}\n\
            Records: {} total\n\
            Wildfire-flagged: {} ({:.1}%)\n\
            Coverage: {:.2}N-{:.2}N, {:.2}W-{:.2}W",
            self.unique_sites,
            self.date_range.0,
            self.date_range.1,
            self.total_records,
            self.wildfire_summary.wildfire_records,
            self.wildfire_summary.wildfire_percentage(),
            self.geographic_bounds.min_lat,
            self.geographic_bounds.max_lat,
            self.geographic_bounds.min_lon.abs(),
            self.geographic_bounds.max_lon.abs()
        )
    }

    pub fn detailed_summary(&self) -> String {
        let mut lines = vec![self.summary(), String::new()];

        for stats in &self.pollutant_stats {
            lines.push(format!(
                "{}:\n\
                - Records: {}\n\
                - AQI range: {} to {} (mean {:.1})\n\
                - Worst day: {}\n\
                - Days above Moderate: {}",
                stats.pollutant,
                stats.count,
                stats.min_aqi,
                stats.max_aqi,
                stats.mean_aqi,
                stats.max_aqi_location,
                stats.unhealthy_days
            ));
        }

        if let Some(distance) = self.wildfire_summary.min_fire_distance_km {
            lines.push(format!("\nClosest fire to any site: {:.1} km", distance));
        }
        if let Some(frp) = self.wildfire_summary.max_fire_frp {
            lines.push(format!("Strongest matched fire: {:.1} MW", frp));
        }

        lines.join("\n")
    }
}
