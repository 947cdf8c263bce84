use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use crate::models::{AqiReading, MergedRecord, Season, WildfireDetection};
use crate::utils::constants::{DEFAULT_DAY_WINDOW, DEFAULT_MATCH_RADIUS_KM};
use crate::utils::coordinates::haversine_distance;

/// Proximity matching configuration. The day window widens the date match
/// symmetrically (±N days) to account for smoke drift lag.
#[derive(Debug, Clone, Copy)]
pub struct MergeConfig {
    pub radius_km: f64,
    pub day_window: i64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_MATCH_RADIUS_KM,
            day_window: DEFAULT_DAY_WINDOW,
        }
    }
}

/// Joins station readings against wildfire detections by date and
/// great-circle distance.
pub struct Merger {
    config: MergeConfig,
}

impl Merger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Produce one merged record per (date, pollutant, site). Duplicate
    /// readings for the same key collapse to the first occurrence, so the
    /// output is deterministic for identical inputs and configuration.
    pub fn merge(
        &self,
        readings: &[AqiReading],
        detections: &[WildfireDetection],
    ) -> Vec<MergedRecord> {
        // Collapse duplicates; BTreeMap fixes the processing order
        let mut unique: BTreeMap<(NaiveDate, &str, &str), &AqiReading> = BTreeMap::new();
        for reading in readings {
            unique
                .entry((reading.date, reading.pollutant.as_str(), &reading.site_id))
                .or_insert(reading);
        }

        let index = DetectionIndex::build(detections);
        let config = self.config;

        let mut records: Vec<MergedRecord> = unique
            .into_iter()
            .map(|(_, r)| r)
            .collect::<Vec<_>>()
            .par_iter()
            .map(|reading| {
                let nearest = index.nearest_within(
                    reading.date,
                    reading.latitude,
                    reading.longitude,
                    config,
                );

                MergedRecord {
                    date: reading.date,
                    year: reading.year(),
                    month: reading.month(),
                    season: Season::from_month(reading.month()),
                    site_id: reading.site_id.clone(),
                    site_name: reading.site_name.clone(),
                    latitude: reading.latitude,
                    longitude: reading.longitude,
                    pollutant: reading.pollutant,
                    aqi: reading.aqi,
                    category: reading.category(),
                    rolling_aqi: None,
                    wildfire_present: nearest.is_some(),
                    nearest_fire_km: nearest.map(|m| m.distance_km),
                    nearest_fire_frp: nearest.and_then(|m| m.frp),
                }
            })
            .collect();

        records.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.pollutant.cmp(&b.pollutant))
                .then_with(|| a.site_id.cmp(&b.site_id))
        });

        let flagged = records.iter().filter(|r| r.wildfire_present).count();
        info!(
            merged = records.len(),
            wildfire_flagged = flagged,
            radius_km = config.radius_km,
            day_window = config.day_window,
            "merged AQI readings with wildfire detections"
        );

        records
    }
}

#[derive(Debug, Clone, Copy)]
struct NearestMatch {
    distance_km: f64,
    frp: Option<f64>,
}

/// Date-bucketed detection index so each reading only scans the detections
/// inside its day window.
struct DetectionIndex<'a> {
    by_date: HashMap<NaiveDate, Vec<&'a WildfireDetection>>,
}

impl<'a> DetectionIndex<'a> {
    fn build(detections: &'a [WildfireDetection]) -> Self {
        let mut by_date: HashMap<NaiveDate, Vec<&WildfireDetection>> = HashMap::new();
        for detection in detections {
            by_date.entry(detection.date).or_default().push(detection);
        }
        Self { by_date }
    }

    /// Nearest qualifying detection. Ties on distance resolve to the
    /// earlier acquisition date, then to input order.
    fn nearest_within(
        &self,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
        config: MergeConfig,
    ) -> Option<NearestMatch> {
        let mut best: Option<(f64, NaiveDate, NearestMatch)> = None;

        for offset in -config.day_window..=config.day_window {
            let day = date + Duration::days(offset);
            let Some(candidates) = self.by_date.get(&day) else {
                continue;
            };

            for detection in candidates {
                let distance =
                    haversine_distance(latitude, longitude, detection.latitude, detection.longitude);
                if distance > config.radius_km {
                    continue;
                }

                let closer = match &best {
                    None => true,
                    Some((best_distance, best_date, _)) => {
                        distance < *best_distance
                            || (distance == *best_distance && detection.date < *best_date)
                    }
                };

                if closer {
                    best = Some((
                        distance,
                        detection.date,
                        NearestMatch {
                            distance_km: distance,
                            frp: detection.frp,
                        },
                    ));
                }
            }
        }

        best.map(|(_, _, m)| m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, Pollutant};

    fn reading(date: &str, pollutant: Pollutant, aqi: i32, lat: f64, lon: f64) -> AqiReading {
        AqiReading {
            date: date.parse().unwrap(),
            site_id: "080310002".to_string(),
            site_name: "Denver - CAMP".to_string(),
            pollutant,
            concentration: None,
            aqi,
            latitude: lat,
            longitude: lon,
        }
    }

    fn detection(date: &str, lat: f64, lon: f64, frp: f64) -> WildfireDetection {
        WildfireDetection {
            date: date.parse().unwrap(),
            latitude: lat,
            longitude: lon,
            brightness: Some(345.0),
            frp: Some(frp),
            confidence: Confidence::Nominal,
        }
    }

    #[test]
    fn test_same_date_within_radius_is_flagged() {
        // Denver PM2.5 reading with a detection ~33km away on the same date
        let readings = vec![reading("2020-08-15", Pollutant::Pm25, 180, 39.7392, -104.9903)];
        let detections = vec![detection("2020-08-15", 39.9000, -104.6500, 12.4)];

        let merger = Merger::new(MergeConfig::default());
        let records = merger.merge(&readings, &detections);

        assert_eq!(records.len(), 1);
        assert!(records[0].wildfire_present);
        let distance = records[0].nearest_fire_km.unwrap();
        assert!(distance < 50.0, "distance was {}", distance);
        assert_eq!(records[0].nearest_fire_frp, Some(12.4));
    }

    #[test]
    fn test_outside_radius_is_not_flagged() {
        // Durango is ~400km from Denver
        let readings = vec![reading("2020-08-15", Pollutant::Pm25, 180, 39.7392, -104.9903)];
        let detections = vec![detection("2020-08-15", 37.2753, -107.8801, 40.0)];

        let merger = Merger::new(MergeConfig::default());
        let records = merger.merge(&readings, &detections);

        assert!(!records[0].wildfire_present);
        assert_eq!(records[0].nearest_fire_km, None);
    }

    #[test]
    fn test_different_date_requires_day_window() {
        let readings = vec![reading("2020-08-15", Pollutant::Pm25, 180, 39.7392, -104.9903)];
        let detections = vec![detection("2020-08-14", 39.9000, -104.6500, 12.4)];

        let same_day = Merger::new(MergeConfig {
            radius_km: 50.0,
            day_window: 0,
        });
        assert!(!same_day.merge(&readings, &detections)[0].wildfire_present);

        let widened = Merger::new(MergeConfig {
            radius_km: 50.0,
            day_window: 1,
        });
        assert!(widened.merge(&readings, &detections)[0].wildfire_present);
    }

    #[test]
    fn test_nearest_detection_wins() {
        let readings = vec![reading("2020-08-15", Pollutant::Pm25, 180, 39.7392, -104.9903)];
        let detections = vec![
            detection("2020-08-15", 40.0500, -105.3000, 30.0), // farther
            detection("2020-08-15", 39.8000, -105.0500, 7.7),  // nearer
        ];

        let merger = Merger::new(MergeConfig::default());
        let records = merger.merge(&readings, &detections);

        assert_eq!(records[0].nearest_fire_frp, Some(7.7));
    }

    #[test]
    fn test_duplicate_readings_collapse() {
        let readings = vec![
            reading("2020-08-15", Pollutant::Pm25, 180, 39.7392, -104.9903),
            reading("2020-08-15", Pollutant::Pm25, 175, 39.7392, -104.9903),
        ];

        let merger = Merger::new(MergeConfig::default());
        let records = merger.merge(&readings, &[]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].aqi, 180);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let readings = vec![
            reading("2020-08-15", Pollutant::Pm25, 180, 39.7392, -104.9903),
            reading("2020-08-15", Pollutant::Ozone, 52, 39.7392, -104.9903),
            reading("2020-08-16", Pollutant::Pm25, 95, 38.8339, -104.8214),
        ];
        let detections = vec![
            detection("2020-08-15", 39.9000, -104.6500, 12.4),
            detection("2020-08-16", 38.9000, -104.9000, 5.0),
        ];

        let merger = Merger::new(MergeConfig::default());
        let first = merger.merge(&readings, &detections);
        let second = merger.merge(&readings, &detections);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.key(), b.key());
            assert_eq!(a.wildfire_present, b.wildfire_present);
            assert_eq!(a.nearest_fire_km, b.nearest_fire_km);
        }
    }

    #[test]
    fn test_empty_inputs_produce_empty_output() {
        let merger = Merger::new(MergeConfig::default());
        assert!(merger.merge(&[], &[]).is_empty());
    }
}
