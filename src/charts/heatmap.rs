use serde_json::json;
use std::path::Path;
use tracing::warn;

use crate::error::Result;
use crate::models::{MergedRecord, WildfireDetection};
use crate::utils::constants::{CO_CENTER_LAT, CO_CENTER_LON, MAX_MAP_MARKERS};

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Colorado AQI and Wildfire Activity</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>
<style>
  html, body, #map { height: 100%; margin: 0; }
  .legend { background: white; padding: 8px 12px; line-height: 1.5; border-radius: 4px; }
  .legend i { width: 12px; height: 12px; display: inline-block; margin-right: 6px; }
</style>
</head>
<body>
<div id="map"></div>
<script>
  var map = L.map('map').setView([__CENTER_LAT__, __CENTER_LON__], 7);
  L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
    attribution: '&copy; OpenStreetMap contributors'
  }).addTo(map);

  var markers = __MARKERS__;
  markers.forEach(function (m) {
    L.circleMarker([m.lat, m.lon], {
      radius: 6,
      color: m.color,
      fillColor: m.color,
      fillOpacity: 0.7
    }).bindPopup(
      '<b>' + m.site + '</b><br>' + m.date + '<br>' +
      m.pollutant + ' AQI: ' + m.aqi + ' (' + m.category + ')'
    ).addTo(map);
  });

  var firePoints = __FIRE_POINTS__;
  if (firePoints.length > 0) {
    L.heatLayer(firePoints, { radius: 18, blur: 12, maxZoom: 10 }).addTo(map);
  }

  var legend = L.control({ position: 'bottomright' });
  legend.onAdd = function () {
    var div = L.DomUtil.create('div', 'legend');
    div.innerHTML = __LEGEND__;
    return div;
  };
  legend.addTo(map);
</script>
</body>
</html>
"#;

/// Interactive map: AQI site markers colored by category plus a wildfire
/// heat layer weighted by radiative power.
pub struct HeatmapBuilder {
    max_markers: usize,
}

impl HeatmapBuilder {
    pub fn new() -> Self {
        Self {
            max_markers: MAX_MAP_MARKERS,
        }
    }

    pub fn with_max_markers(mut self, max_markers: usize) -> Self {
        self.max_markers = max_markers.max(1);
        self
    }

    pub fn render(
        &self,
        records: &[MergedRecord],
        detections: &[WildfireDetection],
        path: &Path,
    ) -> Result<()> {
        if records.is_empty() && detections.is_empty() {
            warn!(path = %path.display(), "no data, skipping map");
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let sampled = Self::sample(records, self.max_markers);
        let markers: Vec<serde_json::Value> = sampled
            .iter()
            .map(|r| {
                json!({
                    "lat": r.latitude,
                    "lon": r.longitude,
                    "site": r.site_name,
                    "date": r.date.to_string(),
                    "pollutant": r.pollutant.as_str(),
                    "aqi": r.aqi,
                    "category": r.category.as_str(),
                    "color": r.category.color(),
                })
            })
            .collect();

        let max_frp = detections
            .iter()
            .filter_map(|d| d.frp)
            .fold(0.0f64, f64::max);
        let fire_points: Vec<serde_json::Value> = detections
            .iter()
            .map(|d| {
                let weight = match (d.frp, max_frp > 0.0) {
                    (Some(frp), true) => (frp / max_frp).clamp(0.1, 1.0),
                    _ => 0.5,
                };
                json!([d.latitude, d.longitude, weight])
            })
            .collect();

        use crate::models::AqiCategory;
        let legend_html = [
            AqiCategory::Good,
            AqiCategory::Moderate,
            AqiCategory::UnhealthyForSensitiveGroups,
            AqiCategory::Unhealthy,
            AqiCategory::VeryUnhealthy,
            AqiCategory::Hazardous,
        ]
        .iter()
        .map(|c| format!("<i style=\"background:{}\"></i>{}", c.color(), c.as_str()))
        .collect::<Vec<_>>()
        .join("<br>");

        let page = PAGE_TEMPLATE
            .replace("__CENTER_LAT__", &CO_CENTER_LAT.to_string())
            .replace("__CENTER_LON__", &CO_CENTER_LON.to_string())
            .replace("__MARKERS__", &serde_json::to_string(&markers)?)
            .replace("__FIRE_POINTS__", &serde_json::to_string(&fire_points)?)
            .replace("__LEGEND__", &serde_json::to_string(&legend_html)?);

        std::fs::write(path, page)?;
        Ok(())
    }

    /// Keep marker counts readable: evenly strided subset, stable for a
    /// given input order
    fn sample(records: &[MergedRecord], max_markers: usize) -> Vec<&MergedRecord> {
        if records.len() <= max_markers {
            return records.iter().collect();
        }

        let step = records.len() as f64 / max_markers as f64;
        (0..max_markers)
            .map(|i| &records[(i as f64 * step) as usize])
            .collect()
    }
}

impl Default for HeatmapBuilder {
    fn default() -> Self {
        Self::new()
    }
}
