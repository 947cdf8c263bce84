use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::error::{ProcessingError, Result};
use crate::models::{MergedRecord, Pollutant, Season};

const CHART_WIDTH: u32 = 900;
const CHART_HEIGHT: u32 = 600;

fn chart_err<E: std::fmt::Display>(e: E) -> ProcessingError {
    ProcessingError::Chart(e.to_string())
}

fn pollutant_color(pollutant: Pollutant) -> RGBColor {
    match pollutant {
        Pollutant::Pm25 => RGBColor(0xd6, 0x28, 0x28),
        Pollutant::Ozone => RGBColor(0x1f, 0x77, 0xb4),
    }
}

/// Seasonal AQI distribution as side-by-side boxplots per pollutant
pub struct SeasonalChart;

impl SeasonalChart {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, records: &[MergedRecord], path: &Path) -> Result<()> {
        if records.is_empty() {
            warn!(path = %path.display(), "no records, skipping seasonal chart");
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut groups: BTreeMap<(Pollutant, Season), Vec<f64>> = BTreeMap::new();
        for record in records {
            groups
                .entry((record.pollutant, record.season))
                .or_default()
                .push(record.aqi as f64);
        }

        let quartiles: Vec<(Pollutant, Season, Quartiles)> = groups
            .into_iter()
            .map(|((pollutant, season), values)| (pollutant, season, Quartiles::new(&values)))
            .collect();

        let y_max = quartiles
            .iter()
            .flat_map(|(_, _, q)| q.values().to_vec())
            .fold(0.0f32, f32::max)
            .max(50.0)
            * 1.1;

        let root = SVGBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Seasonal AQI distribution", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((0i32..3i32).into_segmented(), 0f32..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_desc("Season")
            .y_desc("AQI")
            .x_labels(4)
            .x_label_formatter(&|value| match value {
                SegmentValue::CenterOf(i) => Season::all()
                    .get(*i as usize)
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()
            .map_err(chart_err)?;

        for (pollutant, season, quartile) in &quartiles {
            let index = Season::all().iter().position(|s| s == season).unwrap() as i32;
            let offset = match pollutant {
                Pollutant::Pm25 => -20,
                Pollutant::Ozone => 20,
            };

            chart
                .draw_series(std::iter::once(
                    Boxplot::new_vertical(SegmentValue::CenterOf(index), quartile)
                        .width(30)
                        .offset(offset)
                        .style(pollutant_color(*pollutant)),
                ))
                .map_err(chart_err)?;
        }

        root.present().map_err(chart_err)?;
        Ok(())
    }
}

impl Default for SeasonalChart {
    fn default() -> Self {
        Self::new()
    }
}
