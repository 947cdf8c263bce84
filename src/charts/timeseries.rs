use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::error::{ProcessingError, Result};
use crate::models::{MergedRecord, Pollutant};

const CHART_WIDTH: u32 = 1200;
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

/// Daily mean AQI line chart, one series per pollutant
pub struct TimeseriesChart;

impl TimeseriesChart {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, records: &[MergedRecord], path: &Path) -> Result<()> {
        if records.is_empty() {
            warn!(path = %path.display(), "no records, skipping timeseries chart");
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let series = Self::daily_means(records);

        let min_date = records.iter().map(|r| r.date).min().unwrap();
        let mut max_date = records.iter().map(|r| r.date).max().unwrap();
        if max_date == min_date {
            max_date += Duration::days(1);
        }
        let y_max = series
            .values()
            .flat_map(|points| points.iter().map(|(_, mean)| *mean))
            .fold(0.0f64, f64::max)
            .max(50.0)
            * 1.1;

        let root = SVGBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Daily mean AQI, Colorado monitoring sites",
                ("sans-serif", 24),
            )
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(min_date..max_date, 0.0..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Mean AQI")
            .x_label_formatter(&|d| d.format("%Y-%m").to_string())
            .draw()
            .map_err(chart_err)?;

        for (pollutant, points) in &series {
            let color = pollutant_color(*pollutant);
            chart
                .draw_series(LineSeries::new(points.iter().copied(), &color))
                .map_err(chart_err)?
                .label(pollutant.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color));
        }

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
        Ok(())
    }

    fn daily_means(records: &[MergedRecord]) -> BTreeMap<Pollutant, Vec<(NaiveDate, f64)>> {
        let mut sums: BTreeMap<(Pollutant, NaiveDate), (f64, usize)> = BTreeMap::new();
        for record in records {
            let entry = sums.entry((record.pollutant, record.date)).or_insert((0.0, 0));
            entry.0 += record.aqi as f64;
            entry.1 += 1;
        }

        let mut series: BTreeMap<Pollutant, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        for ((pollutant, date), (sum, count)) in sums {
            series
                .entry(pollutant)
                .or_default()
                .push((date, sum / count as f64));
        }
        series
    }
}

impl Default for TimeseriesChart {
    fn default() -> Self {
        Self::new()
    }
}
