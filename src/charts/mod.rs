pub mod heatmap;
pub mod seasonal;
pub mod timeseries;

pub use heatmap::HeatmapBuilder;
pub use seasonal::SeasonalChart;
pub use timeseries::TimeseriesChart;
