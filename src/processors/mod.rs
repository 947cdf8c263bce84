pub mod aggregator;
pub mod merger;
pub mod normalizer;
pub mod rolling;

pub use aggregator::{AggregateStat, Aggregator, GroupBy};
pub use merger::{MergeConfig, Merger};
pub use normalizer::{CleaningReport, Normalizer};
pub use rolling::RollingAverager;
