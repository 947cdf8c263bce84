pub mod aqi;
pub mod merged;
pub mod wildfire;

pub use aqi::{AqiCategory, AqiReading, Pollutant};
pub use merged::{MergedRecord, Season};
pub use wildfire::{Confidence, WildfireDetection};
