use crate::error::{ProcessingError, Result};
use crate::utils::constants::{CO_MAX_LAT, CO_MAX_LON, CO_MIN_LAT, CO_MIN_LON};

/// Check whether a point falls inside the Colorado bounding box.
///
/// Both providers report decimal degrees, so a plain box test against the
/// AirNow BBOX is sufficient; the county-level spatial join of the source
/// analysis is approximated by the box plus the proximity merge.
pub fn is_within_colorado(latitude: f64, longitude: f64) -> bool {
    (CO_MIN_LAT..=CO_MAX_LAT).contains(&latitude)
        && (CO_MIN_LON..=CO_MAX_LON).contains(&longitude)
}

/// Validate that coordinates are plausible and inside Colorado
pub fn validate_colorado_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Latitude {} is outside [-90, 90]",
            latitude
        )));
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Longitude {} is outside [-180, 180]",
            longitude
        )));
    }

    if !is_within_colorado(latitude, longitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Point ({}, {}) is outside the Colorado bounding box",
            latitude, longitude
        )));
    }

    Ok(())
}

/// Calculate the distance between two points using the Haversine formula
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorado_bounds() {
        assert!(is_within_colorado(39.7392, -104.9903)); // Denver
        assert!(is_within_colorado(38.8339, -104.8214)); // Colorado Springs
        assert!(!is_within_colorado(35.0844, -106.6504)); // Albuquerque
        assert!(!is_within_colorado(41.1400, -104.8202)); // Cheyenne, WY
    }

    #[test]
    fn test_validate_colorado_coordinates() {
        assert!(validate_colorado_coordinates(39.7392, -104.9903).is_ok());
        assert!(validate_colorado_coordinates(91.0, -104.9903).is_err());
        assert!(validate_colorado_coordinates(39.7392, -181.0).is_err());
        assert!(validate_colorado_coordinates(35.0844, -106.6504).is_err());
    }

    #[test]
    fn test_haversine_distance() {
        // Denver to Colorado Springs
        let distance = haversine_distance(39.7392, -104.9903, 38.8339, -104.8214);
        assert!((distance - 101.0).abs() < 5.0);

        // Zero distance
        let distance = haversine_distance(39.7392, -104.9903, 39.7392, -104.9903);
        assert!(distance < 0.001);
    }
}
