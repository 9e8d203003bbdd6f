use crate::models::GeoPoint;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Haversine distance between two points
#[inline]
pub fn distance_between(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_distance(a.lat, a.lng, b.lat, b.lng)
}

/// Round a distance to two decimal places for wire output
#[inline]
pub fn round_distance_km(distance_km: f64) -> f64 {
    (distance_km * 100.0).round() / 100.0
}

/// Check that a latitude/longitude pair is numeric and in range
///
/// Latitude must be within [-90, 90], longitude within [-180, 180].
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<GeoPoint, String> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err("coordinates must be numeric".to_string());
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {} out of range [-90, 90]", lat));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(format!("longitude {} out of range [-180, 180]", lng));
    }
    Ok(GeoPoint { lat, lng })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        let d = haversine_distance(28.6139, 77.2090, 28.6139, 77.2090);
        assert!(d < 0.001, "same point should be ~0 km, got {}", d);
    }

    #[test]
    fn test_haversine_symmetry() {
        let ab = haversine_distance(28.6139, 77.2090, 19.0760, 72.8777);
        let ba = haversine_distance(19.0760, 72.8777, 28.6139, 77.2090);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_delhi_to_mumbai() {
        // Delhi to Mumbai is approximately 1150 km
        let d = haversine_distance(28.6139, 77.2090, 19.0760, 72.8777);
        assert!((d - 1150.0).abs() < 50.0, "expected ~1150 km, got {}", d);
    }

    #[test]
    fn test_round_distance() {
        assert_eq!(round_distance_km(3.14159), 3.14);
        assert_eq!(round_distance_km(2.456), 2.46);
        assert_eq!(round_distance_km(12.0), 12.0);
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(28.6139, 77.2090).is_ok());
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
        assert!(validate_coordinates(91.0, 77.0).is_err());
        assert!(validate_coordinates(28.0, 181.0).is_err());
        assert!(validate_coordinates(f64::NAN, 77.0).is_err());
    }
}
