use geo::{Distance, Haversine, Point};

/// great-circle distance between two WGS84 points, in kilometers.
///
/// # Arguments
///
/// * `origin` - point with x=longitude, y=latitude
/// * `destination` - point with x=longitude, y=latitude
///
/// # Returns
///
/// * haversine distance in kilometers on the mean earth radius
pub fn haversine_km(origin: &Point<f64>, destination: &Point<f64>) -> f64 {
    Haversine.distance(*origin, *destination) / 1000.0
}

/// confirms a latitude is a finite decimal degree value in [-90, 90].
pub fn validate_latitude(lat: f64) -> Result<f64, String> {
    validate_range(lat, -90.0, 90.0).map_err(|e| format!("invalid latitude: {e}"))
}

/// confirms a longitude is a finite decimal degree value in [-180, 180].
pub fn validate_longitude(lon: f64) -> Result<f64, String> {
    validate_range(lon, -180.0, 180.0).map_err(|e| format!("invalid longitude: {e}"))
}

fn validate_range(v: f64, min: f64, max: f64) -> Result<f64, String> {
    if !v.is_finite() || v < min || max < v {
        Err(format!(
            "number '{v}' is not valid, must be in range [{min},{max}]"
        ))
    } else {
        Ok(v)
    }
}
