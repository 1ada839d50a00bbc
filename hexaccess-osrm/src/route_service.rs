use crate::RoutingError;
use geo::Point;

/// distance and duration of one routed leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    pub distance_km: f64,
    pub duration_min: f64,
}

/// a road network routing backend. implementations must be safe to call
/// from many district tasks at once.
pub trait RouteService: Send + Sync {
    /// routes from origin to destination (x=longitude, y=latitude).
    fn route(&self, origin: &Point<f64>, destination: &Point<f64>)
        -> Result<RouteLeg, RoutingError>;

    /// human-readable description of the backend, used in logs and run fingerprints.
    fn describe(&self) -> String;
}
