use crate::{RouteLeg, RoutingError};
use serde::{Deserialize, Serialize};

/// body of an OSRM `route` service response. only the fields used to
/// compute travel distance are decoded.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OsrmRouteResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct OsrmRoute {
    /// meters
    pub distance: f64,
    /// seconds
    pub duration: f64,
}

impl OsrmRouteResponse {
    /// takes the first route of an `Ok` response as the travel leg.
    pub fn into_leg(self) -> Result<RouteLeg, RoutingError> {
        if self.code != "Ok" {
            let msg = self.message.unwrap_or_default();
            return Err(RoutingError::NoRoute(format!("{}: {msg}", self.code)));
        }
        let route = self
            .routes
            .first()
            .ok_or_else(|| RoutingError::NoRoute(String::from("response has no routes")))?;
        if !route.distance.is_finite() || route.distance < 0.0 || !route.duration.is_finite() {
            return Err(RoutingError::MalformedResponse(format!(
                "invalid route distance {} or duration {}",
                route.distance, route.duration
            )));
        }
        Ok(RouteLeg {
            distance_km: route.distance / 1000.0,
            duration_min: route.duration / 60.0,
        })
    }
}
