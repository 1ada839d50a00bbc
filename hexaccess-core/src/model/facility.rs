use crate::util::geo_utils;
use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// stable facility identifier: the zero-based data row of the facility
/// in its source table. orders facilities for tie-breaking.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct FacilityId(pub usize);

impl Display for FacilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// one service point in WGS84.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    /// x=longitude, y=latitude
    pub location: Point<f64>,
}

impl Facility {
    /// creates a facility, failing if the coordinate is outside of the
    /// valid WGS84 decimal degree range.
    pub fn new(id: FacilityId, name: String, lat: f64, lon: f64) -> Result<Facility, String> {
        let lat = geo_utils::validate_latitude(lat)?;
        let lon = geo_utils::validate_longitude(lon)?;
        Ok(Facility {
            id,
            name,
            location: Point::new(lon, lat),
        })
    }

    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    pub fn lon(&self) -> f64 {
        self.location.x()
    }
}
