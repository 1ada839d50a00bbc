use crate::model::AccessError;
use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};

/// PROJ.4 definition of the working CRS.
pub const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// coordinate transformation between two PROJ.4 definitions. geographic
/// coordinates are read and written in degrees.
pub struct Reprojection {
    from: Proj,
    to: Proj,
    from_geographic: bool,
    to_geographic: bool,
}

impl Reprojection {
    pub fn new(from: &str, to: &str) -> Result<Reprojection, AccessError> {
        let build = |definition: &str| {
            Proj::from_proj_string(definition).map_err(|e| {
                AccessError::Configuration(format!("invalid PROJ.4 definition '{definition}': {e}"))
            })
        };
        Ok(Reprojection {
            from: build(from)?,
            to: build(to)?,
            from_geographic: is_geographic(from),
            to_geographic: is_geographic(to),
        })
    }

    pub fn to_wgs84(from: &str) -> Result<Reprojection, AccessError> {
        Self::new(from, WGS84_PROJ4)
    }

    pub fn from_wgs84(to: &str) -> Result<Reprojection, AccessError> {
        Self::new(WGS84_PROJ4, to)
    }

    pub fn transform_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>, AccessError> {
        let mut point = if self.from_geographic {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&self.from, &self.to, &mut point).map_err(|e| {
            AccessError::Geometry(format!("failed to transform ({}, {}): {e}", coord.x, coord.y))
        })?;
        if self.to_geographic {
            Ok(Coord {
                x: point.0.to_degrees(),
                y: point.1.to_degrees(),
            })
        } else {
            Ok(Coord {
                x: point.0,
                y: point.1,
            })
        }
    }

    pub fn transform_multipolygon(
        &self,
        geometry: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, AccessError> {
        geometry.try_map_coords(|c| self.transform_coord(c))
    }
}

fn is_geographic(definition: &str) -> bool {
    ["longlat", "latlong", "lonlat", "latlon"]
        .iter()
        .any(|p| definition.contains(&format!("+proj={p}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTM_31N: &str = "+proj=utm +zone=31 +datum=WGS84 +units=m +no_defs";

    #[test]
    fn test_utm_roundtrip() {
        let forward = Reprojection::from_wgs84(UTM_31N).unwrap();
        let inverse = Reprojection::to_wgs84(UTM_31N).unwrap();
        let projected = forward.transform_coord(Coord { x: 3.0, y: 0.0 }).unwrap();
        // central meridian of zone 31 on the equator
        assert!((projected.x - 500_000.0).abs() < 1e-3);
        assert!(projected.y.abs() < 1e-3);
        let back = inverse.transform_coord(projected).unwrap();
        assert!((back.x - 3.0).abs() < 1e-9);
        assert!(back.y.abs() < 1e-9);
    }

    #[test]
    fn test_invalid_definition() {
        assert!(Reprojection::to_wgs84("+proj=nonsense").is_err());
    }
}
