use crate::{input::PopulationRaster, model::AccessError};
use hexaccess_core::model::{District, Facility};
use sha2::{Digest, Sha256};
use wkt::ToWkt;

/// digest of the inputs shared by every district of a run: the facility
/// set, the population raster and the parameters that change outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFingerprint {
    base: String,
}

impl RunFingerprint {
    pub fn new(
        facilities: &[Facility],
        raster: &dyn PopulationRaster,
        parameters: &str,
    ) -> Result<RunFingerprint, AccessError> {
        let facility_bytes = serde_json::to_vec(facilities).map_err(|e| {
            AccessError::Internal(format!("failure serializing facilities for fingerprint: {e}"))
        })?;
        let mut hasher = Sha256::new();
        hasher.update(Sha256::digest(&facility_bytes));
        hasher.update(raster.digest().as_bytes());
        hasher.update(parameters.as_bytes());
        Ok(RunFingerprint {
            base: hex::encode(hasher.finalize()),
        })
    }

    /// fingerprint of the outputs of one district.
    pub fn district(&self, district: &District) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.base.as_bytes());
        hasher.update(district.id.as_str().as_bytes());
        hasher.update([0]);
        hasher.update(district.name.as_bytes());
        hasher.update([0]);
        hasher.update(district.crs.to_string().as_bytes());
        hasher.update([0]);
        hasher.update(district.boundary.wkt_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::GridRaster;
    use geo::{polygon, MultiPolygon};
    use hexaccess_core::model::{Crs, DistrictId, FacilityId};

    fn district(name: &str, size: f64) -> District {
        let p = polygon![(x: 0.0, y: 0.0), (x: size, y: 0.0), (x: size, y: size), (x: 0.0, y: 0.0)];
        District::new(
            DistrictId::new("a").unwrap(),
            name.to_string(),
            MultiPolygon::new(vec![p]),
            Crs::Wgs84,
        )
    }

    fn fingerprint(values: Vec<f64>, parameters: &str) -> RunFingerprint {
        let raster = GridRaster::new(0.0, 1.0, 0.5, 0.5, 2, values, None).unwrap();
        let facilities =
            vec![Facility::new(FacilityId(0), String::from("F"), 0.5, 0.5).unwrap()];
        RunFingerprint::new(&facilities, &raster, parameters).unwrap()
    }

    #[test]
    fn test_stable_for_same_inputs() {
        let a = fingerprint(vec![1.0, 2.0, 3.0, 4.0], "resolution=8");
        let b = fingerprint(vec![1.0, 2.0, 3.0, 4.0], "resolution=8");
        assert_eq!(a.district(&district("A", 1.0)), b.district(&district("A", 1.0)));
    }

    #[test]
    fn test_changes_with_any_input() {
        let a = fingerprint(vec![1.0, 2.0, 3.0, 4.0], "resolution=8");
        let d = a.district(&district("A", 1.0));
        assert_ne!(d, a.district(&district("B", 1.0)));
        assert_ne!(d, a.district(&district("A", 2.0)));
        let raster_changed = fingerprint(vec![1.0, 2.0, 3.0, 5.0], "resolution=8");
        assert_ne!(d, raster_changed.district(&district("A", 1.0)));
        let params_changed = fingerprint(vec![1.0, 2.0, 3.0, 4.0], "resolution=9");
        assert_ne!(d, params_changed.district(&district("A", 1.0)));
    }
}
