use crate::model::AccessibilityAssignment;
use hexaccess_core::{
    model::{Facility, GridCell},
    util::geo_utils,
};
use hexaccess_osrm::RouteDistanceResolver;
use itertools::Itertools;
use rayon::prelude::*;
use std::cmp::Ordering;

/// assigns each grid cell to its nearest facility by resolved travel distance.
pub struct AccessibilityAssigner<'a> {
    resolver: &'a RouteDistanceResolver,
    candidate_limit: Option<usize>,
}

impl<'a> AccessibilityAssigner<'a> {
    /// `candidate_limit` bounds how many of the geodesically-closest
    /// facilities are resolved per cell. `None` resolves every facility.
    pub fn new(
        resolver: &'a RouteDistanceResolver,
        candidate_limit: Option<usize>,
    ) -> AccessibilityAssigner<'a> {
        AccessibilityAssigner {
            resolver,
            candidate_limit,
        }
    }

    /// one assignment per cell, in cell order. the smallest resolved
    /// distance wins and equal distances go to the lowest facility id. with
    /// no facilities every cell stays unassigned.
    pub fn assign(&self, cells: &[GridCell], facilities: &[Facility]) -> Vec<AccessibilityAssignment> {
        if facilities.is_empty() {
            return vec![];
        }
        cells
            .par_iter()
            .filter_map(|cell| self.nearest(cell, facilities))
            .collect()
    }

    fn nearest(&self, cell: &GridCell, facilities: &[Facility]) -> Option<AccessibilityAssignment> {
        let origin = cell.centroid();
        let candidates = facilities
            .iter()
            .map(|f| (f, geo_utils::haversine_km(&origin, &f.location)))
            .sorted_by(|(fa, da), (fb, db)| da.total_cmp(db).then(fa.id.cmp(&fb.id)))
            .take(self.candidate_limit.unwrap_or(facilities.len()));
        candidates
            .map(|(facility, straight_line_km)| {
                let record = self.resolver.resolve(&origin, &facility.location);
                AccessibilityAssignment {
                    cell: cell.cell,
                    facility_id: facility.id,
                    facility_name: facility.name.clone(),
                    straight_line_km,
                    record,
                }
            })
            .min_by(|a, b| match a.record.distance_km().total_cmp(&b.record.distance_km()) {
                Ordering::Equal => a.facility_id.cmp(&b.facility_id),
                other => other,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use h3o::{LatLng, Resolution};
    use hexaccess_core::model::{DistanceMethod, DistrictId, FacilityId};
    use hexaccess_osrm::{DetourFactor, RouteLeg, RouteService, RoutingError};
    use std::sync::{
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
        Arc,
    };

    fn cell_at(lat: f64, lon: f64) -> GridCell {
        let cell = LatLng::new(lat, lon).unwrap().to_cell(Resolution::Nine);
        GridCell::new(cell, DistrictId::new("alpha").unwrap())
    }

    fn facility(id: usize, lat: f64, lon: f64) -> Facility {
        Facility::new(FacilityId(id), format!("F{id}"), lat, lon).unwrap()
    }

    /// returns the same distance for every pair.
    struct ConstantService {
        calls: AtomicUsize,
    }

    impl RouteService for ConstantService {
        fn route(&self, _: &Point<f64>, _: &Point<f64>) -> Result<RouteLeg, RoutingError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(RouteLeg {
                distance_km: 3.0,
                duration_min: 4.0,
            })
        }

        fn describe(&self) -> String {
            String::from("constant")
        }
    }

    #[test]
    fn test_nearest_by_fallback_distance() {
        let resolver = RouteDistanceResolver::fallback_only(DetourFactor::default(), 30.0);
        let assigner = AccessibilityAssigner::new(&resolver, None);
        let cells = vec![cell_at(0.01, 0.0), cell_at(0.09, 0.0)];
        let facilities = vec![facility(0, 0.0, 0.0), facility(1, 0.1, 0.0)];
        let result = assigner.assign(&cells, &facilities);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].facility_id, FacilityId(0));
        assert_eq!(result[1].facility_id, FacilityId(1));
        for (a, cell) in result.iter().zip(cells.iter()) {
            assert_eq!(a.cell, cell.cell);
            assert_eq!(a.record.method(), DistanceMethod::Fallback);
            assert!((a.record.distance_km() - a.straight_line_km * 1.3).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ties_go_to_lowest_facility_id() {
        let service = Arc::new(ConstantService {
            calls: AtomicUsize::new(0),
        });
        let resolver = RouteDistanceResolver::new(
            Some(service.clone()),
            DetourFactor::default(),
            30.0,
            0,
            std::time::Duration::ZERO,
        );
        let assigner = AccessibilityAssigner::new(&resolver, None);
        let facilities = vec![facility(7, 0.0, 0.1), facility(3, 0.0, -0.1)];
        let result = assigner.assign(&[cell_at(0.0, 0.0)], &facilities);
        assert_eq!(result[0].facility_id, FacilityId(3));
        assert_eq!(service.calls.load(AtomicOrdering::SeqCst), 2);
    }

    #[test]
    fn test_candidate_limit_bounds_queries() {
        let service = Arc::new(ConstantService {
            calls: AtomicUsize::new(0),
        });
        let resolver = RouteDistanceResolver::new(
            Some(service.clone()),
            DetourFactor::default(),
            30.0,
            0,
            std::time::Duration::ZERO,
        );
        let assigner = AccessibilityAssigner::new(&resolver, Some(1));
        let facilities = vec![facility(0, 0.0, 0.5), facility(1, 0.0, 0.01)];
        let result = assigner.assign(&[cell_at(0.0, 0.0)], &facilities);
        assert_eq!(result[0].facility_id, FacilityId(1));
        assert_eq!(service.calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_no_facilities_leaves_cells_unassigned() {
        let resolver = RouteDistanceResolver::fallback_only(DetourFactor::default(), 30.0);
        let assigner = AccessibilityAssigner::new(&resolver, None);
        assert!(assigner.assign(&[cell_at(0.0, 0.0)], &[]).is_empty());
        assert_eq!(resolver.fallback_count(), 0);
    }
}
