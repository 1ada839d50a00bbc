use super::percentile::percentile;
use crate::model::{AccessibilityAssignment, FacilityMetrics, MetricsRowId, DISTRICT_TOTAL};
use h3o::CellIndex;
use hexaccess_core::model::{District, FacilityId, GridCell};
use std::collections::{BTreeMap, HashMap};

/// distance thresholds of the coverage bands, in kilometers.
pub const COVERAGE_BANDS_KM: [f64; 3] = [5.0, 10.0, 20.0];

/// metrics of one district: a row per facility that serves at least one
/// cell, in facility id order, and the district total row.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictMetrics {
    pub facilities: Vec<FacilityMetrics>,
    pub total: FacilityMetrics,
}

impl DistrictMetrics {
    /// facility rows followed by the district total row.
    pub fn into_rows(self) -> Vec<FacilityMetrics> {
        let mut rows = self.facilities;
        rows.push(self.total);
        rows
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    distance_km: f64,
    duration_min: f64,
    population: f64,
}

/// statistics over a set of assigned cells.
struct SampleStats {
    count: usize,
    population: f64,
    pop_weighted_distance_km: Option<f64>,
    mean_distance_km: Option<f64>,
    median_distance_km: Option<f64>,
    p75_distance_km: Option<f64>,
    p90_distance_km: Option<f64>,
    min_distance_km: Option<f64>,
    max_distance_km: Option<f64>,
    pop_within: [f64; 3],
    mean_travel_time_min: Option<f64>,
}

impl SampleStats {
    fn new(samples: &[Sample]) -> SampleStats {
        let count = samples.len();
        let population: f64 = samples.iter().map(|s| s.population).sum();
        let mut distances = samples.iter().map(|s| s.distance_km).collect::<Vec<_>>();
        distances.sort_by(|a, b| a.total_cmp(b));
        let pop_weighted_distance_km = if count == 0 {
            None
        } else if population > 0.0 {
            let weighted: f64 = samples.iter().map(|s| s.distance_km * s.population).sum();
            Some(weighted / population)
        } else {
            Some(0.0)
        };
        let mut pop_within = [0.0; 3];
        for (band, threshold) in pop_within.iter_mut().zip(COVERAGE_BANDS_KM) {
            *band = samples
                .iter()
                .filter(|s| s.distance_km <= threshold)
                .map(|s| s.population)
                .sum();
        }
        SampleStats {
            count,
            population,
            pop_weighted_distance_km,
            mean_distance_km: mean(samples.iter().map(|s| s.distance_km), count),
            median_distance_km: percentile(&distances, 0.5),
            p75_distance_km: percentile(&distances, 0.75),
            p90_distance_km: percentile(&distances, 0.9),
            min_distance_km: distances.first().copied(),
            max_distance_km: distances.last().copied(),
            pop_within,
            mean_travel_time_min: mean(samples.iter().map(|s| s.duration_min), count),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(values.sum::<f64>() / count as f64)
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// computes population-weighted distance statistics of a district.
pub struct MetricsAggregator {
    facility_type: String,
}

impl MetricsAggregator {
    pub fn new(facility_type: &str) -> MetricsAggregator {
        MetricsAggregator {
            facility_type: facility_type.to_string(),
        }
    }

    /// aggregates the assignments of one district. the total row covers
    /// every assigned cell regardless of facility, and its population is
    /// the population of every cell of the district, assigned or not.
    pub fn aggregate(
        &self,
        district: &District,
        cells: &[GridCell],
        assignments: &[AccessibilityAssignment],
    ) -> DistrictMetrics {
        let population: HashMap<CellIndex, f64> =
            cells.iter().map(|c| (c.cell, c.population)).collect();
        let district_population: f64 = cells.iter().map(|c| c.population).sum();

        let mut by_facility: BTreeMap<FacilityId, (&str, Vec<Sample>)> = BTreeMap::new();
        let mut all = Vec::with_capacity(assignments.len());
        for assignment in assignments.iter() {
            let sample = Sample {
                distance_km: assignment.record.distance_km(),
                duration_min: assignment.record.duration_min(),
                population: population.get(&assignment.cell).copied().unwrap_or_default(),
            };
            by_facility
                .entry(assignment.facility_id)
                .or_insert_with(|| (assignment.facility_name.as_str(), vec![]))
                .1
                .push(sample);
            all.push(sample);
        }

        let facilities = by_facility
            .into_iter()
            .map(|(id, (name, samples))| {
                let stats = SampleStats::new(&samples);
                let served = stats.population;
                self.row(district, MetricsRowId::Facility(id), name, served, stats)
            })
            .collect();
        let total = self.row(
            district,
            MetricsRowId::DistrictTotal,
            DISTRICT_TOTAL,
            district_population,
            SampleStats::new(&all),
        );
        DistrictMetrics { facilities, total }
    }

    fn row(
        &self,
        district: &District,
        facility_id: MetricsRowId,
        facility_name: &str,
        population_served: f64,
        stats: SampleStats,
    ) -> FacilityMetrics {
        FacilityMetrics {
            district_id: district.id.clone(),
            district: district.name.clone(),
            facility_type: self.facility_type.clone(),
            facility_id,
            facility_name: facility_name.to_string(),
            total_grids_served: stats.count,
            population_served,
            pop_weighted_distance_km: stats.pop_weighted_distance_km,
            mean_distance_km: stats.mean_distance_km,
            median_distance_km: stats.median_distance_km,
            p75_distance_km: stats.p75_distance_km,
            p90_distance_km: stats.p90_distance_km,
            min_distance_km: stats.min_distance_km,
            max_distance_km: stats.max_distance_km,
            pop_within_5km: stats.pop_within[0],
            pop_within_10km: stats.pop_within[1],
            pop_within_20km: stats.pop_within[2],
            percent_within_5km: percent(stats.pop_within[0], population_served),
            percent_within_10km: percent(stats.pop_within[1], population_served),
            mean_travel_time_min: stats.mean_travel_time_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;
    use h3o::{LatLng, Resolution};
    use hexaccess_core::model::{Crs, DistanceRecord, DistrictId};

    fn district() -> District {
        District::new(
            DistrictId::new("alpha").unwrap(),
            String::from("Alpha"),
            MultiPolygon::new(vec![]),
            Crs::Wgs84,
        )
    }

    /// cells along the equator with the given populations
    fn cells(populations: &[f64]) -> Vec<GridCell> {
        populations
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let cell = LatLng::new(0.0, i as f64 * 0.01)
                    .unwrap()
                    .to_cell(Resolution::Nine);
                let mut c = GridCell::new(cell, district().id);
                c.population = *p;
                c
            })
            .collect()
    }

    fn assignment(cell: &GridCell, facility: usize, distance_km: f64) -> AccessibilityAssignment {
        AccessibilityAssignment {
            cell: cell.cell,
            facility_id: FacilityId(facility),
            facility_name: format!("F{facility}"),
            straight_line_km: distance_km / 1.3,
            record: DistanceRecord::Fallback {
                distance_km,
                duration_min: distance_km * 2.0,
                reason: String::from("routing disabled"),
            },
        }
    }

    #[test]
    fn test_single_facility_statistics() {
        let cells = cells(&[100.0, 200.0, 50.0, 0.0]);
        let assignments = cells
            .iter()
            .zip([1.0, 2.0, 3.0, 4.0])
            .map(|(c, d)| assignment(c, 0, d))
            .collect::<Vec<_>>();
        let metrics = MetricsAggregator::new("hospital").aggregate(&district(), &cells, &assignments);
        assert_eq!(metrics.facilities.len(), 1);
        let row = &metrics.facilities[0];
        assert_eq!(row.facility_id, MetricsRowId::Facility(FacilityId(0)));
        assert_eq!(row.total_grids_served, 4);
        assert_eq!(row.population_served, 350.0);
        assert!((row.pop_weighted_distance_km.unwrap() - 650.0 / 350.0).abs() < 1e-12);
        assert_eq!(row.mean_distance_km, Some(2.5));
        assert_eq!(row.median_distance_km, Some(2.5));
        assert_eq!(row.p75_distance_km, Some(3.25));
        assert!((row.p90_distance_km.unwrap() - 3.7).abs() < 1e-12);
        assert_eq!(row.min_distance_km, Some(1.0));
        assert_eq!(row.max_distance_km, Some(4.0));
        assert_eq!(row.pop_within_5km, 350.0);
        assert_eq!(row.percent_within_5km, 100.0);
        assert_eq!(row.mean_travel_time_min, Some(5.0));
        assert_eq!(row.facility_type, "hospital");
    }

    #[test]
    fn test_population_served_partitions_district() {
        let cells = cells(&[100.0, 200.0, 50.0, 0.0]);
        let assignments = vec![
            assignment(&cells[0], 1, 1.0),
            assignment(&cells[1], 0, 12.0),
            assignment(&cells[2], 1, 6.0),
            assignment(&cells[3], 0, 25.0),
        ];
        let metrics = MetricsAggregator::new("hospital").aggregate(&district(), &cells, &assignments);
        let served: f64 = metrics.facilities.iter().map(|r| r.population_served).sum();
        assert_eq!(served, 350.0);
        assert_eq!(metrics.total.population_served, 350.0);
        assert_eq!(metrics.total.total_grids_served, 4);
        assert_eq!(metrics.total.pop_within_5km, 100.0);
        assert_eq!(metrics.total.pop_within_10km, 150.0);
        assert_eq!(metrics.total.pop_within_20km, 350.0);
        let f1 = &metrics.facilities[1];
        assert_eq!(f1.population_served, 150.0);
        assert!((f1.percent_within_5km - 100.0 / 150.0 * 100.0).abs() < 1e-9);
        let f0 = &metrics.facilities[0];
        assert_eq!(f0.pop_weighted_distance_km, Some(12.0));
        for row in metrics.facilities.iter().chain([&metrics.total]) {
            assert!(row.median_distance_km <= row.p75_distance_km);
            assert!(row.p75_distance_km <= row.p90_distance_km);
        }
    }

    #[test]
    fn test_zero_population_facility() {
        let cells = cells(&[0.0]);
        let assignments = vec![assignment(&cells[0], 0, 3.0)];
        let metrics = MetricsAggregator::new("school").aggregate(&district(), &cells, &assignments);
        let row = &metrics.facilities[0];
        assert_eq!(row.pop_weighted_distance_km, Some(0.0));
        assert_eq!(row.percent_within_5km, 0.0);
    }

    #[test]
    fn test_district_without_facilities() {
        let cells = cells(&[100.0, 200.0]);
        let metrics = MetricsAggregator::new("hospital").aggregate(&district(), &cells, &[]);
        assert!(metrics.facilities.is_empty());
        let total = &metrics.total;
        assert!(total.is_district_total());
        assert_eq!(total.facility_name, DISTRICT_TOTAL);
        assert_eq!(total.population_served, 300.0);
        assert_eq!(total.total_grids_served, 0);
        assert_eq!(total.pop_weighted_distance_km, None);
        assert_eq!(total.median_distance_km, None);
        assert_eq!(total.pop_within_5km, 0.0);
        assert_eq!(total.percent_within_5km, 0.0);
        assert_eq!(metrics.into_rows().len(), 1);
    }
}
