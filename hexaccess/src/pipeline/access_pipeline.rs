use super::fingerprint::RunFingerprint;
use crate::{
    algorithm::{
        accessibility::AccessibilityAssigner,
        facility::FacilityLocator,
        grid,
        metrics::MetricsAggregator,
        population,
    },
    config::AccessConfiguration,
    input::PopulationRaster,
    model::{AccessError, AccessibilityAssignment, FacilityMetrics},
    output::{
        encode_grid, encode_metrics, read_metrics, write_atomic, DistrictManifest, OutputLayout,
        GRID_FILE, MANIFEST_FILE, METRICS_FILE,
    },
    scheduler::{DistrictKeyed, DistrictPipeline, DistrictStage, StageRecorder},
};
use h3o::Resolution;
use hexaccess_core::model::{District, DistrictId, Facility, GridCell};
use hexaccess_osrm::RouteDistanceResolver;

/// cells of a district with population attached.
pub struct PopulatedGrid {
    pub district_id: DistrictId,
    pub cells: Vec<GridCell>,
}

impl DistrictKeyed for PopulatedGrid {
    fn district_id(&self) -> &DistrictId {
        &self.district_id
    }
}

/// facilities that belong to a district.
pub struct DistrictFacilities {
    pub district_id: DistrictId,
    pub facilities: Vec<Facility>,
}

impl DistrictKeyed for DistrictFacilities {
    fn district_id(&self) -> &DistrictId {
        &self.district_id
    }
}

/// the accessibility analysis of one district, from gridding to the
/// persisted grid, metrics table and manifest.
pub struct AccessPipeline<'a> {
    resolution: Resolution,
    candidate_limit: Option<usize>,
    resume: bool,
    raster: &'a dyn PopulationRaster,
    locator: &'a FacilityLocator,
    resolver: &'a RouteDistanceResolver,
    aggregator: MetricsAggregator,
    layout: OutputLayout,
    fingerprint: RunFingerprint,
}

impl<'a> AccessPipeline<'a> {
    pub fn new(
        config: &AccessConfiguration,
        facilities: &[Facility],
        raster: &'a dyn PopulationRaster,
        locator: &'a FacilityLocator,
        resolver: &'a RouteDistanceResolver,
        layout: OutputLayout,
    ) -> Result<AccessPipeline<'a>, AccessError> {
        let resolution = config.h3_resolution()?;
        let parameters = format!(
            "resolution={};facility_type={};candidate_limit={:?};{}",
            config.resolution,
            config.facility_type,
            config.candidate_limit,
            resolver.describe()
        );
        let fingerprint = RunFingerprint::new(facilities, raster, &parameters)?;
        Ok(AccessPipeline {
            resolution,
            candidate_limit: config.candidate_limit,
            resume: config.resume,
            raster,
            locator,
            resolver,
            aggregator: MetricsAggregator::new(&config.facility_type),
            layout,
            fingerprint,
        })
    }

    fn persist(
        &self,
        district: &District,
        cells: &[GridCell],
        assignments: &[AccessibilityAssignment],
        rows: &[FacilityMetrics],
    ) -> Result<(), AccessError> {
        let manifest_path = self.layout.manifest_path(&district.id);
        match std::fs::remove_file(&manifest_path) {
            Ok(()) => log::debug!("removed stale manifest {}", manifest_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AccessError::io(&manifest_path, e)),
        }

        let grid_bytes = encode_grid(cells, assignments)?;
        let metrics_bytes = encode_metrics(rows)?;
        write_atomic(&self.layout.grid_path(&district.id), &grid_bytes)?;
        write_atomic(&self.layout.metrics_path(&district.id), &metrics_bytes)?;

        let mut manifest =
            DistrictManifest::new(district.id.clone(), self.fingerprint.district(district));
        manifest.add_artifact(GRID_FILE, &grid_bytes);
        manifest.add_artifact(METRICS_FILE, &metrics_bytes);
        write_atomic(&manifest_path, &manifest.encode()?)
    }
}

impl DistrictPipeline for AccessPipeline<'_> {
    type Grid = PopulatedGrid;
    type Facilities = DistrictFacilities;
    type Output = Vec<FacilityMetrics>;

    fn resume(&self, district: &District) -> Option<Vec<FacilityMetrics>> {
        if !self.resume {
            return None;
        }
        let dir = self.layout.district_dir(&district.id);
        let manifest = DistrictManifest::find_complete(
            &dir,
            MANIFEST_FILE,
            &self.fingerprint.district(district),
        )?;
        if !manifest.artifacts.contains_key(METRICS_FILE) {
            return None;
        }
        match read_metrics(&self.layout.metrics_path(&district.id)) {
            Ok(rows) => Some(rows),
            Err(e) => {
                log::warn!("district {} will be recomputed: {e}", district.id);
                None
            }
        }
    }

    fn build_grid(
        &self,
        district: &District,
        stages: &StageRecorder,
    ) -> Result<PopulatedGrid, AccessError> {
        let mut cells = grid::build(district, self.resolution)?;
        let stats = population::attach(&mut cells, self.raster)?;
        log::debug!(
            "district {}: {} cells, population {:.1} from {} pixels ({} pixels outside every cell)",
            district.id,
            cells.len(),
            stats.population,
            stats.pixels_joined,
            stats.pixels_outside
        );
        stages.advance(DistrictStage::PopulationJoined);
        Ok(PopulatedGrid {
            district_id: district.id.clone(),
            cells,
        })
    }

    fn locate_facilities(&self, district: &District) -> Result<DistrictFacilities, AccessError> {
        let facilities = self.locator.locate(district)?;
        log::debug!(
            "district {}: {} facilities",
            district.id,
            facilities.len()
        );
        Ok(DistrictFacilities {
            district_id: district.id.clone(),
            facilities,
        })
    }

    fn complete(
        &self,
        district: &District,
        grid: PopulatedGrid,
        facilities: DistrictFacilities,
        stages: &StageRecorder,
    ) -> Result<Vec<FacilityMetrics>, AccessError> {
        for key in [&grid.district_id, &facilities.district_id] {
            if key != &district.id {
                return Err(AccessError::JoinMismatch {
                    district_id: district.id.clone(),
                    message: format!("artifact keyed by district {key} was joined here"),
                });
            }
        }
        stages.advance(DistrictStage::FacilitiesFiltered);
        if facilities.facilities.is_empty() {
            log::warn!(
                "district {} ({}) has no facilities, only its total row is reported",
                district.id,
                district.name
            );
        }

        let assigner = AccessibilityAssigner::new(self.resolver, self.candidate_limit);
        let assignments = assigner.assign(&grid.cells, &facilities.facilities);
        stages.advance(DistrictStage::AccessibilityComputed);

        let rows = self
            .aggregator
            .aggregate(district, &grid.cells, &assignments)
            .into_rows();
        stages.advance(DistrictStage::MetricsComputed);

        self.persist(district, &grid.cells, &assignments, &rows)?;
        Ok(rows)
    }
}
