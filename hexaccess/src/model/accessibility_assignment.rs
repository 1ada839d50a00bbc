use h3o::CellIndex;
use hexaccess_core::model::{DistanceRecord, FacilityId};

/// nearest-facility result for one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessibilityAssignment {
    pub cell: CellIndex,
    pub facility_id: FacilityId,
    pub facility_name: String,
    /// great-circle distance from the cell centroid to the facility
    pub straight_line_km: f64,
    pub record: DistanceRecord,
}
