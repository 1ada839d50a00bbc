use hexaccess_core::model::{DistrictId, FacilityId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// label of the pseudo-facility row aggregating an entire district.
pub const DISTRICT_TOTAL: &str = "DISTRICT_TOTAL";

/// identifies a metrics row: either one facility or the district total.
/// district totals order after every facility of the same district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MetricsRowId {
    Facility(FacilityId),
    DistrictTotal,
}

impl Display for MetricsRowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsRowId::Facility(id) => write!(f, "{id}"),
            MetricsRowId::DistrictTotal => write!(f, "{DISTRICT_TOTAL}"),
        }
    }
}

impl TryFrom<String> for MetricsRowId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == DISTRICT_TOTAL {
            return Ok(MetricsRowId::DistrictTotal);
        }
        value
            .trim()
            .parse::<usize>()
            .map(|id| MetricsRowId::Facility(FacilityId(id)))
            .map_err(|e| format!("invalid facility id '{value}': {e}"))
    }
}

impl From<MetricsRowId> for String {
    fn from(value: MetricsRowId) -> Self {
        value.to_string()
    }
}

/// one row of a district's facility metrics table.
///
/// distance statistics are `None` when no cell contributes to the row,
/// which is the case for the total row of a district without facilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityMetrics {
    pub district_id: DistrictId,
    pub district: String,
    pub facility_type: String,
    pub facility_id: MetricsRowId,
    pub facility_name: String,
    pub total_grids_served: usize,
    pub population_served: f64,
    pub pop_weighted_distance_km: Option<f64>,
    pub mean_distance_km: Option<f64>,
    pub median_distance_km: Option<f64>,
    pub p75_distance_km: Option<f64>,
    pub p90_distance_km: Option<f64>,
    pub min_distance_km: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub pop_within_5km: f64,
    pub pop_within_10km: f64,
    pub pop_within_20km: f64,
    pub percent_within_5km: f64,
    pub percent_within_10km: f64,
    pub mean_travel_time_min: Option<f64>,
}

impl FacilityMetrics {
    /// column names in serialization order. used to write a header for
    /// tables that have no rows.
    pub const COLUMNS: [&'static str; 20] = [
        "district_id",
        "district",
        "facility_type",
        "facility_id",
        "facility_name",
        "total_grids_served",
        "population_served",
        "pop_weighted_distance_km",
        "mean_distance_km",
        "median_distance_km",
        "p75_distance_km",
        "p90_distance_km",
        "min_distance_km",
        "max_distance_km",
        "pop_within_5km",
        "pop_within_10km",
        "pop_within_20km",
        "percent_within_5km",
        "percent_within_10km",
        "mean_travel_time_min",
    ];

    pub fn is_district_total(&self) -> bool {
        self.facility_id == MetricsRowId::DistrictTotal
    }

    /// ordering key of a row within a combined summary table.
    pub fn sort_key(&self) -> (&DistrictId, MetricsRowId) {
        (&self.district_id, self.facility_id)
    }
}
