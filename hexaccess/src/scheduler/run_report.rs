use super::district_stage::DistrictStage;
use chrono::{DateTime, Utc};
use hexaccess_core::model::{DistrictId, FacilityId};
use serde::{Deserialize, Serialize};

/// outcome of a run, written next to the summary table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub districts_total: usize,
    /// districts computed during this run
    pub completed: Vec<DistrictId>,
    /// districts whose outputs were reused from a previous run
    pub resumed: Vec<DistrictId>,
    pub failed: Vec<FailedDistrict>,
    /// join keys that matched no district of the run
    pub orphan_artifacts: Vec<String>,
    /// facilities that lie within no district
    pub unlocated_facilities: Vec<FacilityId>,
    pub routed_queries: usize,
    pub fallback_queries: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FailedDistrict {
    pub district_id: DistrictId,
    pub name: String,
    /// last stage the district reached before failing
    pub stage: DistrictStage,
    pub reason: String,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>, districts_total: usize) -> RunReport {
        RunReport {
            started_at,
            finished_at: started_at,
            districts_total,
            completed: vec![],
            resumed: vec![],
            failed: vec![],
            orphan_artifacts: vec![],
            unlocated_facilities: vec![],
            routed_queries: 0,
            fallback_queries: 0,
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// one-line description for the log.
    pub fn describe(&self) -> String {
        format!(
            "{} districts: {} completed, {} resumed, {} failed; {} routed and {} fallback distances",
            self.districts_total,
            self.completed.len(),
            self.resumed.len(),
            self.failed.len(),
            self.routed_queries,
            self.fallback_queries
        )
    }
}
