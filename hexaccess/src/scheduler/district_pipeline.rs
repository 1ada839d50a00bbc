use super::{join_barrier::DistrictKeyed, state_table::StageRecorder};
use crate::model::AccessError;
use hexaccess_core::model::District;

/// the work done for one district, split into the two independent branches
/// joined by the scheduler and the continuation that runs once both exist.
pub trait DistrictPipeline: Sync {
    /// grid cells of a district with population attached
    type Grid: DistrictKeyed + Send;
    /// facilities that lie within a district
    type Facilities: DistrictKeyed + Send;
    type Output: Send;

    /// returns the outputs of a previous run if they are complete and were
    /// produced from the same inputs.
    fn resume(&self, district: &District) -> Option<Self::Output>;

    fn build_grid(
        &self,
        district: &District,
        stages: &StageRecorder,
    ) -> Result<Self::Grid, AccessError>;

    fn locate_facilities(&self, district: &District) -> Result<Self::Facilities, AccessError>;

    fn complete(
        &self,
        district: &District,
        grid: Self::Grid,
        facilities: Self::Facilities,
        stages: &StageRecorder,
    ) -> Result<Self::Output, AccessError>;
}
