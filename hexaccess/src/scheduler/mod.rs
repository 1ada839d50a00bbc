//! per-district scheduling of the accessibility pipeline.
mod dag_scheduler;
mod district_pipeline;
mod district_stage;
mod join_barrier;
mod run_report;
mod state_table;

pub use dag_scheduler::{DagScheduler, ScheduleOutcome};
pub use district_pipeline::DistrictPipeline;
pub use district_stage::{DistrictStage, DistrictState};
pub use join_barrier::{DistrictKeyed, JoinBarrier, JoinSide, UnmatchedArtifact};
pub use run_report::{FailedDistrict, RunReport};
pub use state_table::{StageRecorder, StateTable};
