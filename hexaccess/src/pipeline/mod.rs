mod access_pipeline;
mod fingerprint;

pub use access_pipeline::{AccessPipeline, DistrictFacilities, PopulatedGrid};
pub use fingerprint::RunFingerprint;
