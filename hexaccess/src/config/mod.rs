mod access_config;

pub use access_config::{AccessConfiguration, DistrictSourceConfig, PopulationConfig};
