use crate::model::AccessError;
use hexaccess_osrm::{DetourFactor, RoutingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// behaviors of an accessibility run. every field has a default so a
/// configuration file only needs to name the values it changes.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct AccessConfiguration {
    /// H3 resolution of the hexagonal grid, in [1, 15]
    pub resolution: u8,
    /// label for the facilities under analysis, copied into output tables
    pub facility_type: String,
    /// multiplier applied to great-circle distances when routing fails
    pub detour_factor: DetourFactor,
    /// speed used to estimate travel time for fallback distances
    pub fallback_speed_kmh: f64,
    /// number of worker threads. 0 uses the rayon default.
    pub parallelism: usize,
    /// skip districts whose outputs already exist and match the current inputs
    pub resume: bool,
    /// when set, only the k geodesically-closest facilities of a district are
    /// routed for each cell.
    pub candidate_limit: Option<usize>,
    pub routing: RoutingConfig,
    pub districts: DistrictSourceConfig,
    pub population: PopulationConfig,
}

/// overrides for reading the district boundary dataset.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct DistrictSourceConfig {
    /// attribute holding the district name, otherwise the first known alias found
    pub name_field: Option<String>,
    /// attribute holding the district id, otherwise the first known alias found
    pub id_field: Option<String>,
    /// PROJ.4 definition of the boundary CRS when it is not WGS84
    pub proj4: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct PopulationConfig {
    /// nodata sentinel, replacing any sentinel stored in the raster file
    pub nodata: Option<f64>,
}

impl Default for AccessConfiguration {
    fn default() -> Self {
        Self {
            resolution: 8,
            facility_type: String::from("facility"),
            detour_factor: DetourFactor::default(),
            fallback_speed_kmh: 30.0,
            parallelism: 0,
            resume: false,
            candidate_limit: None,
            routing: RoutingConfig::default(),
            districts: DistrictSourceConfig::default(),
            population: PopulationConfig::default(),
        }
    }
}

impl AccessConfiguration {
    /// the grid resolution as an H3 resolution.
    pub fn h3_resolution(&self) -> Result<h3o::Resolution, AccessError> {
        if self.resolution < 1 {
            return Err(AccessError::Configuration(format!(
                "resolution must be in [1, 15], found {}",
                self.resolution
            )));
        }
        h3o::Resolution::try_from(self.resolution).map_err(|e| {
            AccessError::Configuration(format!(
                "resolution must be in [1, 15], found {}: {e}",
                self.resolution
            ))
        })
    }

    /// checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), AccessError> {
        let _ = self.h3_resolution()?;
        if !self.fallback_speed_kmh.is_finite() || self.fallback_speed_kmh <= 0.0 {
            return Err(AccessError::Configuration(format!(
                "fallback_speed_kmh must be positive, found {}",
                self.fallback_speed_kmh
            )));
        }
        if self.candidate_limit == Some(0) {
            return Err(AccessError::Configuration(String::from(
                "candidate_limit must be at least 1 when set",
            )));
        }
        if self.routing.timeout_secs == 0 {
            return Err(AccessError::Configuration(String::from(
                "routing.timeout_secs must be at least 1",
            )));
        }
        Ok(())
    }
}

impl TryFrom<&Path> for AccessConfiguration {
    type Error = AccessError;

    fn try_from(f: &Path) -> Result<Self, Self::Error> {
        let extension = f.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let read = || {
            std::fs::read_to_string(f).map_err(|e| {
                AccessError::Configuration(format!("failure reading {}: {e}", f.display()))
            })
        };
        let config: AccessConfiguration = match extension {
            "toml" => toml::from_str(&read()?).map_err(|e| {
                AccessError::Configuration(format!("failure decoding {}: {e}", f.display()))
            })?,
            "json" => serde_json::from_str(&read()?).map_err(|e| {
                AccessError::Configuration(format!("failure decoding {}: {e}", f.display()))
            })?,
            _ => {
                return Err(AccessError::Configuration(format!(
                    "unsupported file type: {}",
                    f.display()
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }
}
