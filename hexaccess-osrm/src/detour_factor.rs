use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// ratio of road distance to straight-line distance applied when the
/// routing service cannot answer. older documentation of the workflow
/// quotes both 1.3 and 1.4; 1.3 is the default and either can be configured.
pub const DEFAULT_DETOUR_FACTOR: f64 = 1.3;

/// multiplier applied to great-circle distance. always strictly greater than 1
/// so that a fallback distance is never shorter than the geodesic distance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(try_from = "f64", into = "f64")]
pub struct DetourFactor(f64);

impl DetourFactor {
    pub fn new(value: f64) -> Result<DetourFactor, String> {
        if !value.is_finite() || value <= 1.0 {
            Err(format!(
                "detour factor must be a finite number greater than 1, found {value}"
            ))
        } else {
            Ok(DetourFactor(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn apply(&self, straight_line_km: f64) -> f64 {
        straight_line_km * self.0
    }
}

impl Default for DetourFactor {
    fn default() -> Self {
        DetourFactor(DEFAULT_DETOUR_FACTOR)
    }
}

impl TryFrom<f64> for DetourFactor {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        DetourFactor::new(value)
    }
}

impl From<DetourFactor> for f64 {
    fn from(value: DetourFactor) -> Self {
        value.0
    }
}

impl Display for DetourFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
