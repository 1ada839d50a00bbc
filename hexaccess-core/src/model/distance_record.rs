use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// resolved travel distance between a grid cell and a facility.
///
/// both variants are consumed the same way by aggregation; the variant
/// retains the provenance of the value for audit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum DistanceRecord {
    /// distance reported by the road network routing service
    Routed { distance_km: f64, duration_min: f64 },
    /// scaled great-circle estimate used when routing was unavailable
    Fallback {
        distance_km: f64,
        duration_min: f64,
        reason: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMethod {
    Routed,
    Fallback,
}

impl Display for DistanceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMethod::Routed => write!(f, "routed"),
            DistanceMethod::Fallback => write!(f, "fallback"),
        }
    }
}

impl DistanceRecord {
    pub fn distance_km(&self) -> f64 {
        match self {
            DistanceRecord::Routed { distance_km, .. } => *distance_km,
            DistanceRecord::Fallback { distance_km, .. } => *distance_km,
        }
    }

    pub fn duration_min(&self) -> f64 {
        match self {
            DistanceRecord::Routed { duration_min, .. } => *duration_min,
            DistanceRecord::Fallback { duration_min, .. } => *duration_min,
        }
    }

    pub fn method(&self) -> DistanceMethod {
        match self {
            DistanceRecord::Routed { .. } => DistanceMethod::Routed,
            DistanceRecord::Fallback { .. } => DistanceMethod::Fallback,
        }
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            DistanceRecord::Routed { .. } => None,
            DistanceRecord::Fallback { reason, .. } => Some(reason.as_str()),
        }
    }
}
