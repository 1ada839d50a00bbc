use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// progress of one district through the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistrictStage {
    Pending,
    Splitting,
    Gridding,
    PopulationJoined,
    FacilitiesFiltered,
    AccessibilityComputed,
    MetricsComputed,
    Done,
}

impl Display for DistrictStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DistrictStage::Pending => "pending",
            DistrictStage::Splitting => "splitting",
            DistrictStage::Gridding => "gridding",
            DistrictStage::PopulationJoined => "population-joined",
            DistrictStage::FacilitiesFiltered => "facilities-filtered",
            DistrictStage::AccessibilityComputed => "accessibility-computed",
            DistrictStage::MetricsComputed => "metrics-computed",
            DistrictStage::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// state of a district. `Failed` is absorbing and remembers the stage
/// the district had reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum DistrictState {
    Active { stage: DistrictStage },
    Failed { stage: DistrictStage, reason: String },
}

impl Default for DistrictState {
    fn default() -> Self {
        DistrictState::Active {
            stage: DistrictStage::Pending,
        }
    }
}

impl DistrictState {
    pub fn stage(&self) -> DistrictStage {
        match self {
            DistrictState::Active { stage } => *stage,
            DistrictState::Failed { stage, .. } => *stage,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DistrictState::Failed { .. })
    }

    pub fn is_done(&self) -> bool {
        matches!(
            self,
            DistrictState::Active {
                stage: DistrictStage::Done
            }
        )
    }

    /// moves forward to `stage`. stages never move backward and a failed
    /// district stays failed, so those requests are ignored.
    pub fn advance(&mut self, next: DistrictStage) -> bool {
        match self {
            DistrictState::Active { stage } if next > *stage => {
                *stage = next;
                true
            }
            _ => false,
        }
    }

    /// fails the district at its current stage. the first failure wins.
    pub fn fail(&mut self, reason: String) -> bool {
        match self {
            DistrictState::Active { stage } => {
                *self = DistrictState::Failed {
                    stage: *stage,
                    reason,
                };
                true
            }
            DistrictState::Failed { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotone_advance() {
        let mut state = DistrictState::default();
        assert!(state.advance(DistrictStage::Gridding));
        assert!(!state.advance(DistrictStage::Splitting));
        assert!(!state.advance(DistrictStage::Gridding));
        assert_eq!(state.stage(), DistrictStage::Gridding);
        assert!(state.advance(DistrictStage::Done));
        assert!(state.is_done());
    }

    #[test]
    fn test_failed_is_absorbing() {
        let mut state = DistrictState::default();
        state.advance(DistrictStage::PopulationJoined);
        assert!(state.fail(String::from("bad geometry")));
        assert!(!state.fail(String::from("later failure")));
        assert!(!state.advance(DistrictStage::Done));
        assert_eq!(
            state,
            DistrictState::Failed {
                stage: DistrictStage::PopulationJoined,
                reason: String::from("bad geometry")
            }
        );
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(
            DistrictStage::AccessibilityComputed.to_string(),
            "accessibility-computed"
        );
        let json = serde_json::to_string(&DistrictStage::PopulationJoined).unwrap();
        assert_eq!(json, "\"population-joined\"");
    }
}
