use crate::model::AccessError;
use hexaccess_core::model::DistrictId;
use std::{
    collections::HashMap,
    fmt::Display,
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};

/// an artifact that knows which district it was produced for.
pub trait DistrictKeyed {
    fn district_id(&self) -> &DistrictId;
}

/// which branch of the join produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Grid,
    Facilities,
}

impl Display for JoinSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinSide::Grid => write!(f, "grid"),
            JoinSide::Facilities => write!(f, "facilities"),
        }
    }
}

/// an artifact that never met its partner.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedArtifact {
    pub district_id: DistrictId,
    pub side: JoinSide,
    pub waited: Duration,
}

enum Waiting<G, F> {
    Grid(G, Instant),
    Facilities(F, Instant),
}

/// matches the grid artifact and the facility artifact of each district by
/// the district id the artifacts carry, whatever order they arrive in.
/// the branch that arrives second receives both artifacts.
pub struct JoinBarrier<G, F> {
    waiting: Mutex<HashMap<DistrictId, Waiting<G, F>>>,
}

impl<G, F> Default for JoinBarrier<G, F> {
    fn default() -> Self {
        JoinBarrier {
            waiting: Mutex::new(HashMap::new()),
        }
    }
}

impl<G: DistrictKeyed, F: DistrictKeyed> JoinBarrier<G, F> {
    pub fn new() -> JoinBarrier<G, F> {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DistrictId, Waiting<G, F>>> {
        match self.waiting.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn offer_grid(&self, grid: G) -> Result<Option<(G, F)>, AccessError> {
        let key = grid.district_id().clone();
        let mut waiting = self.lock();
        match waiting.remove(&key) {
            None => {
                waiting.insert(key, Waiting::Grid(grid, Instant::now()));
                Ok(None)
            }
            Some(Waiting::Facilities(facilities, _)) => Ok(Some((grid, facilities))),
            Some(previous @ Waiting::Grid(..)) => {
                waiting.insert(key.clone(), previous);
                Err(duplicate(key, JoinSide::Grid))
            }
        }
    }

    pub fn offer_facilities(&self, facilities: F) -> Result<Option<(G, F)>, AccessError> {
        let key = facilities.district_id().clone();
        let mut waiting = self.lock();
        match waiting.remove(&key) {
            None => {
                waiting.insert(key, Waiting::Facilities(facilities, Instant::now()));
                Ok(None)
            }
            Some(Waiting::Grid(grid, _)) => Ok(Some((grid, facilities))),
            Some(previous @ Waiting::Facilities(..)) => {
                waiting.insert(key.clone(), previous);
                Err(duplicate(key, JoinSide::Facilities))
            }
        }
    }

    /// removes every artifact still waiting for its partner, ordered by id.
    /// only meaningful once no producer can offer anymore.
    pub fn drain_unmatched(&self) -> Vec<UnmatchedArtifact> {
        let mut unmatched = self
            .lock()
            .drain()
            .map(|(district_id, w)| {
                let (side, since) = match w {
                    Waiting::Grid(_, t) => (JoinSide::Grid, t),
                    Waiting::Facilities(_, t) => (JoinSide::Facilities, t),
                };
                UnmatchedArtifact {
                    district_id,
                    side,
                    waited: since.elapsed(),
                }
            })
            .collect::<Vec<_>>();
        unmatched.sort_by(|a, b| a.district_id.cmp(&b.district_id));
        unmatched
    }
}

fn duplicate(district_id: DistrictId, side: JoinSide) -> AccessError {
    AccessError::JoinMismatch {
        district_id,
        message: format!("a second {side} artifact was produced"),
    }
}
