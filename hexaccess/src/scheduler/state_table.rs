use super::district_stage::{DistrictStage, DistrictState};
use hexaccess_core::model::DistrictId;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard},
};

/// per-district states of a run, shared by every worker.
#[derive(Debug, Default)]
pub struct StateTable {
    states: Mutex<HashMap<DistrictId, DistrictState>>,
}

impl StateTable {
    pub fn new<'a, I>(ids: I) -> StateTable
    where
        I: IntoIterator<Item = &'a DistrictId>,
    {
        let states = ids
            .into_iter()
            .map(|id| (id.clone(), DistrictState::default()))
            .collect();
        StateTable {
            states: Mutex::new(states),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DistrictId, DistrictState>> {
        // a worker that panicked leaves the table itself consistent
        match self.states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn contains(&self, id: &DistrictId) -> bool {
        self.lock().contains_key(id)
    }

    pub fn advance(&self, id: &DistrictId, stage: DistrictStage) {
        if let Some(state) = self.lock().get_mut(id) {
            if state.advance(stage) {
                log::debug!("district {id} is {stage}");
            }
        }
    }

    /// marks the district failed, returning false if it had already failed.
    pub fn fail(&self, id: &DistrictId, reason: String) -> bool {
        match self.lock().get_mut(id) {
            Some(state) => state.fail(reason),
            None => false,
        }
    }

    pub fn get(&self, id: &DistrictId) -> Option<DistrictState> {
        self.lock().get(id).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<DistrictId, DistrictState> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// reports the progress of one district to the state table.
pub struct StageRecorder<'a> {
    table: &'a StateTable,
    district_id: &'a DistrictId,
}

impl<'a> StageRecorder<'a> {
    pub fn new(table: &'a StateTable, district_id: &'a DistrictId) -> StageRecorder<'a> {
        StageRecorder { table, district_id }
    }

    pub fn advance(&self, stage: DistrictStage) {
        self.table.advance(self.district_id, stage)
    }
}
