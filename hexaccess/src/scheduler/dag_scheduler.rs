use super::{
    district_pipeline::DistrictPipeline,
    district_stage::{DistrictStage, DistrictState},
    join_barrier::{DistrictKeyed, JoinBarrier, JoinSide},
    run_report::{FailedDistrict, RunReport},
    state_table::{StageRecorder, StateTable},
};
use crate::model::AccessError;
use chrono::{DateTime, Utc};
use hexaccess_core::model::{District, DistrictId};
use kdam::{Bar, BarExt};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{Arc, Mutex},
};

/// outputs of every district that completed, keyed by district id.
pub struct ScheduleOutcome<O> {
    pub outputs: BTreeMap<DistrictId, O>,
    pub report: RunReport,
}

/// runs a [`DistrictPipeline`] over every district on a bounded thread pool.
///
/// each district fans out into a grid branch and a facility branch which
/// are joined by district id. a failure in either branch, or in the work
/// after the join, fails only that district.
pub struct DagScheduler {
    parallelism: usize,
}

impl DagScheduler {
    /// `parallelism` of 0 uses the rayon default thread count.
    pub fn new(parallelism: usize) -> DagScheduler {
        DagScheduler { parallelism }
    }

    pub fn run<P: DistrictPipeline>(
        &self,
        pipeline: &P,
        districts: &[District],
    ) -> Result<ScheduleOutcome<P::Output>, AccessError> {
        let started_at = Utc::now();
        let mut by_id: HashMap<&DistrictId, &District> = HashMap::new();
        for district in districts.iter() {
            if by_id.insert(&district.id, district).is_some() {
                return Err(AccessError::InputValidation(format!(
                    "district id '{}' is used by more than one district",
                    district.id
                )));
            }
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
            .map_err(|e| AccessError::Internal(format!("failure building thread pool: {e}")))?;
        let bar = Bar::builder()
            .desc("districts")
            .total(districts.len())
            .build()
            .map_err(|e| AccessError::Internal(format!("failure building progress bar: {e}")))?;

        let run = RunContext {
            pipeline,
            states: StateTable::new(by_id.keys().copied()),
            by_id,
            barrier: JoinBarrier::new(),
            outputs: Mutex::new(BTreeMap::new()),
            resumed: Mutex::new(BTreeSet::new()),
            orphans: Mutex::new(BTreeSet::new()),
            bar: Arc::new(Mutex::new(bar)),
        };
        pool.scope(|s| {
            for district in districts.iter() {
                let run = &run;
                s.spawn(move |s| run.start(s, district));
            }
        });
        eprintln!();
        Ok(run.finish(started_at))
    }
}

struct RunContext<'a, P: DistrictPipeline> {
    pipeline: &'a P,
    by_id: HashMap<&'a DistrictId, &'a District>,
    states: StateTable,
    barrier: JoinBarrier<P::Grid, P::Facilities>,
    outputs: Mutex<BTreeMap<DistrictId, P::Output>>,
    resumed: Mutex<BTreeSet<DistrictId>>,
    orphans: Mutex<BTreeSet<String>>,
    bar: Arc<Mutex<Bar>>,
}

impl<'a, P: DistrictPipeline> RunContext<'a, P> {
    fn start<'s>(&'s self, scope: &rayon::Scope<'s>, district: &'s District) {
        let id = &district.id;
        self.states.advance(id, DistrictStage::Splitting);
        if let Some(output) = self.pipeline.resume(district) {
            log::info!(
                "district {id} ({}) is complete from a previous run, skipping",
                district.name
            );
            if let Ok(mut resumed) = self.resumed.lock() {
                resumed.insert(id.clone());
            }
            self.finish_district(id, output);
            return;
        }
        scope.spawn(move |_| {
            let stages = StageRecorder::new(&self.states, id);
            stages.advance(DistrictStage::Gridding);
            let offered = self
                .pipeline
                .build_grid(district, &stages)
                .and_then(|grid| self.barrier.offer_grid(grid));
            self.continue_join(district, offered);
        });
        scope.spawn(move |_| {
            let offered = self
                .pipeline
                .locate_facilities(district)
                .and_then(|facilities| self.barrier.offer_facilities(facilities));
            self.continue_join(district, offered);
        });
    }

    /// runs the work after the join if this branch arrived second.
    fn continue_join(
        &self,
        branch_district: &District,
        offered: Result<Option<(P::Grid, P::Facilities)>, AccessError>,
    ) {
        let (grid, facilities) = match offered {
            Ok(Some(pair)) => pair,
            Ok(None) => return,
            Err(e) => {
                self.fail(&branch_district.id, e);
                return;
            }
        };
        let key = grid.district_id().clone();
        let district = match self.by_id.get(&key) {
            Some(d) => *d,
            None => {
                log::warn!("joined artifacts for unknown district '{key}' were discarded");
                if let Ok(mut orphans) = self.orphans.lock() {
                    orphans.insert(key.to_string());
                }
                return;
            }
        };
        let stages = StageRecorder::new(&self.states, &district.id);
        match self.pipeline.complete(district, grid, facilities, &stages) {
            Ok(output) => self.finish_district(&district.id, output),
            Err(e) => self.fail(&district.id, e),
        }
    }

    fn finish_district(&self, id: &DistrictId, output: P::Output) {
        self.states.advance(id, DistrictStage::Done);
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.insert(id.clone(), output);
        }
        log::info!("district {id} done");
        self.tick();
    }

    fn fail(&self, id: &DistrictId, error: AccessError) {
        if self.states.fail(id, error.to_string()) {
            log::error!("district {id} failed: {error}");
            self.tick();
        }
    }

    fn tick(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            let _ = bar.update(1);
        }
    }

    /// settles every district left waiting on the join. only called once
    /// all branch tasks have returned.
    fn finish(self, started_at: DateTime<Utc>) -> ScheduleOutcome<P::Output> {
        for unmatched in self.barrier.drain_unmatched() {
            if !self.states.contains(&unmatched.district_id) {
                log::warn!(
                    "{} artifact keyed by unknown district '{}' was discarded",
                    unmatched.side,
                    unmatched.district_id
                );
                if let Ok(mut orphans) = self.orphans.lock() {
                    orphans.insert(unmatched.district_id.to_string());
                }
                continue;
            }
            let partner = match unmatched.side {
                JoinSide::Grid => JoinSide::Facilities,
                JoinSide::Facilities => JoinSide::Grid,
            };
            let error = AccessError::JoinMismatch {
                district_id: unmatched.district_id.clone(),
                message: format!(
                    "{} artifact waited {:.3}s for a {partner} artifact that never arrived",
                    unmatched.side,
                    unmatched.waited.as_secs_f64()
                ),
            };
            self.fail(&unmatched.district_id, error);
        }

        let states = self.states.snapshot();
        for (id, state) in states.iter() {
            if !state.is_failed() && !state.is_done() {
                let error = AccessError::JoinMismatch {
                    district_id: id.clone(),
                    message: String::from("no artifact keyed by this district reached the join"),
                };
                self.fail(id, error);
            }
        }

        let resumed = self
            .resumed
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut report = RunReport::new(started_at, self.by_id.len());
        for (id, state) in self.states.snapshot() {
            match state {
                DistrictState::Failed { stage, reason } => {
                    let name = self
                        .by_id
                        .get(&id)
                        .map(|d| d.name.clone())
                        .unwrap_or_default();
                    report.failed.push(FailedDistrict {
                        district_id: id,
                        name,
                        stage,
                        reason,
                    });
                }
                _ if resumed.contains(&id) => report.resumed.push(id),
                _ => report.completed.push(id),
            }
        }
        report.orphan_artifacts = self
            .orphans
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .into_iter()
            .collect();
        report.finished_at = Utc::now();
        let outputs = self
            .outputs
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ScheduleOutcome { outputs, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;
    use hexaccess_core::model::Crs;
    use std::collections::HashSet;

    struct Keyed(DistrictId);

    impl DistrictKeyed for Keyed {
        fn district_id(&self) -> &DistrictId {
            &self.0
        }
    }

    #[derive(Default)]
    struct FakePipeline {
        failing_grids: HashSet<&'static str>,
        relabeled_grids: HashSet<&'static str>,
        resumable: HashSet<&'static str>,
    }

    impl DistrictPipeline for FakePipeline {
        type Grid = Keyed;
        type Facilities = Keyed;
        type Output = String;

        fn resume(&self, district: &District) -> Option<String> {
            if self.resumable.contains(district.id.as_str()) {
                Some(format!("resumed {}", district.id))
            } else {
                None
            }
        }

        fn build_grid(&self, district: &District, _: &StageRecorder) -> Result<Keyed, AccessError> {
            let id = district.id.as_str();
            if self.failing_grids.contains(id) {
                Err(AccessError::Geometry(format!("district {id} has an empty boundary")))
            } else if self.relabeled_grids.contains(id) {
                Ok(Keyed(DistrictId::new("ghost").unwrap()))
            } else {
                Ok(Keyed(district.id.clone()))
            }
        }

        fn locate_facilities(&self, district: &District) -> Result<Keyed, AccessError> {
            Ok(Keyed(district.id.clone()))
        }

        fn complete(
            &self,
            district: &District,
            grid: Keyed,
            facilities: Keyed,
            stages: &StageRecorder,
        ) -> Result<String, AccessError> {
            assert_eq!(grid.0, facilities.0);
            stages.advance(DistrictStage::MetricsComputed);
            Ok(format!("computed {}", district.id))
        }
    }

    fn districts(ids: &[&str]) -> Vec<District> {
        ids.iter()
            .map(|id| {
                District::new(
                    DistrictId::new(id).unwrap(),
                    id.to_uppercase(),
                    MultiPolygon::new(vec![]),
                    Crs::Wgs84,
                )
            })
            .collect()
    }

    fn id(s: &str) -> DistrictId {
        DistrictId::new(s).unwrap()
    }

    #[test]
    fn test_every_district_completes() {
        let outcome = DagScheduler::new(2)
            .run(&FakePipeline::default(), &districts(&["c", "a", "b"]))
            .unwrap();
        assert_eq!(outcome.outputs.len(), 3);
        assert_eq!(outcome.outputs[&id("a")], "computed a");
        assert_eq!(outcome.report.completed, vec![id("a"), id("b"), id("c")]);
        assert!(!outcome.report.has_failures());
    }

    #[test]
    fn test_failure_is_isolated() {
        let pipeline = FakePipeline {
            failing_grids: HashSet::from(["b"]),
            ..Default::default()
        };
        let outcome = DagScheduler::new(2)
            .run(&pipeline, &districts(&["a", "b", "c"]))
            .unwrap();
        assert_eq!(outcome.outputs.len(), 2);
        assert_eq!(outcome.report.failed.len(), 1);
        let failed = &outcome.report.failed[0];
        assert_eq!(failed.district_id, id("b"));
        assert_eq!(failed.name, "B");
        assert_eq!(failed.stage, DistrictStage::Gridding);
        assert!(failed.reason.contains("empty boundary"));
        // the facility artifact left behind by the failed district is not a mismatch
        assert!(failed.reason.starts_with("invalid geometry"));
        assert!(outcome.report.orphan_artifacts.is_empty());
    }

    #[test]
    fn test_relabeled_artifact_is_join_mismatch() {
        let pipeline = FakePipeline {
            relabeled_grids: HashSet::from(["b"]),
            ..Default::default()
        };
        let outcome = DagScheduler::new(3)
            .run(&pipeline, &districts(&["a", "b", "c"]))
            .unwrap();
        assert_eq!(outcome.report.completed, vec![id("a"), id("c")]);
        assert_eq!(outcome.report.failed.len(), 1);
        let failed = &outcome.report.failed[0];
        assert_eq!(failed.district_id, id("b"));
        assert!(failed.reason.contains("join mismatch"));
        assert!(failed.reason.contains("never arrived"));
        assert_eq!(outcome.report.orphan_artifacts, vec![String::from("ghost")]);
    }

    #[test]
    fn test_resumed_districts_are_skipped() {
        let pipeline = FakePipeline {
            resumable: HashSet::from(["a"]),
            ..Default::default()
        };
        let outcome = DagScheduler::new(1)
            .run(&pipeline, &districts(&["a", "b"]))
            .unwrap();
        assert_eq!(outcome.outputs[&id("a")], "resumed a");
        assert_eq!(outcome.outputs[&id("b")], "computed b");
        assert_eq!(outcome.report.resumed, vec![id("a")]);
        assert_eq!(outcome.report.completed, vec![id("b")]);
    }

    #[test]
    fn test_duplicate_district_ids_rejected() {
        let result = DagScheduler::new(1).run(&FakePipeline::default(), &districts(&["a", "a"]));
        assert!(matches!(result, Err(AccessError::InputValidation(_))));
    }
}
