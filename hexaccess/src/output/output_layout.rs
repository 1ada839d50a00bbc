use hexaccess_core::model::DistrictId;
use std::path::{Path, PathBuf};

pub const GRID_FILE: &str = "grid.geojson";
pub const METRICS_FILE: &str = "facility_metrics.csv";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const RUN_REPORT_FILE: &str = "run_report.json";

/// file locations under the output directory of a run.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path) -> OutputLayout {
        OutputLayout {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn districts_dir(&self) -> PathBuf {
        self.root.join("districts")
    }

    pub fn district_dir(&self, id: &DistrictId) -> PathBuf {
        self.districts_dir().join(id.as_str())
    }

    pub fn grid_path(&self, id: &DistrictId) -> PathBuf {
        self.district_dir(id).join(GRID_FILE)
    }

    pub fn metrics_path(&self, id: &DistrictId) -> PathBuf {
        self.district_dir(id).join(METRICS_FILE)
    }

    pub fn manifest_path(&self, id: &DistrictId) -> PathBuf {
        self.district_dir(id).join(MANIFEST_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE)
    }

    pub fn run_report_path(&self) -> PathBuf {
        self.root.join(RUN_REPORT_FILE)
    }
}
