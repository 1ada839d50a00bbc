mod atomic_write;
mod grid_geojson;
mod manifest;
mod metrics_table;
mod output_layout;

pub use atomic_write::write_atomic;
pub use grid_geojson::encode_grid;
pub use manifest::{sha256_hex, DistrictManifest};
pub use metrics_table::{encode_metrics, read_metrics};
pub use output_layout::{
    OutputLayout, GRID_FILE, MANIFEST_FILE, METRICS_FILE, RUN_REPORT_FILE, SUMMARY_FILE,
};
