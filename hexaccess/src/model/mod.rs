mod access_error;
mod accessibility_assignment;
mod facility_metrics;

pub use access_error::AccessError;
pub use accessibility_assignment::AccessibilityAssignment;
pub use facility_metrics::{FacilityMetrics, MetricsRowId, DISTRICT_TOTAL};
