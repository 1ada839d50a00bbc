mod metrics_aggregator;
mod percentile;

pub use metrics_aggregator::{DistrictMetrics, MetricsAggregator, COVERAGE_BANDS_KM};
pub use percentile::percentile;
