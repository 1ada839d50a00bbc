use crate::model::FacilityMetrics;

/// combines per-district metrics tables into one table ordered by district
/// id, then facility id, with each district total after its facilities.
/// the result does not depend on the order of the inputs.
pub fn reduce<I>(tables: I) -> Vec<FacilityMetrics>
where
    I: IntoIterator<Item = Vec<FacilityMetrics>>,
{
    let mut rows = tables.into_iter().flatten().collect::<Vec<_>>();
    rows.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    rows
}
