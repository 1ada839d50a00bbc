use crate::model::{AccessError, AccessibilityAssignment};
use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, Geometry};
use h3o::CellIndex;
use hexaccess_core::model::GridCell;
use serde_json::json;
use std::collections::HashMap;

/// encodes the cells of a district as a GeoJSON feature collection, one
/// polygon feature per cell with its population and assignment fields.
/// assignment fields are null for unassigned cells.
pub fn encode_grid(
    cells: &[GridCell],
    assignments: &[AccessibilityAssignment],
) -> Result<Vec<u8>, AccessError> {
    let by_cell: HashMap<CellIndex, &AccessibilityAssignment> =
        assignments.iter().map(|a| (a.cell, a)).collect();
    let features = cells
        .iter()
        .map(|cell| {
            let centroid = cell.centroid();
            let assignment = by_cell.get(&cell.cell);
            let properties = json!({
                "cell_id": cell.cell_id(),
                "district_id": cell.district_id.as_str(),
                "population": cell.population,
                "centroid_lat": centroid.y(),
                "centroid_lon": centroid.x(),
                "assigned_facility_id": assignment.map(|a| a.facility_id.0),
                "assigned_facility": assignment.map(|a| a.facility_name.clone()),
                "distance_km": assignment.map(|a| a.record.distance_km()),
                "straight_line_distance_km": assignment.map(|a| a.straight_line_km),
                "travel_time_min": assignment.map(|a| a.record.duration_min()),
                "distance_method": assignment.map(|a| a.record.method().to_string()),
                "fallback_reason": assignment.and_then(|a| a.record.fallback_reason()),
            });
            let properties = match properties {
                serde_json::Value::Object(map) => map,
                other => {
                    return Err(AccessError::Internal(format!(
                        "grid properties must be an object, found {other}"
                    )))
                }
            };
            Ok(Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&cell.polygon))),
                id: Some(Id::String(cell.cell_id())),
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect::<Result<Vec<_>, AccessError>>()?;
    let collection = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });
    Ok(collection.to_string().into_bytes())
}
