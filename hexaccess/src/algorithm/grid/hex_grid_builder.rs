use crate::model::AccessError;
use geo::{HasDimensions, Polygon};
use h3o::{
    geom::{ContainmentMode, TilerBuilder},
    CellIndex, LatLng, Resolution,
};
use hexaccess_core::model::{Crs, District, GridCell};
use std::collections::BTreeSet;
use wkt::ToWkt;

/// tessellates a district into H3 cells at the given resolution.
///
/// a cell is included when any part of it intersects the boundary, so
/// cells whose centroid lies inside are always included and border cells
/// are never dropped. cells are returned in index order, without
/// duplicates across the polygons of a multipolygon.
pub fn build(district: &District, resolution: Resolution) -> Result<Vec<GridCell>, AccessError> {
    if district.is_empty() {
        return Err(AccessError::Geometry(format!(
            "district {} has an empty or non-polygonal boundary",
            district.id
        )));
    }
    if district.crs != Crs::Wgs84 {
        return Err(AccessError::Geometry(format!(
            "district {} must be gridded in EPSG:4326, found {}",
            district.id, district.crs
        )));
    }
    let mut tiler = TilerBuilder::new(resolution)
        .containment_mode(ContainmentMode::IntersectsBoundary)
        .build();
    // cells holding a boundary vertex intersect the district even when the
    // polygon is smaller than a single cell
    let mut cells: BTreeSet<CellIndex> = BTreeSet::new();
    for polygon in district.boundary.iter() {
        validate_polygon(polygon).map_err(|e| {
            AccessError::Geometry(format!("district {}: {e}", district.id))
        })?;
        for coord in polygon.exterior().coords() {
            let vertex = LatLng::new(coord.y, coord.x).map_err(|e| {
                AccessError::Geometry(format!("district {}: {e}", district.id))
            })?;
            cells.insert(vertex.to_cell(resolution));
        }
        tiler.add(polygon.clone()).map_err(|e| {
            AccessError::Geometry(format!(
                "failure adding polygon of district {} to h3 tiler: {e}",
                district.id
            ))
        })?;
    }
    cells.extend(tiler.into_coverage());
    log::debug!(
        "district {} tessellated into {} cells at resolution {resolution}",
        district.id,
        cells.len()
    );
    Ok(cells
        .into_iter()
        .map(|cell| GridCell::new(cell, district.id.clone()))
        .collect())
}

fn validate_polygon(polygon: &Polygon<f64>) -> Result<(), String> {
    if polygon.is_empty() || polygon.exterior().0.len() < 4 {
        return Err(format!("degenerate polygon {}", polygon.to_wkt()));
    }
    let finite = polygon
        .exterior()
        .coords()
        .chain(polygon.interiors().iter().flat_map(|r| r.coords()))
        .all(|c| c.x.is_finite() && c.y.is_finite());
    if !finite {
        return Err(String::from("polygon has non-finite coordinates"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Intersects, MultiPolygon};
    use hexaccess_core::model::DistrictId;

    fn district(boundary: MultiPolygon<f64>) -> District {
        District::new(
            DistrictId::new("alpha").unwrap(),
            String::from("Alpha"),
            boundary,
            Crs::Wgs84,
        )
    }

    fn square(half: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: -half, y: -half),
            (x: half, y: -half),
            (x: half, y: half),
            (x: -half, y: half),
            (x: -half, y: -half),
        ]])
    }

    #[test]
    fn test_grid_covers_polygon_deterministically() {
        let d = district(square(0.05));
        let cells = build(&d, Resolution::Eight).unwrap();
        let again = build(&d, Resolution::Eight).unwrap();
        assert!(!cells.is_empty());
        let ids = cells.iter().map(|c| c.cell_id()).collect::<Vec<_>>();
        let ids_again = again.iter().map(|c| c.cell_id()).collect::<Vec<_>>();
        assert_eq!(ids, ids_again);
        let unique = ids.iter().collect::<BTreeSet<_>>();
        assert_eq!(unique.len(), ids.len());
        for cell in cells.iter() {
            assert!(cell.polygon.intersects(&d.boundary));
            assert_eq!(cell.population, 0.0);
            assert_eq!(cell.district_id, d.id);
        }
        let center = LatLng::new(0.0, 0.0).unwrap().to_cell(Resolution::Eight);
        assert!(cells.iter().any(|c| c.cell == center));
    }

    #[test]
    fn test_tiny_polygon_keeps_border_cell() {
        // far smaller than one resolution 6 cell
        let d = district(square(0.0001));
        let cells = build(&d, Resolution::Six).unwrap();
        assert!(!cells.is_empty());
    }

    #[test]
    fn test_empty_district_is_geometry_error() {
        let d = district(MultiPolygon::new(vec![]));
        let result = build(&d, Resolution::Eight);
        assert!(matches!(result, Err(AccessError::Geometry(_))));
    }
}
