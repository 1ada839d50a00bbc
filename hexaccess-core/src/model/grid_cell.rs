use super::DistrictId;
use geo::{Point, Polygon};
use h3o::{CellIndex, LatLng};

/// one hexagon of a district's tessellation.
///
/// created by the hex grid builder with zero population and updated
/// once when population is attached.
#[derive(Debug, Clone)]
pub struct GridCell {
    pub cell: CellIndex,
    pub district_id: DistrictId,
    pub polygon: Polygon<f64>,
    pub population: f64,
}

impl GridCell {
    pub fn new(cell: CellIndex, district_id: DistrictId) -> GridCell {
        let line: geo::LineString = cell.boundary().into();
        GridCell {
            cell,
            district_id,
            polygon: Polygon::new(line, vec![]),
            population: 0.0,
        }
    }

    /// deterministic id of this cell, the hexadecimal H3 index.
    pub fn cell_id(&self) -> String {
        self.cell.to_string()
    }

    /// center of the hexagon in WGS84, x=longitude, y=latitude.
    pub fn centroid(&self) -> Point<f64> {
        let center = LatLng::from(self.cell);
        Point::new(center.lng(), center.lat())
    }
}
