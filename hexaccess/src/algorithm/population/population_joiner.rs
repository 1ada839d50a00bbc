use crate::{input::PopulationRaster, model::AccessError};
use geo::{BoundingRect, Rect};
use h3o::{CellIndex, LatLng};
use hexaccess_core::model::GridCell;
use std::collections::HashMap;

/// outcome of joining a raster to one district's cells.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PopulationJoinStats {
    /// valid pixels whose center fell inside one of the cells
    pub pixels_joined: usize,
    /// valid pixels read from the cells' bounding box but outside every cell
    pub pixels_outside: usize,
    pub population: f64,
}

/// sets the population of every cell to the zonal sum of the raster pixels
/// whose centers fall inside that cell.
///
/// each pixel center is located in exactly one H3 cell, so no pixel is
/// counted twice. border cells extend past the district boundary, hence the
/// district total is at least the raster total inside the boundary and
/// exceeds it by at most the pixels of border cells lying outside it.
pub fn attach(
    cells: &mut [GridCell],
    raster: &dyn PopulationRaster,
) -> Result<PopulationJoinStats, AccessError> {
    let resolution = match cells.first() {
        Some(c) => c.cell.resolution(),
        None => return Ok(PopulationJoinStats::default()),
    };
    let index: HashMap<CellIndex, usize> = cells
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.cell, idx))
        .collect();
    let bbox = cells_bounding_rect(cells)?;

    let mut sums = vec![0.0; cells.len()];
    let mut stats = PopulationJoinStats::default();
    for pixel in raster.pixels_within(&bbox) {
        let cell = LatLng::new(pixel.center.y, pixel.center.x)
            .map_err(|e| {
                AccessError::Internal(format!(
                    "raster pixel center ({}, {}) is not a valid coordinate: {e}",
                    pixel.center.x, pixel.center.y
                ))
            })?
            .to_cell(resolution);
        match index.get(&cell) {
            Some(idx) => {
                sums[*idx] += pixel.value;
                stats.pixels_joined += 1;
                stats.population += pixel.value;
            }
            None => stats.pixels_outside += 1,
        }
    }
    for (cell, sum) in cells.iter_mut().zip(sums) {
        cell.population = sum;
    }
    Ok(stats)
}

fn cells_bounding_rect(cells: &[GridCell]) -> Result<Rect<f64>, AccessError> {
    let mut rects = cells.iter().filter_map(|c| c.polygon.bounding_rect());
    let first = rects
        .next()
        .ok_or_else(|| AccessError::Internal(String::from("grid cells have no extent")))?;
    Ok(rects.fold(first, |acc, r| {
        Rect::new(
            geo::coord! { x: acc.min().x.min(r.min().x), y: acc.min().y.min(r.min().y) },
            geo::coord! { x: acc.max().x.max(r.max().x), y: acc.max().y.max(r.max().y) },
        )
    }))
}
