use crate::model::AccessError;
use geo::{Coord, Rect};
use sha2::{Digest, Sha256};

/// one raster pixel, located by its center in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterPixel {
    pub center: Coord<f64>,
    pub value: f64,
}

/// read-only source of population counts, shared by every district task.
pub trait PopulationRaster: Send + Sync {
    /// every valid pixel whose center lies within `bbox` (boundary inclusive).
    /// nodata, non-finite and non-positive pixels are never returned.
    fn pixels_within(&self, bbox: &Rect<f64>) -> Vec<RasterPixel>;

    /// content digest, part of the fingerprint of every district output.
    fn digest(&self) -> String;

    /// (columns, rows) of the raster grid.
    fn dimensions(&self) -> (usize, usize);
}

/// north-up raster held in memory, row-major from the north-west corner.
#[derive(Debug, Clone)]
pub struct GridRaster {
    west: f64,
    north: f64,
    pixel_width: f64,
    pixel_height: f64,
    columns: usize,
    rows: usize,
    values: Vec<f64>,
    nodata: Option<f64>,
}

impl GridRaster {
    /// creates a raster from the coordinate of its north-west corner and
    /// the (positive) size of a pixel in degrees.
    pub fn new(
        west: f64,
        north: f64,
        pixel_width: f64,
        pixel_height: f64,
        columns: usize,
        values: Vec<f64>,
        nodata: Option<f64>,
    ) -> Result<GridRaster, AccessError> {
        if !(pixel_width > 0.0 && pixel_height > 0.0) {
            return Err(AccessError::InputValidation(format!(
                "raster pixel size must be positive, found {pixel_width} x {pixel_height}"
            )));
        }
        if columns == 0 || values.len() % columns != 0 {
            return Err(AccessError::InputValidation(format!(
                "raster has {} values which is not a multiple of {columns} columns",
                values.len()
            )));
        }
        let rows = values.len() / columns;
        Ok(GridRaster {
            west,
            north,
            pixel_width,
            pixel_height,
            columns,
            rows,
            values,
            nodata,
        })
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// replaces the nodata sentinel.
    pub fn with_nodata(mut self, nodata: Option<f64>) -> GridRaster {
        self.nodata = nodata;
        self
    }

    pub fn pixel_center(&self, column: usize, row: usize) -> Coord<f64> {
        Coord {
            x: self.west + (column as f64 + 0.5) * self.pixel_width,
            y: self.north - (row as f64 + 0.5) * self.pixel_height,
        }
    }

    /// the value counted as population, if the pixel holds one.
    fn population(&self, value: f64) -> Option<f64> {
        let is_nodata = match self.nodata {
            Some(nd) => value == nd || (nd.is_nan() && value.is_nan()),
            None => false,
        };
        if is_nodata || !value.is_finite() || value <= 0.0 {
            None
        } else {
            Some(value)
        }
    }

    /// sum of all valid pixels.
    pub fn total(&self) -> f64 {
        self.values.iter().filter_map(|v| self.population(*v)).sum()
    }

    /// inclusive range of indices whose pixel centers fall in [lo, hi] along
    /// an axis starting at `origin` and growing by `step` per pixel.
    fn index_range(lo: f64, hi: f64, origin: f64, step: f64, len: usize) -> Option<(usize, usize)> {
        let first = ((lo - origin) / step - 0.5).ceil().max(0.0);
        let last = ((hi - origin) / step - 0.5).floor();
        if last < 0.0 || first > last || first >= len as f64 {
            return None;
        }
        let last = last.min((len - 1) as f64);
        Some((first as usize, last as usize))
    }
}

impl PopulationRaster for GridRaster {
    fn pixels_within(&self, bbox: &Rect<f64>) -> Vec<RasterPixel> {
        let cols = Self::index_range(
            bbox.min().x,
            bbox.max().x,
            self.west,
            self.pixel_width,
            self.columns,
        );
        // rows grow southward, so measure from the north edge
        let rows = Self::index_range(
            self.north - bbox.max().y,
            self.north - bbox.min().y,
            0.0,
            self.pixel_height,
            self.rows,
        );
        let ((c0, c1), (r0, r1)) = match (cols, rows) {
            (Some(c), Some(r)) => (c, r),
            _ => return vec![],
        };
        let mut pixels = vec![];
        for row in r0..=r1 {
            for column in c0..=c1 {
                let value = self.values[row * self.columns + column];
                if let Some(value) = self.population(value) {
                    pixels.push(RasterPixel {
                        center: self.pixel_center(column, row),
                        value,
                    });
                }
            }
        }
        pixels
    }

    fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for v in [self.west, self.north, self.pixel_width, self.pixel_height] {
            hasher.update(v.to_le_bytes());
        }
        hasher.update((self.columns as u64).to_le_bytes());
        hasher.update(self.nodata.unwrap_or(f64::NAN).to_le_bytes());
        for v in self.values.iter() {
            hasher.update(v.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }
}
