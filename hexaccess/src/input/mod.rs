//! adapters reading the district, facility and population inputs.
pub mod column_alias;
mod district_source;
mod facility_source;
mod geotiff;
mod population_raster;
mod reprojection;

pub use district_source::read_districts;
pub use facility_source::read_facilities;
pub use geotiff::read_geotiff;
pub use population_raster::{GridRaster, PopulationRaster, RasterPixel};
pub use reprojection::{Reprojection, WGS84_PROJ4};
