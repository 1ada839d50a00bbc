mod distance_record;
mod district;
mod facility;
mod grid_cell;

pub use distance_record::{DistanceMethod, DistanceRecord};
pub use district::{Crs, District, DistrictId};
pub use facility::{Facility, FacilityId};
pub use grid_cell::GridCell;
