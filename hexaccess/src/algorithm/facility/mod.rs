mod facility_locator;

pub use facility_locator::{filter, FacilityLocator};
