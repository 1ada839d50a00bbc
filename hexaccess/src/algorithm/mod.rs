pub mod accessibility;
pub mod facility;
pub mod grid;
pub mod metrics;
pub mod population;
pub mod summary;
