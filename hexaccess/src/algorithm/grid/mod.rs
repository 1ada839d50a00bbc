mod hex_grid_builder;

pub use hex_grid_builder::build;
