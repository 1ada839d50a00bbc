mod population_joiner;

pub use population_joiner::{attach, PopulationJoinStats};
