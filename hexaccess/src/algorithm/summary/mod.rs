mod summary_reducer;

pub use summary_reducer::reduce;
