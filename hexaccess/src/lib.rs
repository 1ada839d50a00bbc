pub mod algorithm;
pub mod app;
pub mod config;
pub mod input;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod scheduler;
