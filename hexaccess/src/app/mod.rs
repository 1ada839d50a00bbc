mod access_cli;
pub mod run_ops;

pub use access_cli::{
    AccessCliArguments, AccessOperation, ConfigurationOverrides, InputArguments,
};
