use super::run_ops;
use crate::{config::AccessConfiguration, model::AccessError};
use clap::{Args, Parser, Subcommand};
use hexaccess_osrm::DetourFactor;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// per-district hexagonal grid accessibility analysis
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct AccessCliArguments {
    /// select the operation to run
    #[command(subcommand)]
    pub op: AccessOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum AccessOperation {
    /// computes grid, facility metrics and summary outputs for every district
    Run {
        #[command(flatten)]
        inputs: InputArguments,
        /// output directory path.
        #[arg(short, long, default_value_t = String::from("."))]
        output_directory: String,
        #[command(flatten)]
        overrides: ConfigurationOverrides,
    },
    /// checks the inputs of a run without computing anything
    Validate {
        #[command(flatten)]
        inputs: InputArguments,
        #[command(flatten)]
        overrides: ConfigurationOverrides,
    },
    /// rebuilds summary.csv from the district metrics of a previous run
    Summarize {
        /// output directory of the previous run.
        #[arg(short, long)]
        output_directory: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct InputArguments {
    #[arg(long, help = "district boundaries, a shapefile (.shp) or GeoJSON file")]
    pub districts: String,
    #[arg(long, help = "facility CSV file with name and coordinate columns")]
    pub facilities: String,
    #[arg(long, help = "population GeoTIFF in WGS84")]
    pub population: String,
    #[arg(long, help = "path to a .toml or .json run configuration")]
    pub config: Option<String>,
}

/// values that replace those of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Args, Default)]
pub struct ConfigurationOverrides {
    /// H3 resolution of the grid, in [1, 15]
    #[arg(long)]
    pub resolution: Option<u8>,
    /// label of the facilities in output tables
    #[arg(long)]
    pub facility_type: Option<String>,
    #[arg(long)]
    pub osrm_host: Option<String>,
    #[arg(long)]
    pub osrm_port: Option<u16>,
    /// multiplier applied to great-circle distances when routing fails
    #[arg(long)]
    pub detour_factor: Option<f64>,
    /// worker threads, 0 for one per core
    #[arg(long)]
    pub parallelism: Option<usize>,
    /// reuse the outputs of districts that completed in a previous run
    #[arg(long)]
    pub resume: bool,
    /// resolve every distance with the great-circle fallback
    #[arg(long)]
    pub no_routing: bool,
}

impl ConfigurationOverrides {
    pub fn apply(&self, config: &mut AccessConfiguration) -> Result<(), AccessError> {
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(facility_type) = &self.facility_type {
            config.facility_type = facility_type.clone();
        }
        if let Some(host) = &self.osrm_host {
            config.routing.host = host.clone();
        }
        if let Some(port) = self.osrm_port {
            config.routing.port = port;
        }
        if let Some(factor) = self.detour_factor {
            config.detour_factor = DetourFactor::new(factor).map_err(AccessError::Configuration)?;
        }
        if let Some(parallelism) = self.parallelism {
            config.parallelism = parallelism;
        }
        if self.resume {
            config.resume = true;
        }
        if self.no_routing {
            config.routing.enabled = false;
        }
        config.validate()
    }
}

impl InputArguments {
    /// the configuration file, or defaults, with `overrides` applied.
    pub fn configuration(
        &self,
        overrides: &ConfigurationOverrides,
    ) -> Result<AccessConfiguration, AccessError> {
        let mut config = match &self.config {
            None => AccessConfiguration::default(),
            Some(f) => {
                log::info!("reading run configuration from {f}");
                AccessConfiguration::try_from(Path::new(f))?
            }
        };
        overrides.apply(&mut config)?;
        Ok(config)
    }

    fn read_sources(
        &self,
        config: &AccessConfiguration,
    ) -> Result<run_ops::AccessSources, AccessError> {
        run_ops::read_sources(
            Path::new(&self.districts),
            Path::new(&self.facilities),
            Path::new(&self.population),
            config,
        )
    }
}

impl AccessOperation {
    pub fn run(&self) -> Result<(), AccessError> {
        match self {
            AccessOperation::Run {
                inputs,
                output_directory,
                overrides,
            } => {
                let config = inputs.configuration(overrides)?;
                let sources = inputs.read_sources(&config)?;
                let service = run_ops::connect_route_service(&config.routing);
                let report =
                    run_ops::run_access(&sources, service, Path::new(output_directory), &config)?;
                for failed in report.failed.iter() {
                    log::warn!(
                        "district {} ({}) failed at {}: {}",
                        failed.district_id,
                        failed.name,
                        failed.stage,
                        failed.reason
                    );
                }
                Ok(())
            }
            AccessOperation::Validate { inputs, overrides } => {
                let config = inputs.configuration(overrides)?;
                let sources = inputs.read_sources(&config)?;
                let summary = run_ops::describe_inputs(&sources);
                let text = serde_json::to_string_pretty(&summary).map_err(|e| {
                    AccessError::Internal(format!("failure encoding input summary: {e}"))
                })?;
                println!("{text}");
                Ok(())
            }
            AccessOperation::Summarize { output_directory } => {
                let rows = run_ops::summarize(Path::new(output_directory))?;
                log::info!("summary written with {rows} rows");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_arguments() {
        let args = AccessCliArguments::try_parse_from([
            "hexaccess",
            "run",
            "--districts",
            "d.geojson",
            "--facilities",
            "f.csv",
            "--population",
            "p.tif",
            "--resolution",
            "7",
            "--no-routing",
            "-o",
            "out",
        ])
        .unwrap();
        match args.op {
            AccessOperation::Run {
                inputs,
                output_directory,
                overrides,
            } => {
                assert_eq!(inputs.districts, "d.geojson");
                assert_eq!(output_directory, "out");
                let config = inputs.configuration(&overrides).unwrap();
                assert_eq!(config.resolution, 7);
                assert!(!config.routing.enabled);
                assert!(!config.resume);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut config = AccessConfiguration::default();
        let overrides = ConfigurationOverrides {
            detour_factor: Some(0.9),
            ..Default::default()
        };
        assert!(matches!(
            overrides.apply(&mut config),
            Err(AccessError::Configuration(_))
        ));
        let overrides = ConfigurationOverrides {
            resolution: Some(16),
            ..Default::default()
        };
        assert!(overrides.apply(&mut AccessConfiguration::default()).is_err());
    }
}
