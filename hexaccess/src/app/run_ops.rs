use crate::{
    algorithm::{facility::FacilityLocator, summary},
    config::AccessConfiguration,
    input::{read_districts, read_facilities, read_geotiff, PopulationRaster},
    model::AccessError,
    output::{
        encode_metrics, read_metrics, write_atomic, DistrictManifest, OutputLayout, MANIFEST_FILE,
        METRICS_FILE,
    },
    pipeline::AccessPipeline,
    scheduler::{DagScheduler, RunReport},
};
use hexaccess_core::model::{District, DistrictId, Facility};
use hexaccess_osrm::{OsrmClient, RouteDistanceResolver, RouteService, RoutingConfig};
use itertools::Itertools;
use serde::Serialize;
use std::{path::Path, sync::Arc};

/// the inputs of a run, read and validated.
pub struct AccessSources {
    pub districts: Vec<District>,
    pub facilities: Vec<Facility>,
    pub raster: Box<dyn PopulationRaster>,
}

/// reads every input of a run, failing on the first invalid one.
pub fn read_sources(
    districts: &Path,
    facilities: &Path,
    population: &Path,
    config: &AccessConfiguration,
) -> Result<AccessSources, AccessError> {
    for path in [districts, facilities, population] {
        if !path.is_file() {
            return Err(AccessError::InputValidation(format!(
                "input file not found: {}",
                path.display()
            )));
        }
    }
    let raster: Box<dyn PopulationRaster> = match population
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("tif") | Some("tiff") => {
            Box::new(read_geotiff(population, config.population.nodata)?)
        }
        _ => {
            return Err(AccessError::InputValidation(format!(
                "population raster must be a GeoTIFF (.tif, .tiff), found {}",
                population.display()
            )))
        }
    };
    let facilities = read_facilities(facilities)?;
    let districts = read_districts(districts, &config.districts)?;
    log::info!(
        "read {} districts, {} facilities and a {}x{} population raster",
        districts.len(),
        facilities.len(),
        raster.dimensions().0,
        raster.dimensions().1
    );
    Ok(AccessSources {
        districts,
        facilities,
        raster,
    })
}

/// the OSRM client described by `config`, or None when routing is
/// disabled or the client cannot be built.
pub fn connect_route_service(config: &RoutingConfig) -> Option<Arc<dyn RouteService>> {
    if !config.enabled {
        log::info!("routing disabled, every distance uses the great-circle fallback");
        return None;
    }
    match OsrmClient::new(config) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            log::warn!("routing unavailable, every distance uses the great-circle fallback: {e}");
            None
        }
    }
}

/// runs the analysis of every district and writes the summary table and
/// run report. failed districts are listed in the report and never make
/// the run fail.
pub fn run_access(
    sources: &AccessSources,
    route_service: Option<Arc<dyn RouteService>>,
    output_directory: &Path,
    config: &AccessConfiguration,
) -> Result<RunReport, AccessError> {
    if sources.districts.is_empty() {
        return Err(AccessError::Geometry(String::from(
            "no districts found in the district boundaries",
        )));
    }
    let resolver = match route_service {
        Some(service) => RouteDistanceResolver::from_config(
            service,
            &config.routing,
            config.detour_factor,
            config.fallback_speed_kmh,
        ),
        None => {
            RouteDistanceResolver::fallback_only(config.detour_factor, config.fallback_speed_kmh)
        }
    };
    let locator = FacilityLocator::new(&sources.facilities, &sources.districts);
    let unlocated = locator.unlocated();
    let layout = OutputLayout::new(output_directory);
    let pipeline = AccessPipeline::new(
        config,
        &sources.facilities,
        sources.raster.as_ref(),
        &locator,
        &resolver,
        layout.clone(),
    )?;

    let outcome = DagScheduler::new(config.parallelism).run(&pipeline, &sources.districts)?;
    let rows = summary::reduce(outcome.outputs.into_values());
    write_atomic(&layout.summary_path(), &encode_metrics(&rows)?)?;

    let mut report = outcome.report;
    report.unlocated_facilities = unlocated;
    report.routed_queries = resolver.routed_count();
    report.fallback_queries = resolver.fallback_count();
    let report_bytes = serde_json::to_vec_pretty(&report)
        .map_err(|e| AccessError::Output(format!("failure encoding run report: {e}")))?;
    write_atomic(&layout.run_report_path(), &report_bytes)?;
    log::info!("{}", report.describe());
    Ok(report)
}

/// overview of the inputs reported by the `validate` operation.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InputSummary {
    pub districts: usize,
    /// districts without a usable polygon, which will fail when gridded
    pub empty_districts: Vec<DistrictId>,
    pub facilities: usize,
    pub latitude_range: Option<(f64, f64)>,
    pub longitude_range: Option<(f64, f64)>,
    pub raster_columns: usize,
    pub raster_rows: usize,
}

pub fn describe_inputs(sources: &AccessSources) -> InputSummary {
    let empty_districts = sources
        .districts
        .iter()
        .filter(|d| d.is_empty())
        .map(|d| d.id.clone())
        .collect_vec();
    for id in empty_districts.iter() {
        log::warn!("district {id} has no usable polygon");
    }
    let range = |values: Vec<f64>| {
        let min = values.iter().copied().reduce(f64::min)?;
        let max = values.iter().copied().reduce(f64::max)?;
        Some((min, max))
    };
    let (columns, rows) = sources.raster.dimensions();
    InputSummary {
        districts: sources.districts.len(),
        empty_districts,
        facilities: sources.facilities.len(),
        latitude_range: range(sources.facilities.iter().map(|f| f.lat()).collect()),
        longitude_range: range(sources.facilities.iter().map(|f| f.lon()).collect()),
        raster_columns: columns,
        raster_rows: rows,
    }
}

/// rebuilds the summary table from the metrics table of every district
/// under `output_directory` whose manifest lists it and whose artifacts are
/// intact. returns the number of summary rows.
pub fn summarize(output_directory: &Path) -> Result<usize, AccessError> {
    let layout = OutputLayout::new(output_directory);
    let districts_dir = layout.districts_dir();
    let entries = std::fs::read_dir(&districts_dir).map_err(|e| AccessError::io(&districts_dir, e))?;
    let mut tables = vec![];
    for entry in entries {
        let entry = entry.map_err(|e| AccessError::io(&districts_dir, e))?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let complete = DistrictManifest::find_intact(&dir, MANIFEST_FILE).filter(|m| {
            m.artifacts.contains_key(METRICS_FILE)
                && entry.file_name().to_str() == Some(m.district_id.as_str())
        });
        match complete {
            Some(manifest) => {
                tables.push(read_metrics(&layout.metrics_path(&manifest.district_id))?)
            }
            None => log::warn!(
                "skipping {}, it holds no complete district outputs",
                dir.display()
            ),
        }
    }
    log::info!("summarizing {} district tables", tables.len());
    let rows = summary::reduce(tables);
    write_atomic(&layout.summary_path(), &encode_metrics(&rows)?)?;
    Ok(rows.len())
}
