use super::column_alias::{FACILITY_LATITUDE, FACILITY_LONGITUDE, FACILITY_NAME};
use crate::model::AccessError;
use hexaccess_core::model::{Facility, FacilityId};
use std::path::Path;

/// reads the facility table. column aliases are resolved once against
/// the header and every row must carry valid WGS84 coordinates.
/// facility ids are the zero-based data row index.
pub fn read_facilities(path: &Path) -> Result<Vec<Facility>, AccessError> {
    if !path.is_file() {
        return Err(AccessError::InputValidation(format!(
            "facility file not found: {}",
            path.display()
        )));
    }
    let source = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AccessError::InputValidation(format!("failed to load {source}: {e}")))?;
    let headers = reader
        .headers()
        .map_err(|e| AccessError::InputValidation(format!("failed to read header of {source}: {e}")))?
        .clone();
    let name_idx = FACILITY_NAME.resolve(headers.iter(), &source)?;
    let lat_idx = FACILITY_LATITUDE.resolve(headers.iter(), &source)?;
    let lon_idx = FACILITY_LONGITUDE.resolve(headers.iter(), &source)?;

    let mut facilities = vec![];
    for (idx, row) in reader.records().enumerate() {
        let record = row.map_err(|e| {
            AccessError::InputValidation(format!("failed to read row {idx} of {source}: {e}"))
        })?;
        let name = record.get(name_idx).unwrap_or_default().to_string();
        let lat = parse_coordinate(&record, lat_idx, "latitude", idx, &source)?;
        let lon = parse_coordinate(&record, lon_idx, "longitude", idx, &source)?;
        let facility = Facility::new(FacilityId(idx), name, lat, lon)
            .map_err(|e| AccessError::InputValidation(format!("row {idx} of {source}: {e}")))?;
        facilities.push(facility);
    }
    log::info!("read {} facilities from {source}", facilities.len());
    Ok(facilities)
}

fn parse_coordinate(
    record: &csv::StringRecord,
    col: usize,
    field: &str,
    idx: usize,
    source: &str,
) -> Result<f64, AccessError> {
    let text = record.get(col).filter(|s| !s.is_empty()).ok_or_else(|| {
        AccessError::InputValidation(format!("row {idx} of {source} has no {field} value"))
    })?;
    text.parse::<f64>().map_err(|e| {
        AccessError::InputValidation(format!(
            "row {idx} of {source} has non-numeric {field} '{text}': {e}"
        ))
    })
}
