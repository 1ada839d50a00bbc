use crate::model::{AccessError, FacilityMetrics};
use std::path::Path;

/// encodes metrics rows as CSV. the header is written even without rows.
pub fn encode_metrics(rows: &[FacilityMetrics]) -> Result<Vec<u8>, AccessError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    writer
        .write_record(FacilityMetrics::COLUMNS)
        .map_err(|e| AccessError::Output(format!("failure writing metrics header: {e}")))?;
    for row in rows.iter() {
        writer.serialize(row).map_err(|e| {
            AccessError::Output(format!(
                "failure writing metrics row {}:{}: {e}",
                row.district_id, row.facility_id
            ))
        })?;
    }
    writer
        .into_inner()
        .map_err(|e| AccessError::Output(format!("failure flushing metrics table: {e}")))
}

/// reads a metrics table written by [`encode_metrics`].
pub fn read_metrics(path: &Path) -> Result<Vec<FacilityMetrics>, AccessError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AccessError::InputValidation(format!("failed to load {}: {e}", path.display())))?;
    reader
        .deserialize()
        .enumerate()
        .map(|(idx, row)| {
            row.map_err(|e| {
                AccessError::InputValidation(format!(
                    "failed to decode row {idx} of {}: {e}",
                    path.display()
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_has_header() {
        let bytes = encode_metrics(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.trim_end(), FacilityMetrics::COLUMNS.join(","));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, text).unwrap();
        assert!(read_metrics(&path).unwrap().is_empty());
    }
}
