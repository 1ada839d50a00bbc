use hexaccess_core::model::DistrictId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("invalid input: {0}")]
    InputValidation(String),
    #[error("invalid geometry: {0}")]
    Geometry(String),
    #[error("join mismatch for district {district_id}: {message}")]
    JoinMismatch {
        district_id: DistrictId,
        message: String,
    },
    #[error("failure reading run configuration: {0}")]
    Configuration(String),
    #[error("failure accessing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failure writing output: {0}")]
    Output(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AccessError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> AccessError {
        AccessError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
