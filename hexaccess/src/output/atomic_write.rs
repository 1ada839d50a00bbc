use crate::model::AccessError;
use std::{fs::File, io::Write, path::Path};

/// writes `contents` to a temporary sibling of `path` and renames it into
/// place, so `path` either holds the complete contents or does not change.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), AccessError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AccessError::io(parent, e))?;
    }
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AccessError::Output(format!("invalid output path {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    let mut file = File::create(&tmp).map_err(|e| AccessError::io(&tmp, e))?;
    file.write_all(contents)
        .and_then(|_| file.sync_all())
        .map_err(|e| AccessError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| AccessError::io(path, e))
}
