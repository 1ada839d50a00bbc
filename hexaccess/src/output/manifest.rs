use crate::model::AccessError;
use hexaccess_core::model::DistrictId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::BTreeMap, path::Path};

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// record of a completed district, written after every other artifact of
/// the district. it binds the artifacts to the inputs they were computed
/// from, so a later run can reuse them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DistrictManifest {
    pub district_id: DistrictId,
    /// digest of every input that determines the district outputs
    pub fingerprint: String,
    /// artifact file name to sha256 of its contents
    pub artifacts: BTreeMap<String, String>,
}

impl DistrictManifest {
    pub fn new(district_id: DistrictId, fingerprint: String) -> DistrictManifest {
        DistrictManifest {
            district_id,
            fingerprint,
            artifacts: BTreeMap::new(),
        }
    }

    pub fn add_artifact(&mut self, file_name: &str, contents: &[u8]) {
        self.artifacts
            .insert(file_name.to_string(), sha256_hex(contents));
    }

    pub fn encode(&self) -> Result<Vec<u8>, AccessError> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| AccessError::Output(format!("failure encoding manifest: {e}")))
    }

    /// reads the manifest of `dir` if the district there was completed
    /// from inputs with the same `fingerprint` and every artifact is intact.
    pub fn find_complete(dir: &Path, file_name: &str, fingerprint: &str) -> Option<DistrictManifest> {
        let manifest = Self::read(dir, file_name)?;
        if manifest.fingerprint != fingerprint {
            log::debug!("inputs changed since {} was written", dir.join(file_name).display());
            return None;
        }
        manifest.verify(dir, file_name)
    }

    /// reads the manifest of `dir` if every artifact it lists is intact,
    /// whatever inputs it was computed from.
    pub fn find_intact(dir: &Path, file_name: &str) -> Option<DistrictManifest> {
        Self::read(dir, file_name)?.verify(dir, file_name)
    }

    fn read(dir: &Path, file_name: &str) -> Option<DistrictManifest> {
        let path = dir.join(file_name);
        let text = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(m) => Some(m),
            Err(e) => {
                log::warn!("ignoring unreadable manifest {}: {e}", path.display());
                None
            }
        }
    }

    fn verify(self, dir: &Path, file_name: &str) -> Option<DistrictManifest> {
        let intact = self.artifacts.iter().all(|(name, digest)| {
            std::fs::read(dir.join(name))
                .map(|bytes| &sha256_hex(&bytes) == digest)
                .unwrap_or(false)
        });
        if intact {
            Some(self)
        } else {
            log::warn!(
                "artifacts listed in {} are missing or modified",
                dir.join(file_name).display()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(dir: &Path) -> DistrictManifest {
        let mut manifest =
            DistrictManifest::new(DistrictId::new("a").unwrap(), String::from("abc"));
        std::fs::write(dir.join("grid.geojson"), b"{}").unwrap();
        manifest.add_artifact("grid.geojson", b"{}");
        std::fs::write(dir.join("manifest.json"), manifest.encode().unwrap()).unwrap();
        manifest
    }

    #[test]
    fn test_complete_manifest_found() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = written(dir.path());
        let found = DistrictManifest::find_complete(dir.path(), "manifest.json", "abc");
        assert_eq!(found, Some(manifest));
    }

    #[test]
    fn test_fingerprint_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        written(dir.path());
        assert!(DistrictManifest::find_complete(dir.path(), "manifest.json", "xyz").is_none());
    }

    #[test]
    fn test_modified_artifact() {
        let dir = tempfile::tempdir().unwrap();
        written(dir.path());
        std::fs::write(dir.path().join("grid.geojson"), b"{\"x\":1}").unwrap();
        assert!(DistrictManifest::find_complete(dir.path(), "manifest.json", "abc").is_none());
    }

    #[test]
    fn test_intact_ignores_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = written(dir.path());
        assert_eq!(
            DistrictManifest::find_intact(dir.path(), "manifest.json"),
            Some(manifest)
        );
        std::fs::remove_file(dir.path().join("grid.geojson")).unwrap();
        assert!(DistrictManifest::find_intact(dir.path(), "manifest.json").is_none());
        assert!(DistrictManifest::find_intact(dir.path(), "missing.json").is_none());
    }

    #[test]
    fn test_sha256() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
