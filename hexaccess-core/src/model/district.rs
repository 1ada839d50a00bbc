use geo::{HasDimensions, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// stable identifier of a district, assigned once when the district
/// dataset is split and threaded through every downstream artifact.
/// restricted to `[A-Za-z0-9_-]` so it can be used as a directory name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct DistrictId(String);

impl DistrictId {
    /// builds an id from raw text, replacing any character outside of
    /// `[A-Za-z0-9_-]` with `_`. fails on empty input.
    pub fn new(raw: &str) -> Result<DistrictId, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(String::from("district id cannot be empty"));
        }
        let sanitized = trimmed
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();
        Ok(DistrictId(sanitized))
    }

    /// id for a district that has no id attribute, derived from its
    /// position in the source dataset and its name.
    pub fn from_index(index: usize, name: &str) -> DistrictId {
        let slug = name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        if slug.is_empty() {
            DistrictId(format!("d{index:04}"))
        } else {
            DistrictId(format!("d{index:04}-{slug}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DistrictId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DistrictId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DistrictId::new(&value)
    }
}

impl From<DistrictId> for String {
    fn from(value: DistrictId) -> Self {
        value.0
    }
}

/// coordinate reference system of a geometry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Crs {
    /// EPSG:4326 decimal degrees, the working CRS of the hex grid
    #[default]
    Wgs84,
    /// any other CRS, described as a PROJ.4 definition string
    Proj4 { definition: String },
}

impl Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Crs::Wgs84 => write!(f, "EPSG:4326"),
            Crs::Proj4 { definition } => write!(f, "{definition}"),
        }
    }
}

/// one administrative unit. read once at the start of a run, immutable afterward.
#[derive(Debug, Clone)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    pub boundary: MultiPolygon<f64>,
    pub crs: Crs,
}

impl District {
    pub fn new(id: DistrictId, name: String, boundary: MultiPolygon<f64>, crs: Crs) -> District {
        District {
            id,
            name,
            boundary,
            crs,
        }
    }

    /// true if the boundary has no polygons or only empty rings.
    pub fn is_empty(&self) -> bool {
        self.boundary.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_sanitized() {
        let id = DistrictId::new(" Lomé 1/Golfe ").unwrap();
        assert_eq!(id.as_str(), "Lom__1_Golfe");
        assert!(DistrictId::new("   ").is_err());
    }

    #[test]
    fn test_id_from_index() {
        assert_eq!(
            DistrictId::from_index(3, "Haho  Plateaux").as_str(),
            "d0003-haho-plateaux"
        );
        assert_eq!(DistrictId::from_index(12, "").as_str(), "d0012");
    }

    #[test]
    fn test_id_serde_roundtrip_sanitizes() {
        let id: DistrictId = serde_json::from_str("\"a b\"").unwrap();
        assert_eq!(id.as_str(), "a_b");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"a_b\"");
    }
}
