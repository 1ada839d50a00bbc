use super::column_alias::{DISTRICT_ID, DISTRICT_NAME};
use super::reprojection::Reprojection;
use crate::{config::DistrictSourceConfig, model::AccessError};
use geo::{Geometry, MultiPolygon};
use geojson::GeoJson;
use hexaccess_core::model::{Crs, District, DistrictId};
use itertools::Itertools;
use std::{collections::HashMap, path::Path};

/// one feature of a district boundary dataset before ids are assigned.
struct SourceFeature {
    /// `None` when the feature geometry is missing or not polygonal
    boundary: Option<MultiPolygon<f64>>,
    attributes: HashMap<String, String>,
}

/// reads district boundaries from an ESRI shapefile or a GeoJSON file and
/// splits them into districts with stable ids, reprojected to WGS84.
///
/// a feature without a usable polygon becomes a district with an empty
/// boundary so that it fails alone when it is gridded. a dataset with no
/// features at all is an error.
pub fn read_districts(
    path: &Path,
    config: &DistrictSourceConfig,
) -> Result<Vec<District>, AccessError> {
    if !path.is_file() {
        return Err(AccessError::InputValidation(format!(
            "district boundary file not found: {}",
            path.display()
        )));
    }
    let fields = DISTRICT_NAME
        .aliases
        .iter()
        .chain(DISTRICT_ID.aliases.iter())
        .map(|s| s.to_string())
        .chain(config.name_field.iter().cloned())
        .chain(config.id_field.iter().cloned())
        .unique()
        .collect_vec();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let features = match extension.as_str() {
        "shp" => read_shapefile_features(path, &fields)?,
        "geojson" | "json" => read_geojson_features(path, &fields)?,
        _ => {
            return Err(AccessError::InputValidation(format!(
                "unsupported district boundary format: {}, expected .shp or .geojson",
                path.display()
            )))
        }
    };
    let districts = split_districts(features, config, &path.display().to_string())?;
    log::info!("read {} districts from {}", districts.len(), path.display());
    Ok(districts)
}

/// assigns ids and names to features and reprojects their boundaries.
fn split_districts(
    features: Vec<SourceFeature>,
    config: &DistrictSourceConfig,
    source: &str,
) -> Result<Vec<District>, AccessError> {
    if features.is_empty() {
        return Err(AccessError::Geometry(format!("no districts found in {source}")));
    }
    let has_field = |f: &str| features.iter().any(|ft| ft.attributes.contains_key(f));
    let name_field = match &config.name_field {
        Some(f) if has_field(f) => f.clone(),
        Some(f) => {
            return Err(AccessError::InputValidation(format!(
                "{source} has no district name field '{f}'"
            )))
        }
        None => DISTRICT_NAME
            .find_by(has_field)
            .map(String::from)
            .ok_or_else(|| {
                AccessError::InputValidation(format!(
                    "{source} has no {} field, expected one of [{}]",
                    DISTRICT_NAME.field,
                    DISTRICT_NAME.aliases.join(", ")
                ))
            })?,
    };
    let id_field = match &config.id_field {
        Some(f) => Some(f.clone()),
        None => DISTRICT_ID.find_by(has_field).map(String::from),
    };
    log::debug!("district name field '{name_field}', id field {id_field:?}");

    let reprojection = match &config.proj4 {
        Some(definition) => Some(Reprojection::to_wgs84(definition)?),
        None => None,
    };

    // sanitized id to the raw attribute it came from
    let mut seen: HashMap<DistrictId, String> = HashMap::new();
    let mut districts = vec![];
    for (index, feature) in features.into_iter().enumerate() {
        let name = feature
            .attributes
            .get(&name_field)
            .cloned()
            .unwrap_or_default();
        let raw = match id_field.as_ref().and_then(|f| feature.attributes.get(f)) {
            Some(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
            _ => String::new(),
        };
        let mut id = if raw.is_empty() {
            DistrictId::from_index(index, &name)
        } else {
            DistrictId::new(&raw).map_err(|e| {
                AccessError::InputValidation(format!("feature {index} of {source}: {e}"))
            })?
        };
        match seen.get(&id) {
            Some(previous) if previous == &raw => {
                return Err(AccessError::InputValidation(format!(
                    "duplicate district id '{id}' in {source}"
                )));
            }
            Some(previous) => {
                // distinct raw ids that sanitize to the same text
                let renamed = DistrictId::new(&format!("{id}-{index:04}")).map_err(|e| {
                    AccessError::InputValidation(format!("feature {index} of {source}: {e}"))
                })?;
                log::warn!(
                    "district id '{raw}' collides with '{previous}' once sanitized, using '{renamed}'"
                );
                if seen.contains_key(&renamed) {
                    return Err(AccessError::InputValidation(format!(
                        "duplicate district id '{renamed}' in {source}"
                    )));
                }
                id = renamed;
            }
            None => {}
        }
        seen.insert(id.clone(), raw);
        let boundary = match (feature.boundary, &reprojection) {
            (None, _) => {
                log::warn!("district '{name}' ({id}) has no polygonal geometry");
                MultiPolygon::new(vec![])
            }
            (Some(b), None) => b,
            (Some(b), Some(r)) => match r.transform_multipolygon(&b) {
                Ok(projected) => projected,
                Err(e) => {
                    log::warn!("district '{name}' ({id}) could not be reprojected: {e}");
                    MultiPolygon::new(vec![])
                }
            },
        };
        districts.push(District::new(id, name, boundary, Crs::Wgs84));
    }
    Ok(districts)
}

/// reads polygon shapes and the requested attribute fields of a shapefile.
fn read_shapefile_features(
    path: &Path,
    fields: &[String],
) -> Result<Vec<SourceFeature>, AccessError> {
    let rows = shapefile::read(path).map_err(|e| {
        AccessError::InputValidation(format!("failed reading '{}': {e}", path.display()))
    })?;
    let mut features = vec![];
    for (idx, (shape, record)) in rows.into_iter().enumerate() {
        let boundary = match shape {
            shapefile::Shape::Polygon(generic_polygon) => {
                let mp: Result<MultiPolygon<f64>, _> = generic_polygon.try_into();
                mp.map_err(|e| log::warn!("failed to convert shapefile polygon at row {idx}: {e}"))
                    .ok()
            }
            shapefile::Shape::PolygonM(generic_polygon) => {
                let mp: Result<MultiPolygon<f64>, _> = generic_polygon.try_into();
                mp.map_err(|e| log::warn!("failed to convert shapefile polygon at row {idx}: {e}"))
                    .ok()
            }
            other => {
                log::warn!(
                    "unexpected shape type {} found at row {idx}, must be polygonal",
                    other.shapetype()
                );
                None
            }
        };
        let attributes = fields
            .iter()
            .filter_map(|f| {
                record
                    .get(f)
                    .and_then(dbase_field_text)
                    .map(|v| (f.clone(), v))
            })
            .collect();
        features.push(SourceFeature {
            boundary,
            attributes,
        });
    }
    Ok(features)
}

fn dbase_field_text(value: &shapefile::dbase::FieldValue) -> Option<String> {
    use shapefile::dbase::FieldValue;
    match value {
        FieldValue::Character(Some(s)) => Some(s.trim().to_string()),
        FieldValue::Memo(s) => Some(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) => Some(n.to_string()),
        FieldValue::Float(Some(n)) => Some(n.to_string()),
        FieldValue::Double(n) => Some(n.to_string()),
        FieldValue::Integer(n) => Some(n.to_string()),
        _ => None,
    }
}

/// reads polygonal features and the requested properties of a GeoJSON file.
fn read_geojson_features(
    path: &Path,
    fields: &[String],
) -> Result<Vec<SourceFeature>, AccessError> {
    let text = std::fs::read_to_string(path).map_err(|e| AccessError::io(path, e))?;
    let geojson = text.parse::<GeoJson>().map_err(|e| {
        AccessError::InputValidation(format!("failed decoding '{}': {e}", path.display()))
    })?;
    let source_features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(AccessError::InputValidation(format!(
                "'{}' holds a bare geometry, expected features with attributes",
                path.display()
            )))
        }
    };
    let features = source_features
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| {
            let boundary = feature.geometry.and_then(|g| {
                Geometry::<f64>::try_from(g)
                    .map_err(|e| log::warn!("failed to convert geometry of feature {idx}: {e}"))
                    .ok()
                    .and_then(polygonal)
            });
            let attributes = match &feature.properties {
                Some(props) => fields
                    .iter()
                    .filter_map(|f| props.get(f).and_then(json_text).map(|v| (f.clone(), v)))
                    .collect(),
                None => HashMap::new(),
            };
            SourceFeature {
                boundary,
                attributes,
            }
        })
        .collect();
    Ok(features)
}

fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// collects the polygons of a geometry, descending into collections.
fn polygonal(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        Geometry::MultiPolygon(mp) => Some(mp),
        Geometry::GeometryCollection(gc) => {
            let polygons = gc
                .into_iter()
                .filter_map(polygonal)
                .flat_map(|mp| mp.0)
                .collect_vec();
            if polygons.is_empty() {
                None
            } else {
                Some(MultiPolygon::new(polygons))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn geojson_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".geojson")
            .tempfile()
            .unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;

    #[test]
    fn test_ids_from_attribute_or_index() {
        let contents = format!(
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","properties":{{"shapeName":"Golfe 1","shapeID":"TGO-1"}},"geometry":{SQUARE}}},
                {{"type":"Feature","properties":{{"shapeName":"Haho"}},"geometry":{SQUARE}}}
            ]}}"#
        );
        let file = geojson_file(&contents);
        let districts = read_districts(file.path(), &DistrictSourceConfig::default()).unwrap();
        assert_eq!(districts.len(), 2);
        assert_eq!(districts[0].id.as_str(), "TGO-1");
        assert_eq!(districts[0].name, "Golfe 1");
        assert_eq!(districts[1].id.as_str(), "d0001-haho");
        assert!(!districts[1].is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let contents = format!(
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","properties":{{"name":"A","id":"x"}},"geometry":{SQUARE}}},
                {{"type":"Feature","properties":{{"name":"B","id":"x"}},"geometry":{SQUARE}}}
            ]}}"#
        );
        let file = geojson_file(&contents);
        let err = read_districts(file.path(), &DistrictSourceConfig::default()).unwrap_err();
        assert!(matches!(err, AccessError::InputValidation(_)));
    }

    #[test]
    fn test_sanitized_id_collision_disambiguated() {
        let contents = format!(
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","properties":{{"name":"A","id":"A B"}},"geometry":{SQUARE}}},
                {{"type":"Feature","properties":{{"name":"B","id":"A_B"}},"geometry":{SQUARE}}}
            ]}}"#
        );
        let file = geojson_file(&contents);
        let districts = read_districts(file.path(), &DistrictSourceConfig::default()).unwrap();
        assert_eq!(districts[0].id.as_str(), "A_B");
        assert_eq!(districts[1].id.as_str(), "A_B-0001");
    }

    #[test]
    fn test_missing_name_field() {
        let contents = format!(
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","properties":{{"label":"A"}},"geometry":{SQUARE}}}
            ]}}"#
        );
        let file = geojson_file(&contents);
        let err = read_districts(file.path(), &DistrictSourceConfig::default()).unwrap_err();
        assert!(err.to_string().contains("shapeName"));
    }

    #[test]
    fn test_non_polygonal_feature_has_empty_boundary() {
        let contents = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"P"},"geometry":{"type":"Point","coordinates":[1,1]}}
        ]}"#;
        let file = geojson_file(contents);
        let districts = read_districts(file.path(), &DistrictSourceConfig::default()).unwrap();
        assert!(districts[0].is_empty());
    }

    #[test]
    fn test_no_features_is_geometry_error() {
        let file = geojson_file(r#"{"type":"FeatureCollection","features":[]}"#);
        let err = read_districts(file.path(), &DistrictSourceConfig::default()).unwrap_err();
        assert!(matches!(err, AccessError::Geometry(_)));
    }

    #[test]
    fn test_projected_boundary_reprojected_to_wgs84() {
        let contents = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"U"},"geometry":{"type":"Polygon",
             "coordinates":[[[490000,-10000],[510000,-10000],[510000,10000],[490000,10000],[490000,-10000]]]}}
        ]}"#;
        let file = geojson_file(contents);
        let config = DistrictSourceConfig {
            proj4: Some(String::from(
                "+proj=utm +zone=31 +datum=WGS84 +units=m +no_defs",
            )),
            ..Default::default()
        };
        let districts = read_districts(file.path(), &config).unwrap();
        let rect = geo::BoundingRect::bounding_rect(&districts[0].boundary).unwrap();
        assert!(rect.min().x > 2.9 && rect.max().x < 3.1);
        assert!(rect.min().y > -0.1 && rect.max().y < 0.1);
        assert_eq!(districts[0].crs, Crs::Wgs84);
    }
}
