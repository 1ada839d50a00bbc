use super::population_raster::GridRaster;
use crate::model::AccessError;
use std::{fs::File, io::BufReader, path::Path};
use tiff::{
    decoder::{ifd::Value, Decoder, DecodingResult},
    tags::Tag,
};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GDAL_NODATA: u16 = 42113;

/// reads a single-band, north-up GeoTIFF in WGS84 degrees. the grid is
/// located with the ModelPixelScale and ModelTiepoint tags and the GDAL
/// nodata tag supplies the sentinel unless `nodata` overrides it.
pub fn read_geotiff(path: &Path, nodata: Option<f64>) -> Result<GridRaster, AccessError> {
    if !path.is_file() {
        return Err(AccessError::InputValidation(format!(
            "population raster not found: {}",
            path.display()
        )));
    }
    let invalid =
        |msg: String| AccessError::InputValidation(format!("{}: {msg}", path.display()));
    let file = File::open(path).map_err(|e| AccessError::io(path, e))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| invalid(format!("failed to initialise TIFF decoder: {e}")))?;
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| invalid(format!("cannot read dimensions: {e}")))?;

    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .map_err(|e| invalid(format!("missing ModelPixelScale tag: {e}")))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT))
        .map_err(|e| invalid(format!("missing ModelTiepoint tag: {e}")))?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(invalid(String::from("malformed georeferencing tags")));
    }
    let (pixel_width, pixel_height) = (scale[0], scale[1]);
    let west = tiepoint[3] - tiepoint[0] * pixel_width;
    let north = tiepoint[4] + tiepoint[1] * pixel_height;

    let file_nodata = match decoder.find_tag(Tag::from_u16_exhaustive(GDAL_NODATA)) {
        Ok(Some(Value::Ascii(s))) => s.trim_matches(char::from(0)).trim().parse::<f64>().ok(),
        _ => None,
    };

    let values: Vec<f64> = match decoder
        .read_image()
        .map_err(|e| invalid(format!("failed to decode pixels: {e}")))?
    {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        #[allow(unreachable_patterns)]
        _ => return Err(invalid(String::from("unsupported pixel sample format"))),
    };
    let expected = width as usize * height as usize;
    if values.len() != expected {
        return Err(invalid(format!(
            "expected a single band of {expected} pixels, found {} samples",
            values.len()
        )));
    }
    log::info!(
        "read {width}x{height} population raster from {}",
        path.display()
    );
    GridRaster::new(
        west,
        north,
        pixel_width,
        pixel_height,
        width as usize,
        values,
        nodata.or(file_nodata),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PopulationRaster;
    use tiff::encoder::{colortype, TiffEncoder};

    #[test]
    fn test_read_georeferenced_raster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("population.tif");
        {
            let file = File::create(&path).unwrap();
            let mut encoder = TiffEncoder::new(file).unwrap();
            let mut image = encoder
                .new_image::<colortype::Gray32Float>(3, 2)
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &[0.5f64, 0.5, 0.0][..])
                .unwrap();
            image
                .encoder()
                .write_tag(
                    Tag::Unknown(MODEL_TIEPOINT),
                    &[0.0f64, 0.0, 0.0, 10.0, 20.0, 0.0][..],
                )
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::Unknown(GDAL_NODATA), "-1")
                .unwrap();
            image
                .write_data(&[1.0f32, 2.0, -1.0, 4.0, 5.0, 6.0])
                .unwrap();
        }
        let raster = read_geotiff(&path, None).unwrap();
        assert_eq!(raster.dimensions(), (3, 2));
        assert_eq!(raster.nodata(), Some(-1.0));
        assert_eq!(raster.total(), 18.0);
        let center = raster.pixel_center(0, 0);
        assert_eq!((center.x, center.y), (10.25, 19.75));
    }

    #[test]
    fn test_missing_raster() {
        let result = read_geotiff(Path::new("/nonexistent/pop.tif"), None);
        assert!(matches!(result, Err(AccessError::InputValidation(_))));
    }
}
