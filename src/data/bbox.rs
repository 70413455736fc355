use std::{fs::File, io::BufReader, path::Path};

use geo::BoundingRect;
use geojson::GeoJson;

use crate::errors::{Error, ErrorKind, Result};

/// Degrees added on every side of the region, for some overflow of data.
pub const DEFAULT_PAD_DEG: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Total bounds of every geometry in a GeoJSON boundary file.
    pub fn from_boundary_file(path: &Path) -> Result<BoundingBox> {
        let file = File::open(path)
            .map_err(|err| Error::new(ErrorKind::Io, format!("{}: {}", path.display(), err)))?;
        let geojson = GeoJson::from_reader(BufReader::new(file))?;
        BoundingBox::from_geojson(&geojson)
    }

    pub fn from_geojson(geojson: &GeoJson) -> Result<BoundingBox> {
        let collection = geo::GeometryCollection::<f64>::try_from(geojson)?;
        let rect = collection
            .bounding_rect()
            .ok_or_else(|| Error::data_format("boundary file contains no geometry"))?;
        Ok(BoundingBox {
            min_lon: rect.min().x,
            min_lat: rect.min().y,
            max_lon: rect.max().x,
            max_lat: rect.max().y,
        })
    }

    pub fn padded(&self, pad: f64) -> BoundingBox {
        BoundingBox {
            min_lon: self.min_lon - pad,
            min_lat: self.min_lat - pad,
            max_lon: self.max_lon + pad,
            max_lat: self.max_lat + pad,
        }
    }

    /// `south,west,north,east`, as Overpass filters expect.
    pub fn overpass_str(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }

    /// `west,south,east,north`, as the Overture downloader expects.
    pub fn overture_str(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }

    pub fn to_rect(&self) -> geo::Rect<f64> {
        geo::Rect::new(
            geo::coord! { x: self.min_lon, y: self.min_lat },
            geo::coord! { x: self.max_lon, y: self.max_lat },
        )
    }
}
