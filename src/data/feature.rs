use serde::Deserialize;
use serde_json::{Map, Value};

/// Which geometry the reconstructor should build from an element graph.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Point,
    Line,
    #[serde(alias = "area")]
    Polygon,
}

/// One output record: a geometry plus the retained attribute columns.
///
/// Every requested column is present in `properties`; a missing source value
/// is stored as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: geo::Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: geo::Geometry<f64>, properties: Map<String, Value>) -> Self {
        Feature {
            geometry,
            properties,
        }
    }

    pub fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry))),
            id: None,
            properties: Some(self.properties.clone()),
            foreign_members: None,
        }
    }
}
