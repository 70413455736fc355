use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
    process::Command,
};

use geojson::{FeatureCollection, GeoJson, JsonObject};
use log::{info, warn};
use serde_json::{Map, Value};

use crate::clip::clip_features;
use crate::config::{Dataset, OvertureJob};
use crate::data::bbox::BoundingBox;
use crate::data::feature::Feature;
use crate::data::parsed::extract;
use crate::errors::{Error, Result};
use crate::output::{write_layer, Layer};

use super::Etl;

pub struct OvertureEtl<'a> {
    job: &'a OvertureJob,
    command: &'a str,
    bbox: BoundingBox,
}

impl<'a> OvertureEtl<'a> {
    pub fn new(job: &'a OvertureJob, command: &'a str, bbox: BoundingBox) -> OvertureEtl<'a> {
        OvertureEtl { job, command, bbox }
    }

    fn download_path(&self, dir: &Path) -> PathBuf {
        self.output_path(dir).with_extension("download.geojson")
    }

    fn layer_name(&self) -> &str {
        self.job
            .layer
            .as_deref()
            .unwrap_or(self.job.dataset.type_name())
    }

    fn download(&self, path: &Path) -> Result<()> {
        let bbox = self.bbox.overture_str();
        info!(etl_name = self.etl_name(), dataset = self.job.dataset.type_name(), bbox = bbox.as_str(); "Running downloader");
        let status = Command::new(self.command)
            .arg("download")
            .args(["--bbox", bbox.as_str()])
            .args(["-f", "geojson"])
            .args(["--type", self.job.dataset.type_name()])
            .arg("-o")
            .arg(path)
            .status()
            .map_err(|err| Error::network(format!("could not run {}: {}", self.command, err)))?;
        if !status.success() {
            return Err(Error::network(format!("{} exited with {}", self.command, status)));
        }
        Ok(())
    }
}

fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let geojson = GeoJson::from_reader(BufReader::new(File::open(path)?))?;
    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(feature) => Ok(FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        }),
        GeoJson::Geometry(_) => Err(Error::data_format(format!(
            "{}: expected a feature collection",
            path.display()
        ))),
    }
}

fn column(properties: &JsonObject, name: &str) -> Value {
    properties.get(name).cloned().unwrap_or(Value::Null)
}

/// The attribute columns kept for one provider row, or `None` when the row
/// is filtered out.
pub fn select_columns(dataset: Dataset, properties: &JsonObject) -> Option<Map<String, Value>> {
    let mut columns = Map::new();
    match dataset {
        Dataset::Water | Dataset::Segment => {
            columns.insert("subtype".to_string(), column(properties, "subtype"));
            columns.insert("class".to_string(), column(properties, "class"));
        }
        Dataset::Place => {
            columns.insert("name".to_string(), extract(properties.get("names"), "primary"));
            columns.insert(
                "category".to_string(),
                extract(properties.get("categories"), "primary"),
            );
            columns.insert("source".to_string(), extract(properties.get("sources"), "dataset"));
        }
        Dataset::LandCover => {
            let cartography = properties.get("cartography");
            let min_zoom = extract(cartography, "min_zoom");
            if !min_zoom.as_f64().is_some_and(|zoom| zoom > 0.0) {
                return None;
            }
            columns.insert("subtype".to_string(), column(properties, "subtype"));
            columns.insert("min_zoom".to_string(), min_zoom);
            columns.insert("max_zoom".to_string(), extract(cartography, "max_zoom"));
            columns.insert("sort_key".to_string(), extract(cartography, "sort_key"));
        }
    }
    Some(columns)
}

impl Etl for OvertureEtl<'_> {
    type Input = FeatureCollection;
    type Output = Vec<Feature>;

    fn etl_name(&self) -> &str {
        self.job.dataset.type_name()
    }

    fn output_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.job.output)
    }

    fn extract(&mut self, dir: &Path) -> Result<Self::Input> {
        fs::create_dir_all(dir)?;
        let path = self.download_path(dir);
        let collection = self.download(&path).and_then(|_| read_collection(&path));
        if let Err(err) = fs::remove_file(&path) {
            if path.exists() {
                warn!(etl_name = self.etl_name(), err = err.to_string(); "Could not remove download");
            }
        }
        collection
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let rows = input.features.len();
        let mut features = vec![];
        for feature in input.features {
            let geometry = match feature.geometry {
                Some(geometry) => geo::Geometry::<f64>::try_from(geometry)?,
                None => continue,
            };
            let properties = feature.properties.unwrap_or_default();
            if let Some(columns) = select_columns(self.job.dataset, &properties) {
                features.push(Feature::new(geometry, columns));
            }
        }
        if self.job.clip {
            features = clip_features(features, self.bbox.to_rect());
        }
        if features.is_empty() {
            return Err(Error::empty_result(format!(
                "{}: no valid geometries",
                self.job.dataset.type_name()
            )));
        }
        info!(etl_name = self.etl_name(), rows = rows, features = features.len(); "Selected columns");
        Ok(features)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let layer = Layer {
            name: self.layer_name(),
            features: &output,
        };
        write_layer(&self.output_path(dir), &layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    fn props(value: Value) -> JsonObject {
        value.as_object().unwrap().clone()
    }

    fn job(dataset: Dataset) -> OvertureJob {
        OvertureJob {
            dataset,
            output: PathBuf::from("overture.geojson"),
            layer: None,
            clip: false,
        }
    }

    fn collection(text: &str) -> FeatureCollection {
        match text.parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(collection) => collection,
            other => panic!("expected collection, got {:?}", other),
        }
    }

    fn bbox() -> BoundingBox {
        BoundingBox {
            min_lon: 77.0,
            min_lat: 12.0,
            max_lon: 78.0,
            max_lat: 13.0,
        }
    }

    #[test]
    fn water_keeps_subtype_and_class() {
        let columns = select_columns(
            Dataset::Water,
            &props(json!({"subtype": "river", "class": "stream", "names": {"primary": "x"}})),
        )
        .unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.get("subtype"), Some(&json!("river")));

        let columns = select_columns(Dataset::Segment, &props(json!({"subtype": "road"}))).unwrap();
        assert_eq!(columns.get("class"), Some(&Value::Null));
    }

    #[test]
    fn place_columns_come_from_nested_fields() {
        let columns = select_columns(
            Dataset::Place,
            &props(json!({
                "names": r#"{"primary": "Lalbagh", "common": null}"#,
                "categories": {"primary": "park", "alternate": ["garden"]},
                "sources": [{"dataset": "meta"}, {"dataset": "msft"}]
            })),
        )
        .unwrap();
        assert_eq!(columns.get("name"), Some(&json!("Lalbagh")));
        assert_eq!(columns.get("category"), Some(&json!("park")));
        assert_eq!(columns.get("source"), Some(&json!("meta")));

        let columns = select_columns(Dataset::Place, &props(json!({"names": 5}))).unwrap();
        assert_eq!(columns.get("name"), Some(&Value::Null));
        assert_eq!(columns.get("source"), Some(&Value::Null));
    }

    #[test]
    fn land_cover_drops_low_zoom_rows() {
        let keep = props(json!({
            "subtype": "forest",
            "cartography": {"min_zoom": 8, "max_zoom": 15, "sort_key": 3}
        }));
        let columns = select_columns(Dataset::LandCover, &keep).unwrap();
        assert_eq!(columns.get("min_zoom"), Some(&json!(8)));
        assert_eq!(columns.get("sort_key"), Some(&json!(3)));

        let zero = props(json!({"subtype": "grass", "cartography": r#"{"min_zoom": 0}"#}));
        assert!(select_columns(Dataset::LandCover, &zero).is_none());

        let missing = props(json!({"subtype": "grass"}));
        assert!(select_columns(Dataset::LandCover, &missing).is_none());
    }

    #[test]
    fn transform_converts_geometry() {
        let collection = collection(r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [77.5, 12.9]},
                 "properties": {"names": {"primary": "Cubbon Park"}, "categories": {"primary": "park"}}},
                {"type": "Feature", "geometry": null, "properties": {}}
            ]
        }"#);
        let job = job(Dataset::Place);
        let mut etl = OvertureEtl::new(&job, "overturemaps", bbox());

        let features = etl.transform(collection).unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].geometry, geo::Geometry::Point(geo::Point::new(77.5, 12.9)));
        assert_eq!(features[0].properties.get("name"), Some(&json!("Cubbon Park")));
    }

    #[test]
    fn all_rows_filtered_is_empty_result() {
        let collection = collection(r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [77.5, 12.9]},
                 "properties": {"cartography": {"min_zoom": 0}}}
            ]
        }"#);
        let job = job(Dataset::LandCover);
        let mut etl = OvertureEtl::new(&job, "overturemaps", bbox());

        let err = etl.transform(collection).unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyResult);
    }

    #[test]
    fn missing_downloader_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(Dataset::Water);
        let mut etl = OvertureEtl::new(&job, "overturemaps-not-installed", bbox());

        let err = etl.process(dir.path(), true).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Network);
        assert!(!dir.path().join("overture.geojson").exists());
        assert!(!dir.path().join("overture.download.geojson").exists());
    }
}
