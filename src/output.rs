use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use geojson::{FeatureCollection, JsonObject};
use log::warn;
use serde_json::Value;

use crate::{data::feature::Feature, errors::Result};

/// Coordinate reference of every layer written.
pub const CRS: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

/// A named set of features bound for one output file.
pub struct Layer<'a> {
    pub name: &'a str,
    pub features: &'a [Feature],
}

impl Layer<'_> {
    pub fn to_collection(&self) -> FeatureCollection {
        let mut foreign_members = JsonObject::new();
        foreign_members.insert("name".to_string(), Value::from(self.name));
        foreign_members.insert(
            "crs".to_string(),
            serde_json::json!({"type": "name", "properties": {"name": CRS}}),
        );
        FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members: Some(foreign_members),
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Write `layer` to `path`. The collection is written next to the target and
/// renamed over it once complete, so a failure never leaves a truncated file.
pub fn write_layer(path: &Path, layer: &Layer) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let partial = partial_path(path);
    let result = (|| -> Result<()> {
        let mut writer = BufWriter::new(File::create(&partial)?);
        serde_json::to_writer(&mut writer, &layer.to_collection())?;
        writer.flush()?;
        drop(writer);
        fs::rename(&partial, path)?;
        Ok(())
    })();
    if result.is_err() {
        if let Err(err) = fs::remove_file(&partial) {
            if partial.exists() {
                warn!(path = partial.display().to_string(), err = err.to_string(); "Could not remove partial output");
            }
        }
    }
    result
}
