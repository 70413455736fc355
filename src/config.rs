use std::{fs::File, io::BufReader, path::PathBuf};

use serde::Deserialize;

use crate::{
    data::{bbox::DEFAULT_PAD_DEG, feature::GeometryKind},
    errors::{Error, Result},
    reconstruct::RingPolicy,
};

pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const OVERTURE_COMMAND: &str = "overturemaps";

fn default_pad() -> f64 {
    DEFAULT_PAD_DEG
}

fn default_overpass_url() -> String {
    OVERPASS_URL.to_string()
}

fn default_overture_command() -> String {
    OVERTURE_COMMAND.to_string()
}

fn default_timeout_secs() -> u64 {
    180
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug)]
pub struct UserConfig {
    /// GeoJSON file outlining the region of interest.
    pub region_path: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default = "default_pad")]
    pub pad_degrees: f64,
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    #[serde(default = "default_overture_command")]
    pub overture_command: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Replace outputs that already exist instead of skipping the job.
    #[serde(default = "default_true")]
    pub overwrite: bool,
    #[serde(default)]
    pub overpass: Vec<OverpassJob>,
    #[serde(default)]
    pub overture: Vec<OvertureJob>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OverpassJob {
    pub name: String,
    pub query: OverpassQuery,
    pub geometry: GeometryKind,
    /// Tags kept as attribute columns.
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub ring_policy: RingPolicy,
    /// Tag keys whose ways stay lines in a polygon job, e.g. `waterway`.
    #[serde(default)]
    pub line_tags: Vec<String>,
    pub output: PathBuf,
    /// Layer name in the output file, the job name when absent.
    pub layer: Option<String>,
    #[serde(default)]
    pub clip: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OverpassQuery {
    Roads,
    Water,
    /// Overpass QL with `{bbox}` standing for `south,west,north,east`.
    Custom(String),
}

#[derive(Deserialize, Debug, Clone)]
pub struct OvertureJob {
    pub dataset: Dataset,
    pub output: PathBuf,
    pub layer: Option<String>,
    #[serde(default)]
    pub clip: bool,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Water,
    Segment,
    Place,
    LandCover,
}

impl Dataset {
    /// Value passed to the downloader's `--type` option.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dataset::Water => "water",
            Dataset::Segment => "segment",
            Dataset::Place => "place",
            Dataset::LandCover => "land_cover",
        }
    }
}

impl UserConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.pad_degrees.is_finite() || self.pad_degrees < 0.0 {
            return Err(Error::config(format!(
                "pad_degrees must be a non-negative number, got {}",
                self.pad_degrees
            )));
        }
        if self.overpass.is_empty() && self.overture.is_empty() {
            return Err("config defines no overpass or overture jobs".into());
        }
        Ok(())
    }
}

pub fn load_user_config(path: &str) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|err| Error::config(format!("could not open config file {}: {}", path, err)))?;
    let config: UserConfig = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| Error::config(format!("could not parse config {}: {}", path, err)))?;
    config.validate()?;
    Ok(config)
}
