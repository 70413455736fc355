use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use ureq::Agent;

use crate::clip::clip_features;
use crate::config::{OverpassJob, OverpassQuery};
use crate::data::bbox::BoundingBox;
use crate::data::feature::Feature;
use crate::data::osm::OverpassResponse;
use crate::errors::{Error, Result};
use crate::output::{write_layer, Layer};
use crate::reconstruct::Reconstructor;

use super::Etl;

/// Largest response body accepted from the interpreter.
const MAX_BODY_BYTES: u64 = 1 << 30;

pub fn http_agent(timeout_secs: u64) -> Agent {
    let config = Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .http_status_as_error(false)
        .build();
    config.into()
}

/// Overpass QL for a query preset, filtered to `bbox` and recursing down so
/// the referenced nodes come back too.
pub fn build_query(query: &OverpassQuery, bbox: &BoundingBox) -> String {
    let b = bbox.overpass_str();
    match query {
        OverpassQuery::Roads => format!(
            r#"[out:json];
way["highway"]({b});
(._;>;);
out qt;
"#
        ),
        OverpassQuery::Water => format!(
            r#"[out:json];
(
  way["waterway"]({b});
  way["natural"="water"]({b});
  relation["natural"="water"]({b});
);
(._;>;);
out qt;
"#
        ),
        OverpassQuery::Custom(text) => text.replace("{bbox}", &b),
    }
}

pub struct OverpassEtl<'a> {
    job: &'a OverpassJob,
    agent: &'a Agent,
    url: &'a str,
    bbox: BoundingBox,
}

impl<'a> OverpassEtl<'a> {
    pub fn new(job: &'a OverpassJob, agent: &'a Agent, url: &'a str, bbox: BoundingBox) -> OverpassEtl<'a> {
        OverpassEtl {
            job,
            agent,
            url,
            bbox,
        }
    }

    fn layer_name(&self) -> &str {
        self.job.layer.as_deref().unwrap_or(&self.job.name)
    }
}

impl Etl for OverpassEtl<'_> {
    type Input = String;
    type Output = Vec<Feature>;

    fn etl_name(&self) -> &str {
        &self.job.name
    }

    fn output_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.job.output)
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let query = build_query(&self.job.query, &self.bbox);
        info!(etl_name = self.etl_name(), url = self.url; "Sending query");
        let mut response = self.agent.get(self.url).query("data", &query).call()?;
        let status = response.status();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()?;
        if !status.is_success() {
            return Err(Error::network(format!("{}: {}", status, body.trim())));
        }
        Ok(body)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let response: OverpassResponse = serde_json::from_str(&input)?;
        let mut features = Reconstructor::new(
            &response.elements,
            self.job.geometry,
            &self.job.properties,
            self.job.ring_policy,
        )
        .with_line_tags(&self.job.line_tags)
        .features(&response.elements);
        if self.job.clip {
            features = clip_features(features, self.bbox.to_rect());
        }
        if features.is_empty() {
            return Err(Error::empty_result(format!("{}: no valid geometries", self.job.name)));
        }
        info!(etl_name = self.etl_name(), elements = response.elements.len(), features = features.len(); "Built features");
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
