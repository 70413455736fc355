mod clip;
mod config;
mod data;
mod errors;
mod etl;
mod output;
mod reconstruct;

use std::env;
use std::io;

use log::{error, info};
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::config::{load_user_config, UserConfig};
use crate::data::bbox::BoundingBox;
use crate::errors::{Error, Result};
use crate::etl::overpass::{http_agent, OverpassEtl};
use crate::etl::overture::OvertureEtl;
use crate::etl::Etl;

const DEFAULT_CONFIG_PATH: &str = "config/region.json";

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

/// 1 for a failed job, 0 otherwise. Empty results do not count as failures.
fn failures(result: Result<()>) -> usize {
    match result {
        Err(err) if !err.is_empty_result() => 1,
        _ => 0,
    }
}

/// Run every configured job in order, returning how many failed.
fn run(config: &UserConfig) -> Result<usize> {
    let bbox = BoundingBox::from_boundary_file(&config.region_path)?.padded(config.pad_degrees);
    info!(bbox = bbox.overture_str().as_str(), pad = config.pad_degrees; "Computed region bounding box");

    let mut failed = 0;
    let agent = http_agent(config.timeout_secs);
    for job in &config.overpass {
        let mut etl = OverpassEtl::new(job, &agent, &config.overpass_url, bbox);
        failed += failures(etl.process(&config.output_dir, config.overwrite));
    }
    for job in &config.overture {
        let mut etl = OvertureEtl::new(job, &config.overture_command, bbox);
        failed += failures(etl.process(&config.output_dir, config.overwrite));
    }
    Ok(failed)
}

fn main() -> Result<()> {
    setup_logging();

    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let user_config = load_user_config(&config_path)?;
    let failed = run(&user_config)?;
    if failed > 0 {
        error!(failed = failed; "Some jobs failed");
        return Err(Error::jobs_failed(failed));
    }
    info!(config = config_path.as_str(); "All jobs finished");
    Ok(())
}
