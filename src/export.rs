use std::path::Path;

use multinet_core::export::{read_network, write_geojson};
use multinet_core::{ConverterConfig, Error};

pub fn to_geojson(input: &Path, output: &Path) -> Result<(), Error> {
    write_geojson(&read_network(input)?, output)
}

pub fn init_config(output: &Path) -> Result<(), Error> {
    ConverterConfig::default().write(output)?;
    tracing::info!("Wrote default configuration to {}", output.display());
    Ok(())
}
