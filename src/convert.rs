use std::path::Path;

use multinet_core::export::{write_geojson, write_network};
use multinet_core::loading::OptimizerConfig;
use multinet_core::{ConverterConfig, Error, NetworkOptimizer, convert_network};

/// Converts, optionally optimizes, and writes the requested outputs.
/// Bounds given on the command line take precedence over the config file.
pub fn run(config_path: &Path, bounds: Option<(f64, f64)>) -> Result<(), Error> {
    let mut config = ConverterConfig::load(config_path)?;
    if let Some((min_length, max_length)) = bounds {
        config.optimizer = Some(OptimizerConfig {
            min_length,
            max_length,
        });
        config.validate()?;
    }

    let mut network = convert_network(&config)?;

    if let Some(bounds) = &config.optimizer {
        let optimized = NetworkOptimizer::from_config(bounds)?.optimize(network)?;
        tracing::info!(
            "Optimizer finished after {} iterations, {} links skip-listed",
            optimized.iterations,
            optimized.skipped.len()
        );
        network = optimized.network;
    }

    match config.output_network_path() {
        Some(path) => write_network(&network, Some(config.output_crs.as_str()), path)?,
        None => tracing::warn!("No network output file configured"),
    }
    if let Some(path) = config.output_geojson_path() {
        write_geojson(&network, path)?;
    }
    if config.output_shp_path().is_some() {
        tracing::warn!("Shapefile export is not built in, skipping it");
    }
    Ok(())
}
