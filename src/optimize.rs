use std::path::Path;

use multinet_core::export::{read_network, write_network};
use multinet_core::{Error, NetworkOptimizer};

pub fn run(input: &Path, output: &Path, min_length: f64, max_length: f64) -> Result<(), Error> {
    let optimizer = NetworkOptimizer::new(min_length, max_length)?;
    let network = read_network(input)?;
    let optimized = optimizer.optimize(network)?;
    for id in &optimized.skipped {
        tracing::debug!("Link {id} stays below the minimum length");
    }
    write_network(&optimized.network, None, output)
}
