use hashbrown::HashMap;
use log::{debug, info, warn};
use rayon::prelude::*;

use super::config::{ConverterConfig, FileType};
use super::{GeoJsonReader, NetworkReader, OsmReader};
use crate::algo::connectivity::NetworkCleaner;
use crate::algo::transform::{transform_for, transform_network};
use crate::classification::ModeClassifier;
use crate::conversion::{
    AttributeResolver, ResolvedAttributes, materialize, reverse_for_oneway, split_link,
};
use crate::model::{Mode, Network, RawLink, RawNetwork, RawNodeId};
use crate::Error;

/// Reads the configured input with the built-in reader for its file type
/// and converts it
///
/// # Errors
///
/// Returns an error if the input is missing or unreadable, if the file type
/// has no built-in reader (shapefiles) or if the conversion fails
pub fn convert_network(config: &ConverterConfig) -> Result<Network, Error> {
    config.validate()?;
    validate_input(config)?;

    match config.file_type {
        FileType::Osm => convert_with_reader(&OsmReader::from_config(config), config),
        FileType::GeoJson => convert_with_reader(&GeoJsonReader::from_config(config), config),
        FileType::Shp => Err(Error::UnsupportedFileType(
            "shp input needs a NetworkReader supplied through convert_with_reader".to_string(),
        )),
    }
}

/// Converts the network produced by `reader` from the configured input file
///
/// # Errors
///
/// Returns an error if reading or converting fails
pub fn convert_with_reader(
    reader: &dyn NetworkReader,
    config: &ConverterConfig,
) -> Result<Network, Error> {
    info!("Reading input network: {}", config.input_file.display());
    let raw = reader.read(&config.input_file)?;
    convert_raw_network(raw, config)
}

/// Runs the conversion pipeline on an already loaded raw network:
/// classification, oneway expansion, splitting, attribute resolution,
/// materialization, connectivity cleaning and the CRS transform.
///
/// # Errors
///
/// Returns an error for invalid configuration, non-numeric attribute tags,
/// unsupported connectivity strategies or CRS pairs
pub fn convert_raw_network(
    mut raw: RawNetwork,
    config: &ConverterConfig,
) -> Result<Network, Error> {
    config.validate()?;
    info!(
        "Converting raw network with {} nodes and {} links",
        raw.node_count(),
        raw.link_count()
    );

    let classifier = ModeClassifier::from_config(config);
    raw.links_mut()
        .par_iter_mut()
        .for_each(|link| classifier.classify_link(link));

    let links = retain_classified(raw.take_links(), config.keep_undefined_link);
    // Junctions are counted before reversed links are added
    raw.replace_links(links)?;
    let reference_counts = raw.reference_counts();
    let mut links = raw.take_links();

    if config.oneway {
        links = expand_oneway(links, &classifier);
    }

    let policy = config.split_policy();
    let segments: Vec<RawLink> = links
        .iter()
        .flat_map(|link| split_link(link, policy, &reference_counts))
        .collect();
    drop(links);
    info!("Split into {} segments ({policy:?})", segments.len());

    let resolved = resolve_segments(&raw, segments, config)?;
    let mut network = materialize(&raw, resolved, &config.link_attributes.reserved)?;
    drop(raw);
    info!(
        "Materialized network with {} nodes and {} links",
        network.node_count(),
        network.link_count()
    );

    if config.connectivity.strongly_connected {
        network = enforce_connectivity(network, config)?;
    }

    let transform = transform_for(&config.input_crs, &config.output_crs)?;
    transform_network(&mut network, transform.as_ref());
    network.validate()?;

    info!("Network conversion finished");
    // Reading pbf data and splitting links allocates a lot of short-lived
    // memory that glibc does not hand back to the system on its own.
    //
    // # Safety
    //
    // This call is safe to use on linux with glibc implementation
    // which is checked by the cfg attribute in compile time.
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    unsafe {
        if libc::malloc_trim(0) == 0 {
            log::warn!("Memory trimming failed - continuing anyway");
        } else {
            log::debug!("Successfully trimmed unused heap memory");
        }
    }
    Ok(network)
}

fn validate_input(config: &ConverterConfig) -> Result<(), Error> {
    if !config.input_file.exists() {
        return Err(Error::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file not found: {}", config.input_file.display()),
        )));
    }
    Ok(())
}

/// Drops links without modes, and links only classified as `other` unless
/// undefined links are kept
fn retain_classified(links: Vec<RawLink>, keep_undefined: bool) -> Vec<RawLink> {
    let total = links.len();
    let kept: Vec<RawLink> = links
        .into_iter()
        .filter(|link| {
            if link.modes.is_empty() {
                return false;
            }
            keep_undefined || link.modes.iter().any(|&mode| mode != Mode::Other)
        })
        .collect();

    if kept.len() < total {
        info!(
            "Dropped {} of {total} links without a usable mode",
            total - kept.len()
        );
    }
    kept
}

fn expand_oneway(links: Vec<RawLink>, classifier: &ModeClassifier) -> Vec<RawLink> {
    let mut expanded = Vec::with_capacity(links.len() * 2);
    let mut reversed = 0usize;
    for link in links {
        let reverse = reverse_for_oneway(&link, classifier);
        expanded.push(link);
        if let Some(reverse) = reverse {
            expanded.push(reverse);
            reversed += 1;
        }
    }
    info!("Added {reversed} reverse-direction links");
    expanded
}

fn resolve_segments(
    raw: &RawNetwork,
    segments: Vec<RawLink>,
    config: &ConverterConfig,
) -> Result<Vec<(RawLink, ResolvedAttributes)>, Error> {
    let resolver = AttributeResolver::new(config);
    let endpoint = |id: RawNodeId, link: &RawLink| {
        raw.node(id).ok_or_else(|| {
            Error::InvalidData(format!("Link {} references a missing node", link.id))
        })
    };

    segments
        .into_par_iter()
        .map(|segment| {
            let from = endpoint(segment.from, &segment)?;
            let to = endpoint(segment.to, &segment)?;
            let attributes = resolver.resolve(&segment, from, to)?;
            Ok((segment, attributes))
        })
        .collect()
}

fn enforce_connectivity(network: Network, config: &ConverterConfig) -> Result<Network, Error> {
    let connectivity = &config.connectivity;
    let mut cleaner = NetworkCleaner::new(network);
    let report = connectivity.method.apply(
        &mut cleaner,
        &connectivity.modes,
        &connectivity.retain_modes,
    )?;
    if report.removed_links > 0 || report.stripped_links > 0 {
        warn!(
            "Connectivity ({}) removed {} links and {} nodes, stripped modes from {} links",
            connectivity.method,
            report.removed_links,
            report.removed_nodes,
            report.stripped_links
        );
    } else {
        debug!("Network already strongly connected for every cleaned mode");
    }
    Ok(cleaner.into_network())
}
