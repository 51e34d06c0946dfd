//! Serial insertion of resolved segments into the canonical network

use std::collections::BTreeMap;

use super::ResolvedAttributes;
use crate::model::{Link, Network, Node, RawLink, RawNetwork, RawNodeId};
use crate::{Error, MISSING_ATTRIBUTE};

fn canonical_node(raw: &RawNetwork, id: RawNodeId, link_id: &str) -> Result<Node, Error> {
    let node = raw.node(id).ok_or_else(|| {
        Error::InvalidData(format!(
            "Segment {link_id} references node handle {} outside the raw network",
            id.index()
        ))
    })?;
    Ok(Node {
        id: node.id.clone(),
        geometry: node.geometry,
        elevation: node.elevation,
    })
}

/// Builds the canonical network from resolved segments.
///
/// Nodes are deduplicated by id with the first occurrence kept. A segment
/// whose id is already present is skipped with a warning. Every reserved
/// field becomes a link attribute, `NA` when the tag is missing.
///
/// # Errors
///
/// Returns an error if a segment references a node missing from `raw`
pub fn materialize(
    raw: &RawNetwork,
    segments: Vec<(RawLink, ResolvedAttributes)>,
    reserved: &[String],
) -> Result<Network, Error> {
    let mut network = Network::new();

    for (segment, attrs) in segments {
        if network.link_index(&segment.id).is_some() {
            log::warn!("Duplicate link id {}, keeping the first one", segment.id);
            continue;
        }
        if segment.modes.is_empty() {
            log::debug!("Skipping link {} without modes", segment.id);
            continue;
        }

        let from = network.add_node(canonical_node(raw, segment.from, &segment.id)?);
        let to = network.add_node(canonical_node(raw, segment.to, &segment.id)?);

        let attributes: BTreeMap<String, String> = reserved
            .iter()
            .map(|field| {
                let value = segment
                    .tag(field)
                    .map_or_else(|| MISSING_ATTRIBUTE.to_string(), str::to_string);
                (field.clone(), value)
            })
            .collect();

        network.add_link(
            from,
            to,
            Link {
                id: segment.id,
                length: attrs.length,
                free_speed: attrs.free_speed,
                capacity: attrs.capacity,
                lanes: attrs.lanes,
                lane_width: attrs.lane_width,
                modes: segment.modes,
                attributes,
            },
        )?;
    }

    Ok(network)
}
