use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::model::{Link, Network, Node, parse_mode_list};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: String,
    pub from: String,
    pub to: String,
    pub length: f64,
    pub freespeed: f64,
    pub capacity: f64,
    pub lanes: f64,
    pub lane_width: f64,
    /// Comma separated allowed modes
    pub modes: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Serializable form of a canonical network, nodes and links sorted by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
}

impl NetworkDocument {
    pub fn from_network(network: &Network, crs: Option<&str>) -> Self {
        let mut nodes: Vec<NodeRecord> = network
            .nodes()
            .map(|(_, node)| NodeRecord {
                id: node.id.clone(),
                x: node.geometry.x(),
                y: node.geometry.y(),
                z: node.elevation,
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut links: Vec<LinkRecord> = network
            .links()
            .filter_map(|(idx, link)| {
                let (from, to) = network.endpoint_ids(idx)?;
                Some(LinkRecord {
                    id: link.id.clone(),
                    from: from.to_string(),
                    to: to.to_string(),
                    length: link.length,
                    freespeed: link.free_speed,
                    capacity: link.capacity,
                    lanes: link.lanes,
                    lane_width: link.lane_width,
                    modes: link.modes_string(),
                    attributes: link.attributes.clone(),
                })
            })
            .collect();
        links.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            crs: crs.map(str::to_string),
            nodes,
            links,
        }
    }

    /// Rebuilds the canonical network
    ///
    /// # Errors
    ///
    /// Returns an error for unknown modes, unknown endpoint ids or
    /// duplicate link ids
    pub fn into_network(self) -> Result<Network, Error> {
        let mut network = Network::new();
        for node in self.nodes {
            network.add_node(Node {
                id: node.id,
                geometry: geo::Point::new(node.x, node.y),
                elevation: node.z,
            });
        }
        for record in self.links {
            let modes = parse_mode_list(&record.modes)?.into_iter().collect();
            network.add_link_between(
                &record.from,
                &record.to,
                Link {
                    id: record.id,
                    length: record.length,
                    free_speed: record.freespeed,
                    capacity: record.capacity,
                    lanes: record.lanes,
                    lane_width: record.lane_width,
                    modes,
                    attributes: record.attributes,
                },
            )?;
        }
        Ok(network)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn read(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::open(path.as_ref()).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open file '{}': {}", path.as_ref().display(), e),
            )
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

/// Writes `network` as a JSON network document
///
/// # Errors
///
/// Returns an error if the file cannot be written
pub fn write_network(network: &Network, crs: Option<&str>, path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    log::info!(
        "Writing network with {} nodes and {} links to {}",
        network.node_count(),
        network.link_count(),
        path.display()
    );
    NetworkDocument::from_network(network, crs).write(path)
}

/// Reads a JSON network document back into a canonical network
///
/// # Errors
///
/// Returns an error if the file cannot be read or describes an invalid
/// network
pub fn read_network(path: impl AsRef<Path>) -> Result<Network, Error> {
    NetworkDocument::read(path)?.into_network()
}
