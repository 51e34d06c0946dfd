use std::path::Path;

use geo::Point;
use hashbrown::HashMap;
use log::{debug, info, warn};
use osmpbf::{Element, ElementReader, RelMemberType};

use crate::Error;
use crate::classification::{RuleSet, matches};
use crate::loading::config::{ConverterConfig, ModeConfig};
use crate::loading::reader::NetworkReader;
use crate::model::{Mode, RawLink, RawNetwork, RawNode, Tags};

/// Reads an OSM pbf extract into a raw network.
///
/// Every way becomes one raw link from its first to its last node, with
/// the remaining distinct nodes as composed nodes. Route relations matching
/// the public transport rules grant PT to their member ways and copy the
/// reserved tags onto them.
#[derive(Debug, Clone, Default)]
pub struct OsmReader {
    pt_rules: RuleSet,
    reserved: Vec<String>,
}

impl OsmReader {
    pub fn new(pt_rules: RuleSet, reserved: Vec<String>) -> Self {
        Self { pt_rules, reserved }
    }

    /// PT rules come from the configured `pt` mode, or the stock PT rules
    /// when the mode is not configured
    pub fn from_config(config: &ConverterConfig) -> Self {
        let pt_rules = config
            .mode(Mode::Pt)
            .map_or_else(|| ModeConfig::template(Mode::Pt).rules, |mode| mode.rules.clone());
        Self::new(pt_rules, config.link_attributes.reserved.clone())
    }

    pub(crate) fn build(&self, elements: OsmElements) -> Result<RawNetwork, Error> {
        let OsmElements {
            nodes,
            ways,
            relations,
        } = elements;

        let mut transit_tags: HashMap<i64, Tags> = HashMap::new();
        if !self.pt_rules.is_empty() {
            for relation in relations.iter().filter(|r| matches(&r.tags, &self.pt_rules)) {
                let reserved: Tags = relation
                    .tags
                    .iter()
                    .filter(|(key, _)| self.reserved.contains(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                for way_id in &relation.ways {
                    transit_tags
                        .entry(*way_id)
                        .or_default()
                        .extend(reserved.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        let mut network = RawNetwork::new();
        let mut skipped = 0usize;
        for way in ways {
            let (Some(&first), Some(&last)) = (way.refs.first(), way.refs.last()) else {
                continue;
            };
            if way.refs.len() < 2 {
                debug!("Way {} has a single node", way.id);
                skipped += 1;
                continue;
            }
            if let Some(missing) = way.refs.iter().find(|id| !nodes.contains_key(*id)) {
                warn!("Way {} references unknown node {missing}, skipping it", way.id);
                skipped += 1;
                continue;
            }

            let mut handles = Vec::with_capacity(way.refs.len());
            for id in &way.refs {
                let point = nodes[id];
                handles.push(network.add_node(RawNode::new(id.to_string(), point.x(), point.y())));
            }

            let from = handles[0];
            let to = handles[handles.len() - 1];
            let mut link = RawLink::new(way.id.to_string(), from, to);
            for (id, &handle) in way.refs.iter().zip(&handles) {
                if *id != first && *id != last {
                    link.push_composed(handle);
                }
            }
            link.tags = way.tags;
            if let Some(extra) = transit_tags.remove(&way.id) {
                link.modes.insert(Mode::Pt);
                link.tags.extend(extra);
            }
            network.add_link(link)?;
        }

        if skipped > 0 {
            warn!("Skipped {skipped} ways that could not be turned into links");
        }
        info!(
            "Built raw network with {} nodes and {} links",
            network.node_count(),
            network.link_count()
        );
        Ok(network)
    }
}

impl NetworkReader for OsmReader {
    fn read(&self, path: &Path) -> Result<RawNetwork, Error> {
        info!("Reading OSM pbf file: {}", path.display());
        let elements = OsmElements::from_path(path)?;
        info!(
            "Read {} nodes, {} ways and {} relations",
            elements.nodes.len(),
            elements.ways.len(),
            elements.relations.len()
        );
        self.build(elements)
    }
}

pub(crate) struct OsmWay {
    pub id: i64,
    pub refs: Vec<i64>,
    pub tags: Tags,
}

pub(crate) struct OsmRelation {
    /// Ids of member ways
    pub ways: Vec<i64>,
    pub tags: Tags,
}

/// Elements collected in one pass over a pbf file
#[derive(Default)]
pub(crate) struct OsmElements {
    pub nodes: HashMap<i64, Point<f64>>,
    pub ways: Vec<OsmWay>,
    pub relations: Vec<OsmRelation>,
}

impl OsmElements {
    fn from_path(path: &Path) -> Result<Self, Error> {
        let reader = ElementReader::from_path(path)?;
        let mut elements = OsmElements::default();

        reader.for_each(|element| match element {
            Element::Node(node) => {
                elements
                    .nodes
                    .insert(node.id(), Point::new(node.lon(), node.lat()));
            }
            Element::DenseNode(node) => {
                elements
                    .nodes
                    .insert(node.id(), Point::new(node.lon(), node.lat()));
            }
            Element::Way(way) => elements.ways.push(OsmWay {
                id: way.id(),
                refs: way.refs().collect(),
                tags: way
                    .tags()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }),
            Element::Relation(relation) => elements.relations.push(OsmRelation {
                ways: relation
                    .members()
                    .filter(|m| m.member_type == RelMemberType::Way)
                    .map(|m| m.member_id)
                    .collect(),
                tags: relation
                    .tags()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }),
        })?;

        Ok(elements)
    }
}
