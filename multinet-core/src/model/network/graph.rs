//! Directed multigraph storing the canonical network

use hashbrown::{HashMap, HashSet};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use super::{Link, Node};
use crate::model::{Mode, ModeSet};
use crate::{Error, MIN_LINK_LENGTH};

pub type NetworkGraph = StableDiGraph<Node, Link>;

/// Canonical network: id-addressable nodes and directed links.
///
/// Indices stay valid across removals, so optimizer and cleaner passes can
/// hold on to them while editing the graph.
#[derive(Debug, Clone, Default)]
pub struct Network {
    graph: NetworkGraph,
    node_lookup: HashMap<String, NodeIndex>,
    link_lookup: HashMap<String, EdgeIndex>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    /// Adds a node or returns the index of the node already using its id
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        if let Some(&idx) = self.node_lookup.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_lookup.insert(id, idx);
        idx
    }

    /// Adds a directed link. Lengths below [`MIN_LINK_LENGTH`] are floored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] when an endpoint is missing, the link
    /// id is already used or the link has no modes
    pub fn add_link(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        mut link: Link,
    ) -> Result<EdgeIndex, Error> {
        if !self.graph.contains_node(from) || !self.graph.contains_node(to) {
            return Err(Error::InvalidData(format!(
                "Link {} has an endpoint outside the network",
                link.id
            )));
        }
        if self.link_lookup.contains_key(&link.id) {
            return Err(Error::InvalidData(format!(
                "Link id {} is already used",
                link.id
            )));
        }
        if link.modes.is_empty() {
            return Err(Error::InvalidData(format!(
                "Link {} has no allowed modes",
                link.id
            )));
        }
        if !link.length.is_finite() || link.length < MIN_LINK_LENGTH {
            link.length = MIN_LINK_LENGTH;
        }

        let id = link.id.clone();
        let idx = self.graph.add_edge(from, to, link);
        self.link_lookup.insert(id, idx);
        Ok(idx)
    }

    /// Same as [`Network::add_link`] with endpoints addressed by node id
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] when either node id is unknown
    pub fn add_link_between(&mut self, from: &str, to: &str, link: Link) -> Result<EdgeIndex, Error> {
        let (Some(from_idx), Some(to_idx)) = (self.node_index(from), self.node_index(to)) else {
            return Err(Error::InvalidData(format!(
                "Link {} connects unknown nodes {from} -> {to}",
                link.id
            )));
        };
        self.add_link(from_idx, to_idx, link)
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_lookup.get(id).copied()
    }

    pub fn link_index(&self, id: &str) -> Option<EdgeIndex> {
        self.link_lookup.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index(id).and_then(|idx| self.graph.node_weight(idx))
    }

    pub fn node_at(&self, idx: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(idx)
    }

    pub fn node_at_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        self.graph.node_weight_mut(idx)
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.link_index(id).and_then(|idx| self.graph.edge_weight(idx))
    }

    pub fn link_at(&self, idx: EdgeIndex) -> Option<&Link> {
        self.graph.edge_weight(idx)
    }

    /// Changing `id` through this handle desynchronizes the id lookup
    pub fn link_at_mut(&mut self, idx: EdgeIndex) -> Option<&mut Link> {
        self.graph.edge_weight_mut(idx)
    }

    pub fn endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    /// Endpoint node ids of a link
    pub fn endpoint_ids(&self, idx: EdgeIndex) -> Option<(&str, &str)> {
        let (from, to) = self.endpoints(idx)?;
        Some((
            self.graph.node_weight(from)?.id.as_str(),
            self.graph.node_weight(to)?.id.as_str(),
        ))
    }

    pub fn remove_link(&mut self, id: &str) -> Option<Link> {
        let idx = self.link_lookup.get(id).copied()?;
        self.remove_link_at(idx)
    }

    pub fn remove_link_at(&mut self, idx: EdgeIndex) -> Option<Link> {
        let link = self.graph.remove_edge(idx)?;
        self.link_lookup.remove(&link.id);
        Some(link)
    }

    /// Removes a node together with every link touching it
    pub fn remove_node_at(&mut self, idx: NodeIndex) -> Option<Node> {
        let incident: Vec<EdgeIndex> = self
            .in_links(idx)
            .into_iter()
            .chain(self.out_links(idx))
            .collect();
        for edge in incident {
            self.remove_link_at(edge);
        }
        let node = self.graph.remove_node(idx)?;
        self.node_lookup.remove(&node.id);
        Some(node)
    }

    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let idx = self.node_index(id)?;
        self.remove_node_at(idx)
    }

    /// Drops nodes without any incident link, returning how many were removed
    pub fn remove_orphan_nodes(&mut self) -> usize {
        let orphans: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| self.degree(idx) == 0)
            .collect();
        let count = orphans.len();
        for idx in orphans {
            self.remove_node_at(idx);
        }
        count
    }

    pub fn in_links(&self, idx: NodeIndex) -> Vec<EdgeIndex> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| edge.id())
            .collect()
    }

    pub fn out_links(&self, idx: NodeIndex) -> Vec<EdgeIndex> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| edge.id())
            .collect()
    }

    /// Number of incident links regardless of direction
    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
            + self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    /// Distinct adjacent nodes ignoring direction, excluding `idx` itself
    pub fn neighbors(&self, idx: NodeIndex) -> HashSet<NodeIndex> {
        self.graph
            .neighbors_undirected(idx)
            .filter(|&other| other != idx)
            .collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx).map(|node| (idx, node)))
    }

    pub fn links(&self) -> impl Iterator<Item = (EdgeIndex, &Link)> {
        self.graph
            .edge_indices()
            .filter_map(|idx| self.graph.edge_weight(idx).map(|link| (idx, link)))
    }

    pub fn node_indices(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().collect()
    }

    pub fn link_indices(&self) -> Vec<EdgeIndex> {
        self.graph.edge_indices().collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0 && self.graph.edge_count() == 0
    }

    /// Union of modes over all links
    pub fn modes(&self) -> ModeSet {
        self.links()
            .flat_map(|(_, link)| link.modes.iter().copied())
            .collect()
    }

    pub fn count_links_with_mode(&self, mode: Mode) -> usize {
        self.links().filter(|(_, link)| link.allows(mode)).count()
    }

    /// Checks the structural invariants of the network
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] describing the first violation found
    pub fn validate(&self) -> Result<(), Error> {
        for (idx, link) in self.links() {
            if link.modes.is_empty() {
                return Err(Error::InvalidData(format!(
                    "Link {} has no allowed modes",
                    link.id
                )));
            }
            if link.length < MIN_LINK_LENGTH {
                return Err(Error::InvalidData(format!(
                    "Link {} is shorter than {MIN_LINK_LENGTH} m",
                    link.id
                )));
            }
            if self.endpoints(idx).is_none() {
                return Err(Error::InvalidData(format!(
                    "Link {} has dangling endpoints",
                    link.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn link(id: &str, modes: &[Mode], length: f64) -> Link {
        Link {
            id: id.to_string(),
            length,
            free_speed: 10.0,
            capacity: 1000.0,
            lanes: 1.0,
            lane_width: 3.5,
            modes: modes.iter().copied().collect(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_add_and_remove() {
        let mut network = Network::new();
        let a = network.add_node(Node::new("a", 0.0, 0.0));
        let b = network.add_node(Node::new("b", 1.0, 0.0));
        assert_eq!(network.add_node(Node::new("a", 5.0, 5.0)), a);

        network.add_link(a, b, link("ab", &[Mode::Car], 10.0)).unwrap();
        network.add_link(b, a, link("ba", &[Mode::Bike], 10.0)).unwrap();
        assert_eq!(network.link_count(), 2);
        assert_eq!(network.degree(a), 2);
        assert_eq!(network.neighbors(a).len(), 1);

        network.remove_node("b").unwrap();
        assert_eq!(network.link_count(), 0);
        assert!(network.link("ab").is_none());
        assert_eq!(network.remove_orphan_nodes(), 1);
        assert!(network.is_empty());
    }

    #[test]
    fn test_duplicate_link_rejected() {
        let mut network = Network::new();
        let a = network.add_node(Node::new("a", 0.0, 0.0));
        let b = network.add_node(Node::new("b", 1.0, 0.0));
        network.add_link(a, b, link("ab", &[Mode::Car], 10.0)).unwrap();
        let result = network.add_link(b, a, link("ab", &[Mode::Car], 10.0));
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_length_floor_and_modes_required() {
        let mut network = Network::new();
        let a = network.add_node(Node::new("a", 0.0, 0.0));
        let b = network.add_node(Node::new("b", 0.0, 0.0));
        let idx = network.add_link(a, b, link("ab", &[Mode::Walk], 0.2)).unwrap();
        assert_eq!(network.link_at(idx).unwrap().length, MIN_LINK_LENGTH);
        assert!(network.add_link(a, b, link("empty", &[], 5.0)).is_err());
        assert!(network.validate().is_ok());
    }
}
