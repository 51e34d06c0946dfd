//! Arena-backed raw graph with node to link incidence

use std::collections::BTreeSet;

use hashbrown::HashMap;

use super::{RawLink, RawNode, RawNodeId};
use crate::Error;

/// Raw multigraph assembled by a reader.
///
/// Nodes are deduplicated by source id (first insertion wins). Links keep
/// insertion order, and every node records the links whose endpoints or
/// interior nodes reference it.
#[derive(Debug, Clone, Default)]
pub struct RawNetwork {
    nodes: Vec<RawNode>,
    node_lookup: HashMap<String, RawNodeId>,
    links: Vec<RawLink>,
    link_lookup: HashMap<String, usize>,
    related: HashMap<RawNodeId, BTreeSet<String>>,
}

impl RawNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, returning the handle of an existing node with the same id
    /// if there is one.
    pub fn add_node(&mut self, node: RawNode) -> RawNodeId {
        if let Some(&id) = self.node_lookup.get(&node.id) {
            return id;
        }
        let id = RawNodeId(self.nodes.len());
        self.node_lookup.insert(node.id.clone(), id);
        self.nodes.push(node);
        id
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] when the link references a node that
    /// is not part of this network
    pub fn add_link(&mut self, link: RawLink) -> Result<(), Error> {
        if let Some(missing) = link
            .node_sequence()
            .into_iter()
            .find(|node| node.0 >= self.nodes.len())
        {
            return Err(Error::InvalidData(format!(
                "Link {} references unknown node handle {}",
                link.id, missing.0
            )));
        }

        for node in link.node_sequence() {
            self.related
                .entry(node)
                .or_default()
                .insert(link.id.clone());
        }

        // A repeated id replaces the earlier link in place
        if let Some(&position) = self.link_lookup.get(&link.id) {
            let previous = std::mem::replace(&mut self.links[position], link);
            let current = self.links[position].node_sequence();
            for node in previous.node_sequence() {
                if !current.contains(&node)
                    && let Some(ids) = self.related.get_mut(&node)
                {
                    ids.remove(&previous.id);
                }
            }
        } else {
            self.link_lookup.insert(link.id.clone(), self.links.len());
            self.links.push(link);
        }
        Ok(())
    }

    pub fn node(&self, id: RawNodeId) -> Option<&RawNode> {
        self.nodes.get(id.0)
    }

    pub fn node_id(&self, id: &str) -> Option<RawNodeId> {
        self.node_lookup.get(id).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (RawNodeId, &RawNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (RawNodeId(idx), node))
    }

    pub fn link(&self, id: &str) -> Option<&RawLink> {
        self.link_lookup.get(id).map(|&idx| &self.links[idx])
    }

    pub fn links(&self) -> &[RawLink] {
        &self.links
    }

    /// Mutable access for classification. Endpoints must not be changed
    /// through this slice, the incidence map would go stale.
    pub fn links_mut(&mut self) -> &mut [RawLink] {
        &mut self.links
    }

    /// Links touching `node` at an endpoint or an interior position,
    /// ordered by link id
    pub fn related_links(&self, node: RawNodeId) -> impl Iterator<Item = &RawLink> {
        self.related
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|id| self.link(id))
    }

    /// Number of distinct links referencing each node, endpoints included.
    /// The converter takes these counts after classification has dropped
    /// unused links, so only kept links make a junction.
    pub fn reference_counts(&self) -> HashMap<RawNodeId, usize> {
        self.related
            .iter()
            .map(|(&node, ids)| (node, ids.len()))
            .collect()
    }

    /// Removes every link, leaving the node arena untouched
    pub fn take_links(&mut self) -> Vec<RawLink> {
        self.link_lookup.clear();
        self.related.clear();
        std::mem::take(&mut self.links)
    }

    /// Replaces the link set, rebuilding the incidence map
    ///
    /// # Errors
    ///
    /// Propagates [`RawNetwork::add_link`] failures
    pub fn replace_links(&mut self, links: Vec<RawLink>) -> Result<(), Error> {
        self.take_links();
        for link in links {
            self.add_link(link)?;
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (RawNetwork, RawNodeId, RawNodeId, RawNodeId) {
        let mut network = RawNetwork::new();
        let a = network.add_node(RawNode::new("a", 0.0, 0.0));
        let b = network.add_node(RawNode::new("b", 1.0, 0.0));
        let c = network.add_node(RawNode::new("c", 2.0, 0.0));
        (network, a, b, c)
    }

    #[test]
    fn test_first_node_wins() {
        let (mut network, a, _, _) = sample();
        let again = network.add_node(RawNode::new("a", 9.0, 9.0));
        assert_eq!(again, a);
        assert_eq!(network.node_count(), 3);
        assert_eq!(network.node(a).unwrap().geometry.x(), 0.0);
    }

    #[test]
    fn test_incidence_covers_interior_nodes() {
        let (mut network, a, b, c) = sample();
        let mut link = RawLink::new("l1", a, c);
        link.push_composed(b);
        network.add_link(link).unwrap();
        network.add_link(RawLink::new("l2", b, c)).unwrap();

        let related: Vec<_> = network.related_links(b).map(|l| l.id.as_str()).collect();
        assert_eq!(related, vec!["l1", "l2"]);

        let counts = network.reference_counts();
        assert_eq!(counts[&a], 1);
        assert_eq!(counts[&b], 2);
        assert_eq!(counts[&c], 2);
    }

    #[test]
    fn test_repeated_link_id_replaces() {
        let (mut network, a, b, c) = sample();
        network.add_link(RawLink::new("l1", a, b)).unwrap();
        network.add_link(RawLink::new("l1", b, c)).unwrap();

        assert_eq!(network.link_count(), 1);
        assert_eq!(network.related_links(a).count(), 0);
        assert_eq!(network.link("l1").unwrap().to, c);
    }

    #[test]
    fn test_unknown_node_rejected() {
        let (mut network, a, _, _) = sample();
        let result = network.add_link(RawLink::new("bad", a, RawNodeId(42)));
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
