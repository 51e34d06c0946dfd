//! Raw graph components - nodes and tagged polylines

use geo::Point;
use hashbrown::HashMap;

use crate::Error;
use crate::model::ModeSet;

/// Source attributes of a raw link
pub type Tags = HashMap<String, String>;

/// Arena handle of a node inside a [`RawNetwork`](super::RawNetwork)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawNodeId(pub(crate) usize);

impl RawNodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Raw graph node
#[derive(Debug, Clone)]
pub struct RawNode {
    /// Source identifier of the node
    pub id: String,
    /// Node coordinates
    pub geometry: Point<f64>,
    /// Optional third coordinate
    pub elevation: Option<f64>,
}

impl RawNode {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            geometry: Point::new(x, y),
            elevation: None,
        }
    }

    pub fn with_elevation(id: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            elevation: Some(z),
            ..Self::new(id, x, y)
        }
    }

    /// Builds a node from a `[x, y]` or `[x, y, z]` position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] when the position has fewer than two
    /// or more than three coordinates
    pub fn from_position(id: impl Into<String>, position: &[f64]) -> Result<Self, Error> {
        match *position {
            [x, y] => Ok(Self::new(id, x, y)),
            [x, y, z] => Ok(Self::with_elevation(id, x, y, z)),
            _ => Err(Error::InvalidData(format!(
                "Position with {} coordinates is not supported",
                position.len()
            ))),
        }
    }
}

/// Raw polyline between two nodes, optionally passing through interior
/// (composed) nodes.
#[derive(Debug, Clone)]
pub struct RawLink {
    pub id: String,
    pub from: RawNodeId,
    pub to: RawNodeId,
    /// Interior nodes in travel order, endpoints excluded
    pub composed: Vec<RawNodeId>,
    /// Modes assigned by the classifier or preassigned by the reader
    pub modes: ModeSet,
    pub tags: Tags,
}

impl RawLink {
    pub fn new(id: impl Into<String>, from: RawNodeId, to: RawNodeId) -> Self {
        Self {
            id: id.into(),
            from,
            to,
            composed: Vec::new(),
            modes: ModeSet::new(),
            tags: Tags::new(),
        }
    }

    #[must_use]
    pub fn with_tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Appends an interior node. Repeated nodes keep their first position.
    pub fn push_composed(&mut self, node: RawNodeId) {
        if !self.composed.contains(&node) {
            self.composed.push(node);
        }
    }

    /// Full node sequence: `from`, interior nodes, `to`
    pub fn node_sequence(&self) -> Vec<RawNodeId> {
        let mut sequence = Vec::with_capacity(self.composed.len() + 2);
        sequence.push(self.from);
        sequence.extend_from_slice(&self.composed);
        sequence.push(self.to);
        sequence
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}
